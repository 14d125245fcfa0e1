// Recommendation request building and response checks.
//
// The upstream service owns scoring and ranking. This module only shapes the
// request it receives and makes sure the ranking it sends back is coherent.

use crate::{
    error::{IntegrityError, ValidationError},
    models::{Location, QueryTarget, Recommendation, RecommendationQuery, SearchForm, SearchMode},
};

/// Normalizes the search form into the request shape selected by `form.mode`.
///
/// Only the identifier that matches the mode is kept, weights are forwarded as
/// given, and empty filter sets are dropped at serialization time.
pub fn build_request(form: &SearchForm) -> Result<RecommendationQuery, ValidationError> {
    let target = match form.mode {
        SearchMode::ById => {
            QueryTarget::CarId(required_identifier(form.car_id.as_deref(), form.mode, "car_id")?)
        }
        SearchMode::ByText => {
            QueryTarget::Text(required_identifier(form.query.as_deref(), form.mode, "query")?)
        }
    };

    let top_n = positive_top_n(form.top_n)?;
    let user_location = user_location(form.user_latitude, form.user_longitude)?;

    let query = RecommendationQuery {
        target,
        top_n,
        similarity_weight: form.similarity_weight,
        distance_weight: form.distance_weight,
        user_location,
        filters: form.filters.clone(),
    };
    tracing::debug!(
        mode = %query.mode(),
        top_n,
        has_location = user_location.is_some(),
        "Built recommendation request"
    );
    Ok(query)
}

fn required_identifier(
    value: Option<&str>,
    mode: SearchMode,
    field: &'static str,
) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::MissingIdentifier { mode, field }),
    }
}

fn positive_top_n(top_n: i64) -> Result<u32, ValidationError> {
    if top_n <= 0 {
        return Err(ValidationError::NonPositiveTopN(top_n));
    }
    Ok(u32::try_from(top_n).unwrap_or(u32::MAX))
}

fn user_location(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Option<Location>, ValidationError> {
    match (latitude, longitude) {
        (None, None) => Ok(None),
        (Some(latitude), Some(longitude)) => {
            if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
                return Err(ValidationError::LocationOutOfRange { latitude, longitude });
            }
            Ok(Some(Location { latitude, longitude }))
        }
        _ => Err(ValidationError::PartialLocation),
    }
}

/// Returns the recommendations in the order received, after checking that
/// ranks never go down. Nothing is re-sorted.
pub fn rank_for_display(
    recommendations: Vec<Recommendation>,
) -> Result<Vec<Recommendation>, IntegrityError> {
    for (index, pair) in recommendations.windows(2).enumerate() {
        let (previous, current) = (pair[0].rank, pair[1].rank);
        if current < previous {
            return Err(IntegrityError::RankOutOfOrder { index: index + 1, previous, current });
        }
    }
    Ok(recommendations)
}
