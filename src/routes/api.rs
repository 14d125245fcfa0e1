// Handlers for the gateway API

use axum::{
    extract::{Json as JsonExtract, Path, Query, State},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};

use crate::{
    api_client::ApiClient,
    encoder,
    error::AppError,
    models::{CarListQuery, PredictionFeatureVector, SearchForm, VehicleInput},
    recommendations,
    routes::ForwardedToken,
};

// --- Response Wrappers ---

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PricePredictionResponse {
    pub predicted_price: f64,
    pub features: PredictionFeatureVector,
}

// --- API Handlers ---

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
    })
}

// Encodes the form without calling upstream, handy for checking what the model will see
pub async fn encode_features(JsonExtract(input): JsonExtract<VehicleInput>) -> impl IntoResponse {
    tracing::info!("API call: encode_features for model: {}", input.model_name);
    Json(encoder::encode(&input, encoder::current_model_year()))
}

pub async fn predict_price(
    State(api): State<ApiClient>,
    token: ForwardedToken,
    JsonExtract(input): JsonExtract<VehicleInput>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!(
        "API call: predict_price for model: {}, year: {:?}",
        input.model_name,
        input.year
    );

    let features = encoder::encode(&input, encoder::current_model_year());
    tracing::debug!(row = ?features.to_row(), "Prediction feature row");

    let output = token.client(&api).predict_price(&features).await?;
    tracing::info!("Predicted price {:.2} for model: {}", output.price, input.model_name);

    Ok(Json(PricePredictionResponse {
        predicted_price: output.price,
        features,
    }))
}

pub async fn list_predictions(
    State(api): State<ApiClient>,
    token: ForwardedToken,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("API call: list_predictions");
    let history = token.client(&api).list_predictions().await?;
    Ok(Json(history))
}

pub async fn recommend(
    State(api): State<ApiClient>,
    token: ForwardedToken,
    JsonExtract(form): JsonExtract<SearchForm>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("API call: recommend, mode: {}, top_n: {}", form.mode, form.top_n);

    // Validation failures stop here and never reach upstream
    let query = recommendations::build_request(&form)?;

    let mut response = token.client(&api).recommend(&query).await?;
    response.recommendations = recommendations::rank_for_display(response.recommendations)?;

    tracing::info!(
        "Returning {} recommendations ({})",
        response.recommendations.len(),
        query.mode()
    );
    Ok(Json(response))
}

pub async fn list_cars(
    State(api): State<ApiClient>,
    token: ForwardedToken,
    Query(query): Query<CarListQuery>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("API call: list_cars with params: {:?}", query);
    let cars = token.client(&api).list_cars(&query).await?;
    Ok(Json(cars))
}

pub async fn get_car(
    State(api): State<ApiClient>,
    token: ForwardedToken,
    Path(car_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    tracing::info!("API call: get_car for car_id: {}", car_id);
    let car = token.client(&api).get_car(&car_id).await?;
    Ok(Json(car))
}
