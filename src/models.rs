// Data structures shared by the encoder, the request builder, the upstream
// client and the HTTP handlers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// --- Price prediction ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    Automatic,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Gasoline,
    Diesel,
    Hybrid,
    Electric,
}

// Vehicle attributes as entered on the price prediction form.
// Missing name, year or mileage degrade to defaults in the encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")] // Match JavaScript frontend keys
pub struct VehicleInput {
    #[serde(default, alias = "carModel")]
    pub model_name: String,
    #[serde(default)]
    pub year: Option<i32>, // None or 0 means the reference year
    #[serde(default)]
    pub mileage: u32,
    pub condition: Condition,
    pub engine_displacement: Option<u32>, // cc
    pub horsepower: Option<u32>,
    pub transmission: Option<Transmission>,
    pub fuel_type: Option<FuelType>,
    #[serde(rename = "isVEngine")]
    pub is_v_engine: Option<bool>,
    #[serde(default)]
    pub features: BTreeSet<String>, // Selected feature tags, not part of the model input
}

/// Flat numeric record sent to the price prediction endpoint.
///
/// Field names on the wire are fixed by the trained model and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionFeatureVector {
    #[serde(rename = "Milage_High")]
    pub mileage_high: u8,
    #[serde(rename = "Accident_Impact")]
    pub accident_impact: u8,
    #[serde(rename = "Age_Old")]
    pub age_old: u8,
    #[serde(rename = "Milage_Medium")]
    pub mileage_medium: u8,
    pub clean_title: u8,
    #[serde(rename = "Milage_Very_High")]
    pub mileage_very_high: u8,
    #[serde(rename = "Vehicle_Age")]
    pub vehicle_age: u32,
    pub hp: u32,
    #[serde(rename = "Age_Mid")]
    pub age_mid: u8,
    pub engine_displacement: u32,
    pub brand: u8,
    pub fuel_type: u8,
    #[serde(rename = "Age_Very_Old")]
    pub age_very_old: u8,
    pub is_v_engine: u8,
    #[serde(rename = "Mileage_per_Year")]
    pub mileage_per_year: f64,
    pub transmission: u8,
}

// Column order the prediction model was trained with
pub const FEATURE_COLUMNS: [&str; 16] = [
    "Milage_High",
    "Accident_Impact",
    "Age_Old",
    "Milage_Medium",
    "clean_title",
    "Milage_Very_High",
    "Vehicle_Age",
    "hp",
    "Age_Mid",
    "engine_displacement",
    "brand",
    "fuel_type",
    "Age_Very_Old",
    "is_v_engine",
    "Mileage_per_Year",
    "transmission",
];

impl PredictionFeatureVector {
    /// Values in `FEATURE_COLUMNS` order.
    pub fn to_row(&self) -> [f64; 16] {
        [
            f64::from(self.mileage_high),
            f64::from(self.accident_impact),
            f64::from(self.age_old),
            f64::from(self.mileage_medium),
            f64::from(self.clean_title),
            f64::from(self.mileage_very_high),
            f64::from(self.vehicle_age),
            f64::from(self.hp),
            f64::from(self.age_mid),
            f64::from(self.engine_displacement),
            f64::from(self.brand),
            f64::from(self.fuel_type),
            f64::from(self.age_very_old),
            f64::from(self.is_v_engine),
            self.mileage_per_year,
            f64::from(self.transmission),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionOutput {
    pub price: f64,
}

// --- Recommendations ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchMode {
    ById,
    ByText,
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchMode::ById => f.write_str("by-id"),
            SearchMode::ByText => f.write_str("by-text"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

// Recommendation search form state as posted by the frontend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchForm {
    pub mode: SearchMode,
    pub car_id: Option<String>,
    pub query: Option<String>,
    #[serde(default = "default_top_n")]
    pub top_n: i64,
    #[serde(default = "default_similarity_weight")]
    pub similarity_weight: f64,
    #[serde(default = "default_distance_weight")]
    pub distance_weight: f64,
    pub user_latitude: Option<f64>,
    pub user_longitude: Option<f64>,
    #[serde(flatten)]
    pub filters: RecommendationFilters,
}

fn default_top_n() -> i64 {
    10
}

fn default_similarity_weight() -> f64 {
    0.7
}

fn default_distance_weight() -> f64 {
    0.3
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_year: Option<i32>,
    // Empty sets are left out so the service never filters on an accidental []
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manufacturers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<String>,
}

/// What the recommendation search is anchored on.
///
/// Flattened into [`RecommendationQuery`], so exactly one of `car_id` or
/// `query` appears in the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryTarget {
    #[serde(rename = "car_id")]
    CarId(String),
    #[serde(rename = "query")]
    Text(String),
}

/// Normalized recommendation request, ready to be posted upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationQuery {
    #[serde(flatten)]
    pub target: QueryTarget,
    pub top_n: u32,
    pub similarity_weight: f64,
    pub distance_weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_location: Option<Location>,
    #[serde(flatten)]
    pub filters: RecommendationFilters,
}

impl RecommendationQuery {
    pub fn mode(&self) -> SearchMode {
        match self.target {
            QueryTarget::CarId(_) => SearchMode::ById,
            QueryTarget::Text(_) => SearchMode::ByText,
        }
    }

    // Upstream path for this request shape
    pub fn endpoint(&self) -> &'static str {
        match self.target {
            QueryTarget::CarId(_) => "/v1/recommendations/by-id",
            QueryTarget::Text(_) => "/v1/recommendations/by-text",
        }
    }
}

// Catalog entry as returned by the car API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub car_id: String,
    pub url: Option<String>,
    pub price: f64,
    pub year: i32,
    pub manufacturer: String,
    pub model: String,
    pub condition: Option<String>,
    pub fuel: Option<String>,
    pub odometer: Option<f64>,
    pub transmission: Option<String>,
    #[serde(rename = "type")]
    pub car_type: Option<String>,
    pub paint_color: Option<String>,
    pub state: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub car: Car,
    pub similarity_score: f64,
    pub distance_score: f64,
    pub final_score: f64,
    pub distance_km: Option<f64>,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub similarity: Option<f64>,
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryInfo {
    #[serde(rename = "type")]
    pub query_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default)]
    pub user_location: Option<Location>,
    pub weights: Weights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<Recommendation>,
    pub total: usize,
    pub query_info: QueryInfo,
}

// Query parameters for listing the car catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_page_size")]
    pub limit: u32,
}

fn default_page_size() -> u32 {
    20
}

impl Default for CarListQuery {
    fn default() -> Self {
        Self {
            manufacturer: None,
            min_price: None,
            max_price: None,
            skip: 0,
            limit: default_page_size(),
        }
    }
}
