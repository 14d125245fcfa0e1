// Route definitions

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::AppState;

mod api;
mod extract;

pub use extract::ForwardedToken;

pub fn create_router(app_state: AppState) -> Router {
    let api_router = Router::new()
        .route("/health", get(api::health))
        .route("/features", post(api::encode_features))
        .route("/predict", post(api::predict_price))
        .route("/predictions", get(api::list_predictions))
        .route("/recommendations", post(api::recommend))
        .route("/cars", get(api::list_cars))
        .route("/cars/:car_id", get(api::get_car));

    Router::new()
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
