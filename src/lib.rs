//! Price prediction feature encoding and recommendation request building for
//! the car platform, plus the HTTP gateway that forwards them to the external
//! prediction / recommendation API.

use axum::extract::FromRef;

pub mod api_client;
pub mod config;
pub mod encoder;
pub mod error;
pub mod models;
pub mod recommendations;
pub mod routes;

use crate::{api_client::ApiClient, config::Settings};

// Shared application state; handlers pull the parts they need via FromRef
#[derive(Clone, FromRef)]
pub struct AppState {
    pub api: ApiClient,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let api = ApiClient::new(settings)?;
        Ok(Self { api })
    }
}
