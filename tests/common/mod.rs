// Throwaway upstream API used by the integration tests.
#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use car_advisor::config::Settings;
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone, Default)]
pub struct Upstream {
    pub requests: Arc<Mutex<Vec<Recorded>>>,
    // Number of upcoming predict calls that answer 503
    pub failures_left: Arc<AtomicUsize>,
}

impl Upstream {
    pub fn failing(times: usize) -> Self {
        let upstream = Self::default();
        upstream.failures_left.store(times, Ordering::SeqCst);
        upstream
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, path: &str, headers: &HeaderMap, body: Value) {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push(Recorded {
            path: path.to_string(),
            authorization,
            body,
        });
    }

    fn take_failure(&self) -> bool {
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

pub fn car(car_id: &str) -> Value {
    json!({
        "car_id": car_id,
        "url": format!("https://listings.example.com/{car_id}"),
        "price": 14500.0,
        "year": 2017,
        "manufacturer": "ford",
        "model": "escape",
        "condition": "good",
        "fuel": "gas",
        "odometer": 68000.0,
        "transmission": "automatic",
        "type": "SUV",
        "paint_color": "blue",
        "state": "ca",
        "latitude": 37.77,
        "longitude": -122.42
    })
}

async fn predict(
    State(up): State<Upstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    up.record("/v1/predict/", &headers, body);
    if up.take_failure() {
        return (StatusCode::SERVICE_UNAVAILABLE, "model warming up").into_response();
    }
    Json(json!({ "price": 18250.5 })).into_response()
}

async fn predictions(State(up): State<Upstream>, headers: HeaderMap) -> Response {
    up.record("/v1/predict/predictions", &headers, Value::Null);
    Json(json!([{ "price": 18250.5, "brand": 1 }])).into_response()
}

async fn recommend(
    State(up): State<Upstream>,
    uri: axum::http::Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    up.record(uri.path(), &headers, body.clone());

    let ranks: Vec<u32> = if body["query"] == "broken ranking" {
        vec![2, 1]
    } else {
        let top_n = body["top_n"].as_u64().unwrap_or(10).min(3) as u32;
        (1..=top_n).collect()
    };
    let recommendations: Vec<Value> = ranks
        .iter()
        .map(|rank| {
            json!({
                "car": car(&format!("rec-{rank}")),
                "similarity_score": 0.9,
                "distance_score": 0.6,
                "final_score": 0.81,
                "distance_km": 12.5,
                "rank": rank
            })
        })
        .collect();

    let query_type = if body.get("car_id").is_some() { "by_id" } else { "by_text" };
    Json(json!({
        "recommendations": recommendations,
        "total": ranks.len(),
        "query_info": {
            "type": query_type,
            "car_id": body.get("car_id"),
            "query": body.get("query"),
            "user_location": body.get("user_location"),
            "weights": {
                "similarity": body["similarity_weight"],
                "distance": body["distance_weight"]
            }
        }
    }))
    .into_response()
}

async fn list_cars(
    State(up): State<Upstream>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    up.record("/v1/cars", &headers, json!(params));
    Json(json!([car("a1"), car("b2")])).into_response()
}

// Records the raw path so tests can see exactly what went over the wire
async fn get_car(
    State(up): State<Upstream>,
    uri: axum::http::Uri,
    headers: HeaderMap,
    Path(car_id): Path<String>,
) -> Response {
    up.record(uri.path(), &headers, json!({ "car_id": car_id, "query": uri.query() }));
    if car_id == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({ "detail": "Car not found" }))).into_response();
    }
    Json(car(&car_id)).into_response()
}

// Serves the fake API on an ephemeral port and returns its base URL
pub async fn spawn_upstream(upstream: Upstream) -> String {
    let app = Router::new()
        .route("/v1/predict/", post(predict))
        .route("/v1/predict/predictions", get(predictions))
        .route("/v1/recommendations/by-id", post(recommend))
        .route("/v1/recommendations/by-text", post(recommend))
        .route("/v1/cars", get(list_cars))
        .route("/v1/cars/:car_id", get(get_car))
        .with_state(upstream);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn settings_for(base_url: &str) -> Settings {
    Settings {
        api_base_url: base_url.to_string(),
        request_timeout_secs: 5,
        max_retries: 2,
        retry_delay_ms: 10,
        ..Settings::default()
    }
}
