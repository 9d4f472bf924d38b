//! HTTP API for the weather agent.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::Error;
use crate::pipeline::{Pipeline, Record};

pub const SERVICE_NAME: &str = "AI Weather Agent API";
pub const API_VERSION: &str = "1.0.0";

/// Error text returned to clients when a run fails. Details stay in the log.
const RUN_FAILED_MESSAGE: &str = "Weather agent run failed";

const TEST_CITY: &str = "Tokyo";
const TEST_QUESTION: &str = "Should I wear a jacket?";

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

/// Body of `POST /weather`.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherRequest {
    pub city: String,
    pub question: String,
    #[serde(default)]
    pub send_email_flag: bool,
    #[serde(default)]
    pub send_whatsapp_flag: bool,
}

/// Response for a weather run.
///
/// `email_sent` and `whatsapp_sent` echo the requested flags; delivery is
/// best-effort and its outcome is only logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub success: bool,
    pub city: String,
    pub weather_text: Option<String>,
    pub answer: Option<String>,
    pub email_sent: bool,
    pub whatsapp_sent: bool,
    pub error: Option<String>,
}

/// Build the API router around a shared, already-built pipeline.
pub fn api_routes(pipeline: Arc<Pipeline>) -> Router {
    let state = AppState { pipeline };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/weather", post(weather))
        .route("/test/weather", get(test_weather))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve the API until the process stops.
pub async fn serve(pipeline: Arc<Pipeline>, addr: SocketAddr) -> Result<(), Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Weather agent API listening");
    axum::serve(listener, api_routes(pipeline)).await?;
    Ok(())
}

// ── Info ────────────────────────────────────────────────────────────────

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "🌦️ AI Weather Agent API",
        "version": API_VERSION,
        "endpoints": {
            "health": "/health",
            "weather": "/weather",
            "test": "/test/weather"
        }
    }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": API_VERSION,
        "service": SERVICE_NAME
    }))
}

// ── Runs ────────────────────────────────────────────────────────────────

async fn weather(
    State(state): State<AppState>,
    Json(body): Json<WeatherRequest>,
) -> impl IntoResponse {
    run(&state.pipeline, body).await
}

async fn test_weather(State(state): State<AppState>) -> impl IntoResponse {
    let body = WeatherRequest {
        city: TEST_CITY.to_string(),
        question: TEST_QUESTION.to_string(),
        send_email_flag: false,
        send_whatsapp_flag: false,
    };
    run(&state.pipeline, body).await
}

async fn run(pipeline: &Pipeline, body: WeatherRequest) -> (StatusCode, Json<WeatherResponse>) {
    info!(city = %body.city, "Weather request");

    let initial = Record::request(
        body.city.clone(),
        body.question,
        body.send_email_flag,
        body.send_whatsapp_flag,
    );

    match pipeline.run(initial).await {
        Ok(record) => (
            StatusCode::OK,
            Json(WeatherResponse {
                success: true,
                city: body.city,
                weather_text: record.weather_text,
                answer: record.answer,
                email_sent: body.send_email_flag,
                whatsapp_sent: body.send_whatsapp_flag,
                error: None,
            }),
        ),
        Err(e) => {
            error!(city = %body.city, error = %e, "Weather run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WeatherResponse {
                    success: false,
                    city: body.city,
                    weather_text: None,
                    answer: None,
                    email_sent: false,
                    whatsapp_sent: false,
                    error: Some(RUN_FAILED_MESSAGE.to_string()),
                }),
            )
        }
    }
}
