//! HTTP API for heart disease predictions.
//!
//! `POST /predict/heart` takes a flat JSON object of feature values and
//! answers `{"prediction_result": 0 | 1}`. `GET /health` reports whether the
//! model is loaded.

use std::convert::Infallible;

use feature_aligner::FeatureRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::{Filter, Rejection, Reply};

use crate::state::{ModelState, SharedModelState};

/// Error message returned for every prediction while the model is unavailable.
pub const MODEL_NOT_LOADED: &str = "Model not loaded";

/// Error message returned when a prediction fails for any other reason.
pub const INTERNAL_ERROR: &str = "Internal server error";

/// Largest declared request body accepted by `POST /predict/heart`.
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

// =============================================================================
// Request/Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PredictionResponse {
    pub prediction_result: u8,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub version: String,
}

// =============================================================================
// API Routes
// =============================================================================

/// Build the complete API route tree
pub fn api_routes(
    state: SharedModelState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let predict = warp::path("predict")
        .and(warp::path("heart"))
        .and(warp::path::end())
        .and(warp::post())
        .and(body_size_limit())
        .and(warp::body::bytes())
        .and(with_state(state.clone()))
        .and_then(handle_predict);

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state))
        .and_then(handle_health);

    // The browser front end posts to the service directly
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(vec!["content-type"]);

    predict.or(health).recover(handle_rejection).with(cors)
}

fn with_state(
    state: SharedModelState,
) -> impl Filter<Extract = (SharedModelState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Rejects bodies whose declared `content-length` exceeds [`MAX_BODY_BYTES`].
///
/// Requests without the header pass, so an empty `POST` still predicts.
fn body_size_limit() -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::header::optional::<u64>("content-length")
        .and_then(|length: Option<u64>| async move {
            match length {
                Some(length) if length > MAX_BODY_BYTES => {
                    Err(warp::reject::custom(BodyTooLarge { length }))
                }
                _ => Ok(()),
            }
        })
        .untuple_one()
}

/// Warp rejection for oversized request bodies
#[derive(Debug)]
pub struct BodyTooLarge {
    pub length: u64,
}

impl warp::reject::Reject for BodyTooLarge {}

/// Turns an oversized body into a 413; every other rejection passes through.
async fn handle_rejection(err: Rejection) -> Result<warp::reply::Response, Rejection> {
    if let Some(BodyTooLarge { length }) = err.find::<BodyTooLarge>() {
        warn!(length, limit = MAX_BODY_BYTES, "Request body too large");
        return Ok(error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request payload too large",
        ));
    }

    Err(err)
}

// =============================================================================
// Handlers
// =============================================================================

async fn handle_predict(
    body: Bytes,
    state: SharedModelState,
) -> Result<warp::reply::Response, Infallible> {
    let ModelState::Ready(handle) = state.as_ref() else {
        return Ok(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            MODEL_NOT_LOADED,
        ));
    };

    let record = decode_record(&body);

    match handle.predict(&record) {
        Ok(label) => {
            debug!(label, fields = record.len(), "Prediction served");
            let resp = PredictionResponse {
                prediction_result: label,
            };
            Ok(warp::reply::json(&resp).into_response())
        }
        Err(e) => {
            error!("Prediction failed: {e:#}");
            Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR,
            ))
        }
    }
}

async fn handle_health(state: SharedModelState) -> Result<impl Reply, Infallible> {
    let resp = HealthResponse {
        status: "healthy".to_string(),
        model_loaded: state.is_ready(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    Ok(warp::reply::json(&resp))
}

// =============================================================================
// Helpers
// =============================================================================

/// Decodes a request body into a feature record.
///
/// An empty body, malformed JSON or a JSON value that is not an object all
/// decode to an empty record, which aligns to an all-zero row.
pub fn decode_record(body: &[u8]) -> FeatureRecord {
    if body.iter().all(u8::is_ascii_whitespace) {
        warn!("Empty request body, predicting on defaults");
        return FeatureRecord::new();
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(record)) => record,
        Ok(_) => {
            warn!("Request body is not a JSON object, predicting on defaults");
            FeatureRecord::new()
        }
        Err(e) => {
            warn!(error = %e, "Malformed request body, predicting on defaults");
            FeatureRecord::new()
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> warp::reply::Response {
    let body = ApiError {
        error: message.to_string(),
    };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}
