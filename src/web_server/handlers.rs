//! Request parsing and status mapping for the queue endpoints

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use crate::queue::{parse_wait_secs, BrokerError, BrokerResult, SharedQueueBroker};

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub broker: SharedQueueBroker,
    pub enqueue_timeout: Duration,
}

type QueryPairs = Vec<(String, String)>;

impl IntoResponse for BrokerError {
    fn into_response(self) -> Response {
        let status = match &self {
            BrokerError::BadArguments(reason) => {
                debug!("Rejecting request: {}", reason);
                StatusCode::BAD_REQUEST
            }
            BrokerError::NotFound => StatusCode::NOT_FOUND,
            BrokerError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            BrokerError::Internal(reason) => {
                error!("❌ Internal broker error: {}", reason);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        status.into_response()
    }
}

/// PUT /:key?v=value
pub async fn enqueue(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<QueryPairs>,
) -> Result<StatusCode, BrokerError> {
    let value = parse_put_params(&params)?;

    // The broker rejects malformed keys with BadArguments
    state
        .broker
        .enqueue(&key, value, state.enqueue_timeout)
        .await?;
    Ok(StatusCode::OK)
}

/// GET /:key[?timeout=secs]
pub async fn dequeue(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<QueryPairs>,
) -> Result<String, BrokerError> {
    let timeout = parse_get_params(&params)?;

    let value = state.broker.dequeue(&key, timeout).await?;
    Ok(format!("{}\n", value))
}

/// Anything that is not a PUT or GET on a single alphanumeric segment
pub async fn bad_request() -> StatusCode {
    StatusCode::BAD_REQUEST
}

fn parse_put_params(params: &[(String, String)]) -> BrokerResult<String> {
    match params {
        [(name, value)] if name == "v" => Ok(value.clone()),
        _ => Err(BrokerError::BadArguments(
            "expected exactly one query parameter 'v'".to_string(),
        )),
    }
}

fn parse_get_params(params: &[(String, String)]) -> BrokerResult<Duration> {
    match params {
        [] => Ok(Duration::ZERO),
        [(name, value)] if name == "timeout" => {
            let secs = value.parse::<i64>().map_err(|_| {
                BrokerError::BadArguments(format!("timeout must be an integer, got {:?}", value))
            })?;
            parse_wait_secs(secs)
        }
        _ => Err(BrokerError::BadArguments(
            "only the 'timeout' query parameter is accepted".to_string(),
        )),
    }
}
