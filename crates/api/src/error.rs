use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use grantscout_core::advisory::AdvisoryError;
use grantscout_core::error::find_upstream_error;

const GRANTS_GOV_ERROR_PREFIX: &str = "Grants.gov API error";
const GRANTS_ERROR_PREFIX: &str = "Grants API error";
const FORWARDER_INTERNAL_MESSAGE: &str = "Server error while contacting Grants.gov";
const INTERNAL_MESSAGE: &str = "Internal server error";
pub const EMPTY_QUERY_MESSAGE: &str = "Missing or empty query";

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Maps a failed passthrough search.
    pub fn from_forwarder(err: anyhow::Error) -> Self {
        from_search_error(err, GRANTS_GOV_ERROR_PREFIX, FORWARDER_INTERNAL_MESSAGE)
    }
}

impl From<AdvisoryError> for ApiError {
    fn from(err: AdvisoryError) -> Self {
        match err {
            AdvisoryError::EmptyQuery => Self::bad_request(EMPTY_QUERY_MESSAGE),
            AdvisoryError::Search(err) => {
                from_search_error(err, GRANTS_ERROR_PREFIX, INTERNAL_MESSAGE)
            }
            AdvisoryError::Completion(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %format!("{err:#}"), "advisory completion failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
            }
        }
    }
}

fn from_search_error(err: anyhow::Error, prefix: &str, internal_message: &str) -> ApiError {
    if let Some(upstream) = find_upstream_error(&err) {
        let status = StatusCode::from_u16(upstream.status.as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        return ApiError::new(status, format!("{prefix}: {}", upstream.body));
    }

    sentry_anyhow::capture_anyhow(&err);
    tracing::error!(error = %format!("{err:#}"), "error contacting Grants.gov");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, internal_message)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}
