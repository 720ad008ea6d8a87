//! Presentation of gating errors.
//!
//! Every gating denial maps to the same status and message code, whichever
//! surface raised it. The axum integration sits behind the `http` feature.

use serde::Serialize;

use tag_gating_types::{GatingError, ACCESS_REQUIRED_MESSAGE, INVALID_ACCESS};

/// JSON body returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_code: Option<String>,
    pub error: String,
}

/// Status code and body for a gating error.
pub fn render(error: &GatingError) -> (u16, ErrorBody) {
    match error {
        GatingError::AccessDenied { .. } => (
            403,
            ErrorBody {
                error_type: INVALID_ACCESS.to_string(),
                message_code: Some(ACCESS_REQUIRED_MESSAGE.to_string()),
                error: error.to_string(),
            },
        ),
        GatingError::NotFound(_) => (
            404,
            ErrorBody {
                error_type: "not_found".to_string(),
                message_code: None,
                error: error.to_string(),
            },
        ),
        GatingError::Store(_) => (
            500,
            ErrorBody {
                error_type: "store_error".to_string(),
                message_code: None,
                error: error.to_string(),
            },
        ),
    }
}

/// Wrapper so handlers can `?` a [`GatingError`] straight into a response.
#[derive(Debug)]
pub struct Rejection(pub GatingError);

impl From<GatingError> for Rejection {
    fn from(e: GatingError) -> Self {
        Rejection(e)
    }
}

#[cfg(feature = "http")]
impl axum::response::IntoResponse for Rejection {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, body) = render(&self.0);
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, axum::Json(body)).into_response()
    }
}
