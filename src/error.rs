use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Request-scoped error taxonomy. Nothing here is fatal to the process;
/// every variant maps to a status code and a JSON `{"message": ...}` body.
#[derive(Debug, Display)]
pub enum ApiError {
    /// Malformed or out-of-policy input (bad date range, quota exceeded).
    #[display(fmt = "{}", _0)]
    Validation(String),

    /// The caller's role lacks permission for the requested action.
    #[display(fmt = "{}", _0)]
    Forbidden(String),

    /// Referenced record absent.
    #[display(fmt = "{}", _0)]
    NotFound(String),

    /// State-machine violation: double clock-in, deciding an already
    /// processed leave request, deleting a non-pending request.
    #[display(fmt = "{}", _0)]
    Conflict(String),

    /// Document store (or another collaborator) unreachable. Write paths
    /// surface this loudly; read paths may degrade to a safe default at the
    /// call site instead of propagating.
    #[display(fmt = "{}", _0)]
    Upstream(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ApiError::NotFound("Record not found".into()),
            other => {
                tracing::error!(error = %other, "document store error");
                ApiError::Upstream("Upstream store unavailable".into())
            }
        }
    }
}
