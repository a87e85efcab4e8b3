// HTTP API error types and persistence error classification
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::{json, Value};

/// Single failed validation rule, reported per field.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    Validation { errors: Vec<FieldError> },
    Conflict(String),
    Referential(String),
    RequiredField(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    Internal { message: String, detail: Option<String> },

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_)
            | ApiError::Validation { .. }
            | ApiError::Conflict(_)
            | ApiError::Referential(_)
            | ApiError::RequiredField(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Referential(msg)
            | ApiError::RequiredField(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
            ApiError::Validation { .. } => "Validation failed",
            ApiError::Internal { message, .. } => message,
        }
    }

    /// Convert to the error envelope: `{success: false, error, details?}`
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "success": false,
            "error": self.message(),
        });

        match self {
            ApiError::Validation { errors } => {
                body["details"] = json!(errors);
            }
            ApiError::Internal { detail: Some(detail), .. }
                if !crate::config::config().is_production() =>
            {
                body["details"] = json!(detail);
            }
            _ => {}
        }

        body
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        ApiError::Validation { errors }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_detail(message: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        ApiError::Internal {
            message: message.into(),
            detail: Some(detail.to_string()),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

/// Map a PostgreSQL SQLSTATE code to the API taxonomy.
///
/// Returns None for codes with no dedicated mapping; those fall through to
/// the generic 500 path.
fn classify_sqlstate(code: &str) -> Option<ApiError> {
    match code {
        // unique_violation
        "23505" => Some(ApiError::Conflict(
            "Resource already exists (duplicate key)".to_string(),
        )),
        // foreign_key_violation
        "23503" => Some(ApiError::Referential(
            "Referenced resource not found (foreign key constraint)".to_string(),
        )),
        // not_null_violation
        "23502" => Some(ApiError::RequiredField(
            "Required field is missing (not null constraint)".to_string(),
        )),
        // check_violation
        "23514" => Some(ApiError::bad_request("Validation failed (check constraint)")),
        // invalid_text_representation (e.g. malformed UUID)
        "22P02" => Some(ApiError::bad_request("Invalid ID format")),
        _ => None,
    }
}

/// Centralized classification of persistence errors. Stores return
/// `sqlx::Error` verbatim; only this conversion decides the HTTP shape.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ApiError::not_found("Resource not found"),
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    if let Some(classified) = classify_sqlstate(code.as_ref()) {
                        return classified;
                    }
                }
                tracing::error!("Unclassified database error: {}", db_err);
                ApiError::Internal {
                    message: "An error occurred while processing your request".to_string(),
                    detail: Some(db_err.to_string()),
                }
            }
            sqlx::Error::PoolTimedOut => {
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            _ => {
                tracing::error!("Database error: {}", err);
                ApiError::Internal {
                    message: "An error occurred while processing your request".to_string(),
                    detail: Some(err.to_string()),
                }
            }
        }
    }
}

/// Body-parse failures (malformed JSON, wrong content type) surface in the
/// same envelope as every other client error.
impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
