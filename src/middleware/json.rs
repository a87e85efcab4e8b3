use axum::extract::FromRequest;

use crate::error::ApiError;

/// Request-body extractor whose rejection uses the standard error envelope
/// instead of axum's plain-text default.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);
