//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
///
/// Domain errors keep their classification from
/// [`atmp_core::error::ErrorKind`], so a conflict raised deep inside the
/// store (a second audit, a replayed finalize) surfaces as `409` without the
/// handler inspecting it.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Domain(#[from] atmp_core::Error),

  #[error("bad request: {0}")]
  BadRequest(String),
}

impl ApiError {
  /// Wrap a store/blob backend error, keeping its domain classification.
  pub fn backend<E: Into<atmp_core::Error>>(e: E) -> Self {
    ApiError::Domain(e.into())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    use atmp_core::error::ErrorKind;

    let (status, message) = match &self {
      ApiError::Domain(e) => {
        let status = match e.kind() {
          ErrorKind::Validation => StatusCode::BAD_REQUEST,
          ErrorKind::NotFound => StatusCode::NOT_FOUND,
          ErrorKind::Conflict => StatusCode::CONFLICT,
          ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, e.to_string())
      }
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
