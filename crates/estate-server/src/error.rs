//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::webhook::SignatureError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("webhook signature rejected: {0}")]
  Signature(#[from] SignatureError),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "message": "Unauthorized" })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"estate\""),
        );
        res
      }
      Error::BadRequest(msg) => {
        tracing::debug!(%msg, "bad request");
        (StatusCode::BAD_REQUEST, Json(json!({ "message": msg }))).into_response()
      }
      Error::Signature(e) => {
        tracing::warn!(error = %e, "webhook signature rejected");
        (
          StatusCode::BAD_REQUEST,
          Json(json!({ "message": format!("Webhook Error: {e}") })),
        )
          .into_response()
      }
      Error::Store(e) => {
        tracing::error!(error = %e, "store error");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "message": e.to_string() })),
        )
          .into_response()
      }
    }
  }
}
