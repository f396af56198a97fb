//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body is `{"message": "..."}`; validation failures add an
//! `errors` object keyed by field.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use estate_core::feedback::FieldErrors;
use serde_json::json;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("authentication required")]
  Unauthorized,

  #[error("admin role required")]
  Forbidden,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("validation failed")]
  Invalid(#[source] FieldErrors),

  /// A dashboard filter that could not be parsed. Reported with its own
  /// message, like any other query failure.
  #[error(transparent)]
  Filter(#[from] estate_core::Error),

  /// A store failure whose message is passed through to the client.
  #[error("{0}")]
  Store(#[source] BoxError),

  /// A store failure reported to the client with a fixed message.
  #[error("{message}: {source}")]
  Failed {
    message: &'static str,
    #[source]
    source:  BoxError,
  },
}

impl ApiError {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// Map a store error to a fixed client-facing `message`.
  pub fn failed<E>(message: &'static str) -> impl FnOnce(E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    move |e| Self::Failed { message, source: Box::new(e) }
  }

  fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) | ApiError::Invalid(_) => StatusCode::BAD_REQUEST,
      ApiError::Filter(_) | ApiError::Store(_) | ApiError::Failed { .. } => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    } else {
      tracing::debug!(error = %self, %status, "request rejected");
    }

    let body = match &self {
      ApiError::Invalid(errors) => {
        json!({ "message": "Please correct the highlighted fields", "errors": errors })
      }
      ApiError::NotFound(m) | ApiError::BadRequest(m) => json!({ "message": m }),
      ApiError::Failed { message, .. } => json!({ "message": message }),
      other => json!({ "message": other.to_string() }),
    };

    let mut res = (status, Json(body)).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"estate\""),
      );
    }
    res
  }
}
