//! Handler for `POST /feedback`, the public contact form.

use axum::{
  Extension, Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use estate_core::{feedback::FeedbackForm, store::MarketStore};
use serde_json::json;

use crate::{ApiState, access::Claims, error::ApiError};

/// `POST /feedback` with `{"name","email","message"}`.
///
/// Validation is repeated here whatever the client did. A signed-in caller
/// is recorded as the author.
pub async fn submit<S>(
  State(state): State<ApiState<S>>,
  claims: Option<Extension<Claims>>,
  Json(form): Json<FeedbackForm>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketStore,
{
  let user_id = claims.map(|Extension(c)| c.user_id);
  let input = form.into_new_feedback(user_id).map_err(ApiError::Invalid)?;

  let stored = state
    .store
    .record_feedback(input)
    .await
    .map_err(ApiError::failed("Failed to submit feedback"))?;
  tracing::info!(id = %stored.id, "feedback received");

  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "Thank you for your feedback!" })),
  ))
}
