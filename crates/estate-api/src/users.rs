//! Handlers for `/admin/users` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/admin/users` | Newest first. Optional `?limit=N[&cursor=C]`; next page in `x-next-cursor` |
//! | `PATCH`  | `/admin/users/{id}` | Body: `{"role"?, "status"?}`; 404 if not found |
//! | `DELETE` | `/admin/users/{id}` | `{success, message}`; success even if the user did not exist |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderValue, StatusCode},
  response::{IntoResponse, Response},
};
use estate_core::{
  filter::UserFilter,
  page::PageRequest,
  store::MarketStore,
  user::{User, UserUpdate},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, cursor, error::ApiError};

const LIST_FAILED: &str = "Failed to fetch users";

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("invalid user id {raw:?}")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub limit:  Option<usize>,
  pub cursor: Option<String>,
}

/// `GET /admin/users[?limit=N][&cursor=C]`
///
/// Without `limit` or `cursor` the whole listing is returned. With either, a
/// page of at most `limit` (default and ceiling: the configured maximum).
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Response, ApiError>
where
  S: MarketStore,
{
  if params.limit.is_none() && params.cursor.is_none() {
    let users = state
      .store
      .list_users(&UserFilter::default())
      .await
      .map_err(ApiError::failed(LIST_FAILED))?;
    return Ok(Json(users).into_response());
  }

  let max = state.config.max_page_size.max(1);
  let request = PageRequest {
    limit: params.limit.unwrap_or(max).clamp(1, max),
    after: params.cursor.as_deref().map(cursor::decode).transpose()?,
  };

  let page = state
    .store
    .list_users_page(request)
    .await
    .map_err(ApiError::failed(LIST_FAILED))?;

  let mut res = Json(page.items).into_response();
  if let Some(next) = page.next {
    let value = HeaderValue::from_str(&cursor::encode(&next))
      .map_err(ApiError::store)?;
    res.headers_mut().insert(cursor::NEXT_CURSOR_HEADER, value);
  }
  Ok(res)
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /admin/users/{id}` with `{"role":"employee","status":"inactive"}`
pub async fn update<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
  Json(body): Json<UserUpdate>,
) -> Result<Json<User>, ApiError>
where
  S: MarketStore,
{
  let id = parse_id(&id)?;
  let user = state
    .store
    .update_user(id, body)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  tracing::info!(%id, role = %user.role, status = %user.status, "user updated");
  Ok(Json(user))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteOutcome {
  pub success: bool,
  pub message: String,
}

impl DeleteOutcome {
  fn failed(message: impl Into<String>) -> Response {
    let body = Self { success: false, message: message.into() };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
  }
}

/// `DELETE /admin/users/{id}`
///
/// A delete of an id that matches nothing still reports success.
pub async fn delete<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Response
where
  S: MarketStore,
{
  let Ok(id) = Uuid::parse_str(&id) else {
    return DeleteOutcome::failed("Invalid user id");
  };

  match state.store.delete_user(id).await {
    Ok(removed) => {
      if removed {
        tracing::info!(%id, "user deleted");
      } else {
        tracing::debug!(%id, "delete matched no user");
      }
      Json(DeleteOutcome {
        success: true,
        message: "User deleted successfully".to_string(),
      })
      .into_response()
    }
    Err(e) => {
      tracing::error!(%id, error = %e, "user delete failed");
      DeleteOutcome::failed("Failed to delete user")
    }
  }
}
