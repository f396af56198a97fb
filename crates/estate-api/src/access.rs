//! The single capability check at the edge of the admin routes.
//!
//! Identity is established by the caller (see `estate-server`), which
//! inserts [`Claims`] into the request extensions. Handlers behind
//! [`require_admin`] never look at identity themselves.

use axum::{extract::Request, middleware::Next, response::Response};
use estate_core::user::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// A verified caller identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
  pub user_id: Uuid,
  pub role:    Role,
}

/// Route layer: no claims → 401, non-admin claims → 403.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ApiError> {
  match req.extensions().get::<Claims>().map(|c| c.role) {
    None => Err(ApiError::Unauthorized),
    Some(Role::Admin) => Ok(next.run(req).await),
    Some(_) => Err(ApiError::Forbidden),
  }
}
