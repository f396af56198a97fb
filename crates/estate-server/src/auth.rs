//! HTTP Basic authentication against stored users.
//!
//! The username is the account email and the password is checked against
//! the stored argon2 hash. On success the request carries
//! [`Claims`](estate_api::Claims); on a missing header it carries none, and
//! the admin route layer decides what that means.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use estate_api::Claims;
use estate_core::{store::MarketStore, user::UserStatus};

use crate::{AppState, error::Error};

/// Split a `Basic` authorization header into `(email, password)`.
///
/// `Ok(None)` when the header is absent; `Err` when it is present but
/// unusable.
fn basic_credentials(headers: &HeaderMap) -> Result<Option<(String, String)>, Error> {
  let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else {
    return Ok(None);
  };

  let encoded = value
    .to_str()
    .ok()
    .and_then(|v| v.strip_prefix("Basic "))
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = String::from_utf8(decoded).map_err(|_| Error::Unauthorized)?;

  let (email, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;
  Ok(Some((email.to_string(), password.to_string())))
}

/// Verify credentials from `headers` against `store`.
pub async fn verify_auth<S>(headers: &HeaderMap, store: &S) -> Result<Option<Claims>, Error>
where
  S: MarketStore,
{
  let Some((email, password)) = basic_credentials(headers)? else {
    return Ok(None);
  };

  let creds = store
    .find_credentials(&email)
    .await
    .map_err(Error::store)?
    .ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&creds.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  if creds.user.status != UserStatus::Active {
    tracing::info!(user = %creds.user.id, "inactive user refused");
    return Err(Error::Unauthorized);
  }

  Ok(Some(Claims {
    user_id: creds.user.id,
    role:    creds.user.role,
  }))
}

/// Middleware: attach [`Claims`] for valid credentials, reject bad ones,
/// pass anonymous requests through untouched.
pub async fn authenticate<S>(
  State(state): State<AppState<S>>,
  req: Request,
  next: Next,
) -> Result<Response, Error>
where
  S: MarketStore + 'static,
{
  // The body is not `Sync`; only the parts are held across the lookup.
  let (mut parts, body) = req.into_parts();
  if let Some(claims) = verify_auth(&parts.headers, state.store.as_ref()).await? {
    parts.extensions.insert(claims);
  }
  Ok(next.run(Request::from_parts(parts, body)).await)
}
