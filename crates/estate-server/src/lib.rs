//! HTTP server for the estate marketplace admin core.
//!
//! Composes the JSON API from `estate-api` with Basic authentication, the
//! payment webhook and a health probe, backed by any [`MarketStore`].

pub mod auth;
pub mod error;
pub mod webhook;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Router, middleware,
  routing::{get, post},
};
use estate_api::ApiConfig;
use estate_core::{
  store::MarketStore,
  user::{NewUser, Role},
};
use rand_core::OsRng;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use webhook::SignatureVerifier;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ESTATE_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                   String,
  #[serde(default = "default_port")]
  pub port:                   u16,
  pub store_path:             PathBuf,
  pub webhook_secret:         String,
  #[serde(default = "default_webhook_tolerance")]
  pub webhook_tolerance_secs: u64,
  #[serde(default = "default_max_page_size")]
  pub max_page_size:          usize,
  /// Admin account created at startup if its email is not registered yet.
  #[serde(default)]
  pub bootstrap_admin:        Option<BootstrapAdmin>,
}

#[derive(Deserialize, Clone)]
pub struct BootstrapAdmin {
  pub name:          String,
  pub email:         String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 5000 }
fn default_webhook_tolerance() -> u64 { 300 }
fn default_max_page_size() -> usize { ApiConfig::default().max_page_size }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the server's own handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub config:   Arc<ServerConfig>,
  pub verifier: Arc<dyn SignatureVerifier>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      config:   Arc::clone(&self.config),
      verifier: Arc::clone(&self.verifier),
    }
  }
}

impl<S> AppState<S> {
  /// State with the HMAC webhook verifier configured from `config`.
  pub fn new(store: Arc<S>, config: ServerConfig) -> Self {
    let verifier = webhook::HmacVerifier::new(
      config.webhook_secret.clone(),
      config.webhook_tolerance_secs,
    );
    Self {
      store,
      config: Arc::new(config),
      verifier: Arc::new(verifier),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full server [`Router`]:
///
/// - `GET /health`
/// - `/api/admin/*` and `/api/feedback` from `estate-api`, behind Basic auth
/// - `POST /api/payments/webhook`, authenticated by signature instead
pub fn router<S>(state: AppState<S>) -> Router
where
  S: MarketStore + 'static,
{
  let api_config = ApiConfig { max_page_size: state.config.max_page_size };

  let api = estate_api::api_router(Arc::clone(&state.store), api_config)
    .layer(middleware::from_fn_with_state(state.clone(), auth::authenticate::<S>));

  let payments = Router::new()
    .route("/payments/webhook", post(webhook::handler::<S>))
    .with_state(state);

  Router::new()
    .route("/health", get(health))
    .nest("/api", api.merge(payments))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str { "ok" }

// ─── Startup helpers ──────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

/// Insert the configured bootstrap admin unless that email already exists.
/// Returns whether a user was created.
pub async fn ensure_bootstrap_admin<S>(store: &S, admin: &BootstrapAdmin) -> Result<bool, Error>
where
  S: MarketStore,
{
  if store
    .find_credentials(&admin.email)
    .await
    .map_err(Error::store)?
    .is_some()
  {
    return Ok(false);
  }

  let user = store
    .add_user(NewUser::new(
      admin.name.clone(),
      admin.email.clone(),
      admin.password_hash.clone(),
      Role::Admin,
    ))
    .await
    .map_err(Error::store)?;
  tracing::info!(id = %user.id, email = %user.email, "bootstrap admin created");
  Ok(true)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
