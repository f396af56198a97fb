//! JSON REST API for the estate marketplace admin core.
//!
//! Exposes an axum [`Router`] backed by any [`estate_core::store::MarketStore`].
//! Authentication and transport concerns are the caller's responsibility: the
//! caller must insert an [`access::Claims`] request extension for
//! authenticated requests. The `/admin` routes check that extension once, in
//! [`access::require_admin`].
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", estate_api::api_router(store.clone(), ApiConfig::default()))
//! ```

pub mod access;
pub mod analytics;
pub mod cursor;
pub mod dashboard;
pub mod error;
pub mod feedback;
pub mod users;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Router, middleware,
  routing::{get, patch, post},
};
use estate_core::store::MarketStore;

pub use access::Claims;
pub use error::ApiError;

/// Tunables the router needs from the server configuration.
#[derive(Debug, Clone, Copy)]
pub struct ApiConfig {
  /// Upper bound for `?limit=` on paginated listings.
  pub max_page_size: usize,
}

impl Default for ApiConfig {
  fn default() -> Self { Self { max_page_size: 100 } }
}

/// State shared by every handler.
pub struct ApiState<S> {
  pub store:  Arc<S>,
  pub config: ApiConfig,
}

// Manual impl: `S` itself need not be `Clone`.
impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      config: self.config,
    }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, config: ApiConfig) -> Router<()>
where
  S: MarketStore + 'static,
{
  let state = ApiState { store, config };

  let admin = Router::new()
    .route("/dashboard", get(dashboard::handler::<S>))
    .route("/users", get(users::list::<S>))
    .route(
      "/users/{id}",
      patch(users::update::<S>).delete(users::delete::<S>),
    )
    .route("/analytics/properties", get(analytics::properties::<S>))
    .route("/analytics/transactions", get(analytics::transactions::<S>))
    .route_layer(middleware::from_fn(access::require_admin));

  Router::new()
    .nest("/admin", admin)
    .route("/feedback", post(feedback::submit::<S>))
    .with_state(state)
}
