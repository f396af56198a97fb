//! Handler for `GET /admin/dashboard`.
//!
//! Optional query parameters: `userDateFrom`, `userDateTo`,
//! `propertyDateFrom`, `propertyDateTo`, `propertyStatus`, `userRole`. The
//! payload has the same shape with or without them.

use axum::{
  Json,
  extract::{Query, State},
};
use estate_core::{
  dashboard::{self, Dashboard, RECENT_FEEDBACK},
  filter::DashboardQuery,
  store::MarketStore,
};

use crate::{ApiState, error::ApiError};

/// `GET /admin/dashboard[?userDateFrom=...&...]`
pub async fn handler<S>(
  State(state): State<ApiState<S>>,
  Query(query): Query<DashboardQuery>,
) -> Result<Json<Dashboard>, ApiError>
where
  S: MarketStore,
{
  let filter = query.parse()?;
  let store = &state.store;

  let (users, properties, feedbacks) = tokio::try_join!(
    store.list_users(&filter.users),
    store.list_properties(&filter.properties),
    store.recent_feedback(RECENT_FEEDBACK),
  )
  .map_err(ApiError::store)?;

  Ok(Json(dashboard::assemble(users, properties, feedbacks)))
}
