//! Handlers for `/admin/analytics/*`.
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `GET`  | `/admin/analytics/properties`   | `{propertyTypes, priceAnalytics, monthlyListings}` |
//! | `GET`  | `/admin/analytics/transactions` | `{monthlySales, topSellers}` |

use axum::{Json, extract::State};
use estate_core::{
  analytics::{MONTHLY_BUCKETS, PropertyAnalytics, TOP_SELLERS, TransactionAnalytics},
  store::MarketStore,
};

use crate::{ApiState, error::ApiError};

pub async fn properties<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<PropertyAnalytics>, ApiError>
where
  S: MarketStore,
{
  let store = &state.store;
  let (property_types, price_analytics, monthly_listings) = tokio::try_join!(
    store.property_type_counts(),
    store.price_analytics(),
    store.monthly_listings(MONTHLY_BUCKETS),
  )
  .map_err(ApiError::failed("Failed to fetch property analytics"))?;

  Ok(Json(PropertyAnalytics {
    property_types,
    price_analytics,
    monthly_listings,
  }))
}

/// A top seller whose user record is gone fails the whole response.
pub async fn transactions<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<TransactionAnalytics>, ApiError>
where
  S: MarketStore,
{
  let store = &state.store;
  let (monthly_sales, top_sellers) = tokio::try_join!(
    store.monthly_sales(MONTHLY_BUCKETS),
    store.top_sellers(TOP_SELLERS),
  )
  .map_err(ApiError::failed("Failed to fetch transaction analytics"))?;

  Ok(Json(TransactionAnalytics { monthly_sales, top_sellers }))
}
