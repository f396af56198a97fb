//! Result shapes for the analytical views.
//!
//! Each view is a pure read computed by the store. Monthly views contain only
//! months that had activity; gaps are not zero-filled, so consecutive entries
//! need not be consecutive months.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::User;

/// How many `(year, month)` buckets the monthly views keep.
pub const MONTHLY_BUCKETS: usize = 12;

/// How many sellers the top-sellers view keeps.
pub const TOP_SELLERS: usize = 5;

// ─── Property analytics ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyTypeCount {
  pub property_type: String,
  pub count:         u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStats {
  pub property_type: String,
  pub average_price: f64,
  pub min_price:     f64,
  pub max_price:     f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyListings {
  pub year:  i32,
  /// 1-based calendar month.
  pub month: u32,
  pub count: u64,
}

/// Body of `GET /admin/analytics/properties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyAnalytics {
  pub property_types:   Vec<PropertyTypeCount>,
  pub price_analytics:  Vec<PriceStats>,
  pub monthly_listings: Vec<MonthlyListings>,
}

// ─── Transaction analytics ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySales {
  pub year:        i32,
  pub month:       u32,
  pub total_sales: u64,
  pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSeller {
  pub seller_id:       Uuid,
  pub properties_sold: u64,
  pub seller_details:  User,
}

/// Body of `GET /admin/analytics/transactions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionAnalytics {
  pub monthly_sales: Vec<MonthlySales>,
  pub top_sellers:   Vec<TopSeller>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_property_analytics_serialises_as_three_empty_arrays() {
    let json = serde_json::to_value(PropertyAnalytics::default()).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "propertyTypes": [],
        "priceAnalytics": [],
        "monthlyListings": [],
      })
    );
  }
}
