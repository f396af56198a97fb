//! Completed transactions. Written by the payment flow, read by analytics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
  pub id:                Uuid,
  pub buyer_id:          Uuid,
  pub property_id:       Uuid,
  pub amount:            f64,
  pub purchase_date:     DateTime<Utc>,
  /// Identifier assigned by the payment provider, if any.
  pub payment_reference: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPurchase {
  pub buyer_id:          Uuid,
  pub property_id:       Uuid,
  pub amount:            f64,
  /// Defaults to the current time when `None`.
  pub purchase_date:     Option<DateTime<Utc>>,
  pub payment_reference: Option<String>,
}

/// What [`complete_purchase`](crate::store::MarketStore::complete_purchase)
/// did with a checkout.
#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseOutcome {
  /// Stored, and the property is now sold.
  Recorded(Purchase),
  /// The payment reference was already recorded. Nothing was written.
  Duplicate,
  /// No property has the purchased id. Nothing was written.
  UnknownProperty,
}
