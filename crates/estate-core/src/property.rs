//! Property listings.
//!
//! A property is owned by exactly one seller through `seller_id`; the seller
//! is never embedded. Reads that need the seller's identity return a
//! [`PropertyListing`] with the reference resolved.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, user::UserRef};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PropertyStatus {
  #[default]
  Available,
  Pending,
  Sold,
}

impl PropertyStatus {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownPropertyStatus(s.to_owned()))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
  pub id:            Uuid,
  pub title:         String,
  /// Free-text category, e.g. `"apartment"` or `"villa"`.
  pub property_type: String,
  pub price:         f64,
  pub location:      Option<String>,
  pub status:        PropertyStatus,
  pub seller_id:     Uuid,
  pub created_at:    DateTime<Utc>,
}

/// Input for [`MarketStore::add_property`](crate::store::MarketStore::add_property).
#[derive(Debug, Clone)]
pub struct NewProperty {
  pub title:         String,
  pub property_type: String,
  pub price:         f64,
  pub location:      Option<String>,
  pub status:        PropertyStatus,
  pub seller_id:     Uuid,
  /// Listing time; the store stamps the current time when `None`.
  pub created_at:    Option<DateTime<Utc>>,
}

impl NewProperty {
  pub fn new(
    seller_id: Uuid,
    title: impl Into<String>,
    property_type: impl Into<String>,
    price: f64,
  ) -> Self {
    Self {
      title: title.into(),
      property_type: property_type.into(),
      price,
      location: None,
      status: PropertyStatus::default(),
      seller_id,
      created_at: None,
    }
  }
}

/// A property with its seller populated. `seller` is `None` when the
/// referenced user no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyListing {
  #[serde(flatten)]
  pub property: Property,
  pub seller:   Option<UserRef>,
}
