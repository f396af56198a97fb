//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with exactly three fractional
//! digits and a `Z` suffix, so lexical order matches chronological order and
//! range filters can compare the text directly. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use estate_core::{
  analytics::TopSeller,
  feedback::{Feedback, FeedbackEntry},
  property::{Property, PropertyListing, PropertyStatus},
  user::{Credentials, Role, User, UserRef, UserStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// The current time truncated to the stored precision, so a value returned
/// from a write equals the value read back later.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(3) }

/// Truncate a caller-supplied timestamp to the stored precision.
pub fn stored_precision(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(3) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawUser`]'s field order, for a `users` alias `u`.
pub const USER_COLUMNS: &str =
  "u.user_id, u.name, u.email, u.role, u.status, u.created_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub name:       String,
  pub email:      String,
  pub role:       String,
  pub status:     String,
  pub created_at: String,
}

impl RawUser {
  /// Read the six [`USER_COLUMNS`] starting at column `offset`.
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(offset)?,
      name:       row.get(offset + 1)?,
      email:      row.get(offset + 2)?,
      role:       row.get(offset + 3)?,
      status:     row.get(offset + 4)?,
      created_at: row.get(offset + 5)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:         decode_uuid(&self.user_id)?,
      name:       self.name,
      email:      self.email,
      role:       Role::parse(&self.role)?,
      status:     UserStatus::parse(&self.status)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawCredentials {
  pub user:          RawUser,
  pub password_hash: String,
}

impl RawCredentials {
  pub fn into_credentials(self) -> Result<Credentials> {
    Ok(Credentials {
      user:          self.user.into_user()?,
      password_hash: self.password_hash,
    })
  }
}

/// A `(id, name, email)` triple from a LEFT JOIN; all `None` when unmatched.
pub struct RawUserRef {
  pub id:    Option<String>,
  pub name:  Option<String>,
  pub email: Option<String>,
}

impl RawUserRef {
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:    row.get(offset)?,
      name:  row.get(offset + 1)?,
      email: row.get(offset + 2)?,
    })
  }

  pub fn into_user_ref(self) -> Result<Option<UserRef>> {
    match (self.id, self.name, self.email) {
      (Some(id), Some(name), Some(email)) => Ok(Some(UserRef {
        id: decode_uuid(&id)?,
        name,
        email,
      })),
      _ => Ok(None),
    }
  }
}

pub const PROPERTY_COLUMNS: &str = "p.property_id, p.title, p.property_type, p.price, \
   p.location, p.status, p.seller_id, p.created_at";

pub struct RawProperty {
  pub property_id:   String,
  pub title:         String,
  pub property_type: String,
  pub price:         f64,
  pub location:      Option<String>,
  pub status:        String,
  pub seller_id:     String,
  pub created_at:    String,
}

impl RawProperty {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      property_id:   row.get(0)?,
      title:         row.get(1)?,
      property_type: row.get(2)?,
      price:         row.get(3)?,
      location:      row.get(4)?,
      status:        row.get(5)?,
      seller_id:     row.get(6)?,
      created_at:    row.get(7)?,
    })
  }

  pub fn into_property(self) -> Result<Property> {
    Ok(Property {
      id:            decode_uuid(&self.property_id)?,
      title:         self.title,
      property_type: self.property_type,
      price:         self.price,
      location:      self.location,
      status:        PropertyStatus::parse(&self.status)?,
      seller_id:     decode_uuid(&self.seller_id)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// A property row followed by the LEFT JOINed seller columns.
pub struct RawListing {
  pub property: RawProperty,
  pub seller:   RawUserRef,
}

impl RawListing {
  pub fn into_listing(self) -> Result<PropertyListing> {
    Ok(PropertyListing {
      property: self.property.into_property()?,
      seller:   self.seller.into_user_ref()?,
    })
  }
}

pub struct RawFeedback {
  pub feedback_id: String,
  pub name:        String,
  pub email:       String,
  pub message:     String,
  pub user_id:     Option<String>,
  pub created_at:  String,
  pub user:        RawUserRef,
}

impl RawFeedback {
  pub fn into_entry(self) -> Result<FeedbackEntry> {
    Ok(FeedbackEntry {
      feedback: Feedback {
        id:         decode_uuid(&self.feedback_id)?,
        name:       self.name,
        email:      self.email,
        message:    self.message,
        user_id:    self.user_id.as_deref().map(decode_uuid).transpose()?,
        created_at: decode_dt(&self.created_at)?,
      },
      user:     self.user.into_user_ref()?,
    })
  }
}

/// A ranked seller id with the LEFT JOINed user; `user` is `None` when the
/// seller no longer exists.
pub struct RawTopSeller {
  pub seller_id:       String,
  pub properties_sold: i64,
  pub user:            Option<RawUser>,
}

impl RawTopSeller {
  pub fn into_top_seller(self) -> Result<TopSeller> {
    let seller_id = decode_uuid(&self.seller_id)?;
    let user = self.user.ok_or(Error::DanglingSeller(seller_id))?;
    Ok(TopSeller {
      seller_id,
      properties_sold: non_negative(self.properties_sold),
      seller_details: user.into_user()?,
    })
  }
}

/// SQLite counts are `i64`; they are never negative.
pub fn non_negative(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }
