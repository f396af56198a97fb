//! Users: marketplace accounts and their closed role/status categories.
//!
//! A [`User`] never carries its password hash. The hash only travels inside
//! [`Credentials`], which is what authentication asks the store for.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Closed categories ───────────────────────────────────────────────────────

/// Which part of the marketplace an account may use.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Buyer,
  Seller,
  Employee,
  Admin,
}

impl Role {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownRole(s.to_owned()))
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserStatus {
  #[default]
  Active,
  Inactive,
}

impl UserStatus {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownUserStatus(s.to_owned()))
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A stored account as returned by every read path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:         Uuid,
  pub name:       String,
  pub email:      String,
  pub role:       Role,
  pub status:     UserStatus,
  pub created_at: DateTime<Utc>,
}

/// Input for [`MarketStore::add_user`](crate::store::MarketStore::add_user).
/// `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:          String,
  pub email:         String,
  /// Argon2 PHC string.
  pub password_hash: String,
  pub role:          Role,
  pub status:        UserStatus,
}

impl NewUser {
  pub fn new(
    name: impl Into<String>,
    email: impl Into<String>,
    password_hash: impl Into<String>,
    role: Role,
  ) -> Self {
    Self {
      name: name.into(),
      email: email.into(),
      password_hash: password_hash.into(),
      role,
      status: UserStatus::default(),
    }
  }
}

/// Admin-side mutation of an account. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub role:   Option<Role>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<UserStatus>,
}

/// A user together with the stored password hash.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub user:          User,
  pub password_hash: String,
}

/// The `name`/`email` projection used when another record references a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
  pub id:    Uuid,
  pub name:  String,
  pub email: String,
}

impl From<&User> for UserRef {
  fn from(u: &User) -> Self {
    Self { id: u.id, name: u.name.clone(), email: u.email.clone() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn role_round_trips_through_its_string_form() {
    for role in [Role::Buyer, Role::Seller, Role::Employee, Role::Admin] {
      assert_eq!(Role::parse(role.as_str()).unwrap(), role);
    }
    assert_eq!(Role::Employee.to_string(), "employee");
  }

  #[test]
  fn out_of_enum_values_are_rejected() {
    assert!(matches!(Role::parse("landlord"), Err(Error::UnknownRole(v)) if v == "landlord"));
    assert!(matches!(Role::parse("Admin"), Err(Error::UnknownRole(_))));
    assert!(matches!(UserStatus::parse("banned"), Err(Error::UnknownUserStatus(_))));
  }

  #[test]
  fn user_serialises_without_password() {
    let user = User {
      id:         Uuid::nil(),
      name:       "Ada".into(),
      email:      "ada@example.com".into(),
      role:       Role::Seller,
      status:     UserStatus::Active,
      created_at: DateTime::<Utc>::UNIX_EPOCH,
    };
    let json = serde_json::to_value(&user).unwrap();
    assert_eq!(json["role"], "seller");
    assert_eq!(json["status"], "active");
    assert!(json.get("createdAt").is_some());
    assert!(json.get("password").is_none());
    assert!(json.get("passwordHash").is_none());
  }
}
