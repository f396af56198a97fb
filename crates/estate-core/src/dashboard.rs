//! The admin dashboard payload and the assembler that derives its counts.
//!
//! [`assemble`] is pure: it takes the already-filtered user and property
//! lists plus the recent feedback and computes everything else from them.
//! Property order is preserved, so `recent_properties` is always a prefix of
//! `properties`.

use serde::{Deserialize, Serialize};

use crate::{
  feedback::FeedbackEntry,
  property::{PropertyListing, PropertyStatus},
  user::{Role, User, UserStatus},
};

/// Number of feedback entries shown on the dashboard.
pub const RECENT_FEEDBACK: usize = 5;

/// Number of properties copied into `recent_properties`.
pub const RECENT_PROPERTIES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalCounts {
  pub properties: usize,
  pub buyers:     usize,
  pub sellers:    usize,
  pub employees:  usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeStats {
  pub active:   usize,
  pub inactive: usize,
  pub total:    usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyStatusCounts {
  pub available: usize,
  pub pending:   usize,
  pub sold:      usize,
}

impl PropertyStatusCounts {
  pub fn total(&self) -> usize { self.available + self.pending + self.sold }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
  pub users:             Vec<User>,
  pub properties:        Vec<PropertyListing>,
  pub feedbacks:         Vec<FeedbackEntry>,
  pub employees:         Vec<User>,
  pub total_counts:      TotalCounts,
  pub employee_stats:    EmployeeStats,
  pub property_status:   PropertyStatusCounts,
  pub recent_properties: Vec<PropertyListing>,
}

pub fn assemble(
  users: Vec<User>,
  properties: Vec<PropertyListing>,
  feedbacks: Vec<FeedbackEntry>,
) -> Dashboard {
  let employees: Vec<User> = users
    .iter()
    .filter(|u| u.role == Role::Employee)
    .cloned()
    .collect();

  let count_role = |role: Role| users.iter().filter(|u| u.role == role).count();
  let total_counts = TotalCounts {
    properties: properties.len(),
    buyers:     count_role(Role::Buyer),
    sellers:    count_role(Role::Seller),
    employees:  employees.len(),
  };

  let active = employees
    .iter()
    .filter(|e| e.status == UserStatus::Active)
    .count();
  let employee_stats = EmployeeStats {
    active,
    inactive: employees.len() - active,
    total: employees.len(),
  };

  let mut property_status = PropertyStatusCounts::default();
  for listing in &properties {
    match listing.property.status {
      PropertyStatus::Available => property_status.available += 1,
      PropertyStatus::Pending => property_status.pending += 1,
      PropertyStatus::Sold => property_status.sold += 1,
    }
  }

  let recent_properties = properties
    .iter()
    .take(RECENT_PROPERTIES)
    .cloned()
    .collect();

  Dashboard {
    users,
    properties,
    feedbacks,
    employees,
    total_counts,
    employee_stats,
    property_status,
    recent_properties,
  }
}
