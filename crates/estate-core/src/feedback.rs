//! Feedback submissions and the contact-form validation rules.
//!
//! The same [`FeedbackForm::validate`] runs in the CLI before anything is
//! sent and again in the API on receipt; the server result is authoritative.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::user::UserRef;

/// Deliberately loose: something, an `@`, something, a dot, something.
static EMAIL_SHAPE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("static pattern"));

pub fn looks_like_email(s: &str) -> bool { EMAIL_SHAPE.is_match(s) }

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
  pub id:         Uuid,
  pub name:       String,
  pub email:      String,
  pub message:    String,
  pub user_id:    Option<Uuid>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
  pub name:    String,
  pub email:   String,
  pub message: String,
  pub user_id: Option<Uuid>,
}

/// Feedback with its author populated, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
  #[serde(flatten)]
  pub feedback: Feedback,
  pub user:     Option<UserRef>,
}

// ─── Form validation ─────────────────────────────────────────────────────────

/// The contact form as submitted. Missing fields deserialise as empty so
/// they are reported by [`validate`](Self::validate) rather than by the
/// JSON extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackForm {
  #[serde(default)]
  pub name:    String,
  #[serde(default)]
  pub email:   String,
  #[serde(default)]
  pub message: String,
}

/// Per-field messages; a `None` field passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[error("feedback form is invalid")]
pub struct FieldErrors {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name:    Option<&'static str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email:   Option<&'static str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<&'static str>,
}

impl FieldErrors {
  pub fn is_empty(&self) -> bool {
    self.name.is_none() && self.email.is_none() && self.message.is_none()
  }
}

impl FeedbackForm {
  pub fn validate(&self) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();

    if self.name.trim().is_empty() {
      errors.name = Some("Name is required");
    }
    if self.email.is_empty() {
      errors.email = Some("Email is required");
    } else if !looks_like_email(&self.email) {
      errors.email = Some("Email is invalid");
    }
    if self.message.trim().is_empty() {
      errors.message = Some("Message is required");
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
  }

  /// Validate and convert into a storable submission.
  pub fn into_new_feedback(
    self,
    user_id: Option<Uuid>,
  ) -> Result<NewFeedback, FieldErrors> {
    self.validate()?;
    Ok(NewFeedback {
      name: self.name,
      email: self.email,
      message: self.message,
      user_id,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn form(name: &str, email: &str, message: &str) -> FeedbackForm {
    FeedbackForm {
      name:    name.into(),
      email:   email.into(),
      message: message.into(),
    }
  }

  #[test]
  fn valid_form_passes() {
    assert!(form("Ada", "ada@example.com", "Lovely listings").validate().is_ok());
  }

  #[test]
  fn empty_name_is_required() {
    let err = form("", "a@b.com", "hi").validate().unwrap_err();
    assert_eq!(err.name, Some("Name is required"));
    assert_eq!(err.email, None);
    assert_eq!(err.message, None);
  }

  #[test]
  fn whitespace_only_fields_are_rejected() {
    let err = form("   ", "a@b.com", "\n\t").validate().unwrap_err();
    assert!(err.name.is_some());
    assert_eq!(err.message, Some("Message is required"));
  }

  #[test]
  fn email_missing_and_malformed_have_distinct_messages() {
    let missing = form("Ada", "", "hi").validate().unwrap_err();
    assert_eq!(missing.email, Some("Email is required"));

    let malformed = form("Ada", "ada-at-example", "hi").validate().unwrap_err();
    assert_eq!(malformed.email, Some("Email is invalid"));
  }

  #[test]
  fn email_shape_is_loose() {
    assert!(looks_like_email("a@b.co"));
    assert!(looks_like_email("first.last+tag@sub.example.org"));
    assert!(!looks_like_email("a@b"));
    assert!(!looks_like_email("@b.com"));
    assert!(!looks_like_email("a@.com"));
    assert!(!looks_like_email("a @b.com"));
  }

  #[test]
  fn field_errors_serialise_only_failures() {
    let err = form("", "a@b.com", "hi").validate().unwrap_err();
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json, serde_json::json!({ "name": "Name is required" }));
  }
}
