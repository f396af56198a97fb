//! Keyset pagination over `(created_at desc, id desc)`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Position of the last item on a page. The next page starts strictly after
/// it in descending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
  pub created_at: DateTime<Utc>,
  pub id:         Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub limit: usize,
  pub after: Option<Cursor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
  pub items: Vec<T>,
  /// `Some` when at least one more item exists past `items`.
  pub next:  Option<Cursor>,
}
