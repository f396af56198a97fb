//! Opaque page cursors for `?cursor=` / `x-next-cursor`.
//!
//! A cursor is the URL-safe base64 (no padding) of
//! `"<createdAt RFC 3339 millis>|<uuid>"`. Clients treat it as opaque.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD as B64};
use chrono::{DateTime, SecondsFormat, Utc};
use estate_core::page::Cursor;
use uuid::Uuid;

use crate::error::ApiError;

/// Response header carrying the cursor for the following page.
pub const NEXT_CURSOR_HEADER: &str = "x-next-cursor";

pub fn encode(cursor: &Cursor) -> String {
  let created = cursor.created_at.to_rfc3339_opts(SecondsFormat::Millis, true);
  B64.encode(format!("{created}|{}", cursor.id))
}

pub fn decode(token: &str) -> Result<Cursor, ApiError> {
  let bad = || ApiError::BadRequest("invalid cursor".to_string());

  let bytes = B64.decode(token).map_err(|_| bad())?;
  let text = std::str::from_utf8(&bytes).map_err(|_| bad())?;
  let (created, id) = text.split_once('|').ok_or_else(bad)?;

  Ok(Cursor {
    created_at: DateTime::parse_from_rfc3339(created)
      .map_err(|_| bad())?
      .with_timezone(&Utc),
    id:         Uuid::parse_str(id).map_err(|_| bad())?,
  })
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn decode_reads_what_encode_writes() {
    let cursor = Cursor {
      created_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
      id:         Uuid::new_v4(),
    };
    let token = encode(&cursor);
    assert!(!token.contains('='));
    assert_eq!(decode(&token).unwrap(), cursor);
  }

  #[test]
  fn garbage_is_a_bad_request() {
    for token in ["", "!!!", "bm90LWEtY3Vyc29y", &B64.encode("2024-01-01|nope")] {
      assert!(
        matches!(decode(token), Err(ApiError::BadRequest(_))),
        "token {token:?} should be rejected"
      );
    }
  }
}
