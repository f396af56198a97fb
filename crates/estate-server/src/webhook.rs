//! Payment-provider webhook: signature verification and purchase recording.
//!
//! The provider signs each delivery with a header of the form
//! `t=<unix seconds>,v1=<hex hmac-sha256(secret, "<t>.<raw body>")>`. Only
//! `checkout.session.completed` events change state; every other event type
//! is acknowledged and ignored.

use axum::{
  Json,
  body::Bytes,
  extract::State,
  http::HeaderMap,
};
use chrono::{DateTime, Utc};
use estate_core::{
  purchase::{NewPurchase, PurchaseOutcome},
  store::MarketStore,
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::{Value, json};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::{AppState, error::Error};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

// ─── Signature verification ──────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
  #[error("missing signature header")]
  Missing,
  #[error("malformed signature header")]
  Malformed,
  #[error("timestamp outside the tolerance window")]
  Expired,
  #[error("no signature matches the payload")]
  Mismatch,
}

/// Checks that a webhook body really came from the payment provider.
pub trait SignatureVerifier: Send + Sync {
  fn verify(
    &self,
    header: Option<&str>,
    body: &[u8],
    now: DateTime<Utc>,
  ) -> Result<(), SignatureError>;
}

/// HMAC-SHA256 over `"<t>.<body>"` with a shared secret.
pub struct HmacVerifier {
  secret:         Vec<u8>,
  tolerance_secs: u64,
}

impl HmacVerifier {
  pub fn new(secret: impl Into<Vec<u8>>, tolerance_secs: u64) -> Self {
    Self {
      secret:         secret.into(),
      tolerance_secs,
    }
  }

  fn mac(&self, timestamp: &str, body: &[u8]) -> Result<HmacSha256, SignatureError> {
    let mut mac =
      HmacSha256::new_from_slice(&self.secret).map_err(|_| SignatureError::Malformed)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(mac)
  }

  /// The header value this verifier would accept for `body` at `timestamp`.
  pub fn sign(&self, timestamp: i64, body: &[u8]) -> Result<String, SignatureError> {
    let t = timestamp.to_string();
    let digest = self.mac(&t, body)?.finalize().into_bytes();
    Ok(format!("t={t},v1={}", hex::encode(digest)))
  }
}

impl SignatureVerifier for HmacVerifier {
  fn verify(
    &self,
    header: Option<&str>,
    body: &[u8],
    now: DateTime<Utc>,
  ) -> Result<(), SignatureError> {
    let header = header.ok_or(SignatureError::Missing)?;

    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in header.split(',') {
      match part.trim().split_once('=') {
        Some(("t", v)) => timestamp = Some(v),
        Some(("v1", v)) => candidates.push(v),
        Some(_) => {}
        None => return Err(SignatureError::Malformed),
      }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    let seconds: i64 = timestamp.parse().map_err(|_| SignatureError::Malformed)?;
    if candidates.is_empty() {
      return Err(SignatureError::Malformed);
    }
    if now.timestamp().abs_diff(seconds) > self.tolerance_secs {
      return Err(SignatureError::Expired);
    }

    // `verify_slice` compares in constant time.
    let matched = candidates.iter().any(|candidate| {
      let Ok(expected) = hex::decode(candidate) else {
        return false;
      };
      self
        .mac(timestamp, body)
        .is_ok_and(|mac| mac.verify_slice(&expected).is_ok())
    });

    if matched { Ok(()) } else { Err(SignatureError::Mismatch) }
  }
}

// ─── Event payload ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Event {
  #[serde(rename = "type")]
  kind: String,
  data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
  object: Value,
}

#[derive(Debug, Deserialize)]
struct CheckoutSession {
  id:           String,
  /// Minor currency units.
  amount_total: i64,
  metadata:     CheckoutMetadata,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutMetadata {
  property_id: Uuid,
  buyer_id:    Uuid,
}

impl CheckoutSession {
  fn into_purchase(self) -> NewPurchase {
    NewPurchase {
      buyer_id:          self.metadata.buyer_id,
      property_id:       self.metadata.property_id,
      amount:            minor_to_major(self.amount_total),
      purchase_date:     None,
      payment_reference: Some(self.id),
    }
  }
}

#[allow(clippy::cast_precision_loss)]
fn minor_to_major(minor: i64) -> f64 { minor as f64 / 100.0 }

// ─── Handler ─────────────────────────────────────────────────────────────────

/// `POST /api/payments/webhook` with the provider's raw JSON body.
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Json<Value>, Error>
where
  S: MarketStore + 'static,
{
  let signature = headers
    .get(SIGNATURE_HEADER)
    .and_then(|v| v.to_str().ok());
  state.verifier.verify(signature, &body, Utc::now())?;

  let event: Event = serde_json::from_slice(&body)
    .map_err(|e| Error::BadRequest(format!("invalid event payload: {e}")))?;

  if event.kind != CHECKOUT_COMPLETED {
    tracing::debug!(kind = %event.kind, "ignoring webhook event");
    return Ok(Json(json!({ "received": true })));
  }

  let session: CheckoutSession = serde_json::from_value(event.data.object)
    .map_err(|e| Error::BadRequest(format!("invalid checkout session: {e}")))?;
  let property_id = session.metadata.property_id;
  let reference = session.id.clone();

  // Deliveries are at-least-once; replays and unknown properties are
  // acknowledged so the provider stops retrying.
  match state
    .store
    .complete_purchase(session.into_purchase())
    .await
    .map_err(Error::store)?
  {
    PurchaseOutcome::Recorded(purchase) => tracing::info!(
      purchase = %purchase.id,
      %property_id,
      amount = purchase.amount,
      "checkout completed"
    ),
    PurchaseOutcome::Duplicate => {
      tracing::debug!(%reference, "checkout already recorded");
    }
    PurchaseOutcome::UnknownProperty => {
      tracing::warn!(%property_id, %reference, "checkout for unknown property ignored");
    }
  }
  Ok(Json(json!({ "received": true })))
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn verifier() -> HmacVerifier { HmacVerifier::new("whsec_test", 300) }

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() }

  #[test]
  fn accepts_its_own_signature() {
    let v = verifier();
    let body = br#"{"type":"ping"}"#;
    let header = v.sign(now().timestamp(), body).unwrap();
    assert_eq!(v.verify(Some(&header), body, now()), Ok(()));
  }

  #[test]
  fn accepts_when_any_v1_matches() {
    let v = verifier();
    let body = b"{}";
    let good = v.sign(now().timestamp(), body).unwrap();
    let header = format!("{good},v1=deadbeef,v0=ignored");
    assert_eq!(v.verify(Some(&header), body, now()), Ok(()));
  }

  #[test]
  fn rejects_tampered_body() {
    let v = verifier();
    let header = v.sign(now().timestamp(), b"{\"amount\":1}").unwrap();
    assert_eq!(
      v.verify(Some(&header), b"{\"amount\":9}", now()),
      Err(SignatureError::Mismatch)
    );
  }

  #[test]
  fn rejects_other_secret() {
    let header = HmacVerifier::new("other", 300)
      .sign(now().timestamp(), b"{}")
      .unwrap();
    assert_eq!(
      verifier().verify(Some(&header), b"{}", now()),
      Err(SignatureError::Mismatch)
    );
  }

  #[test]
  fn rejects_stale_timestamp() {
    let v = verifier();
    let header = v.sign(now().timestamp() - 301, b"{}").unwrap();
    assert_eq!(v.verify(Some(&header), b"{}", now()), Err(SignatureError::Expired));

    let edge = v.sign(now().timestamp() - 300, b"{}").unwrap();
    assert_eq!(v.verify(Some(&edge), b"{}", now()), Ok(()));
  }

  #[test]
  fn extreme_timestamps_are_expired() {
    let v = verifier();
    for t in [i64::MIN, i64::MAX] {
      let header = format!("t={t},v1=00");
      assert_eq!(
        v.verify(Some(&header), b"{}", now()),
        Err(SignatureError::Expired),
        "{header:?}"
      );
    }
  }

  #[test]
  fn rejects_missing_and_malformed_headers() {
    let v = verifier();
    assert_eq!(v.verify(None, b"{}", now()), Err(SignatureError::Missing));
    for header in ["", "garbage", "t=abc,v1=00", "v1=00", "t=1717243200"] {
      assert_eq!(
        v.verify(Some(header), b"{}", now()),
        Err(SignatureError::Malformed),
        "{header:?}"
      );
    }
  }

  #[test]
  fn minor_units_become_major() {
    assert!((minor_to_major(12_345) - 123.45).abs() < 1e-9);
  }
}
