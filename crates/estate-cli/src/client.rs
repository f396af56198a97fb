//! Async HTTP client wrapping the estate JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use estate_core::{
  analytics::{PropertyAnalytics, TransactionAnalytics},
  dashboard::Dashboard,
  feedback::FeedbackForm,
  filter::DashboardQuery,
  user::{User, UserUpdate},
};
use reqwest::{Client, Response};
use serde::Deserialize;
use uuid::Uuid;

/// Connection settings for the estate API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Async HTTP client for the estate JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

/// A `{"message": ...}` error body.
#[derive(Deserialize)]
struct MessageBody {
  message: String,
}

/// One page of `GET /admin/users?limit=`.
#[derive(Debug)]
pub struct UserPage {
  pub users: Vec<User>,
  pub next:  Option<String>,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  /// Turn a non-success response into an error carrying the server's
  /// `message`, falling back to the status line.
  async fn check(what: &str, resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let message = resp
      .json::<MessageBody>()
      .await
      .map(|b| b.message)
      .unwrap_or_else(|_| status.to_string());
    Err(anyhow!("{what} → {status}: {message}"))
  }

  // ── Feedback ──────────────────────────────────────────────────────────────

  /// `POST /api/feedback`
  ///
  /// The form is validated locally first; an invalid form returns the
  /// [`FieldErrors`](estate_core::feedback::FieldErrors) without any request
  /// being made.
  pub async fn submit_feedback(&self, form: &FeedbackForm) -> Result<String> {
    form.validate()?;

    let resp = self
      .auth(self.client.post(self.url("/feedback")))
      .json(form)
      .send()
      .await
      .context("POST /feedback failed")?;
    let resp = Self::check("POST /feedback", resp).await?;
    let body: MessageBody = resp.json().await.context("deserialising feedback reply")?;
    Ok(body.message)
  }

  // ── Dashboard ─────────────────────────────────────────────────────────────

  /// `GET /api/admin/dashboard[?filters]`
  pub async fn dashboard(&self, query: &DashboardQuery) -> Result<Dashboard> {
    let params: Vec<(&str, &str)> = [
      ("userDateFrom", &query.user_date_from),
      ("userDateTo", &query.user_date_to),
      ("propertyDateFrom", &query.property_date_from),
      ("propertyDateTo", &query.property_date_to),
      ("propertyStatus", &query.property_status),
      ("userRole", &query.user_role),
    ]
    .into_iter()
    .filter_map(|(k, v)| v.as_deref().map(|v| (k, v)))
    .collect();

    let resp = self
      .auth(self.client.get(self.url("/admin/dashboard")))
      .query(&params)
      .send()
      .await
      .context("GET /admin/dashboard failed")?;
    let resp = Self::check("GET /admin/dashboard", resp).await?;
    resp.json().await.context("deserialising dashboard")
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  /// `GET /api/admin/users`
  pub async fn list_users(&self) -> Result<Vec<User>> {
    let resp = self
      .auth(self.client.get(self.url("/admin/users")))
      .send()
      .await
      .context("GET /admin/users failed")?;
    let resp = Self::check("GET /admin/users", resp).await?;
    resp.json().await.context("deserialising users")
  }

  /// `GET /api/admin/users?limit=N[&cursor=C]`
  pub async fn list_users_page(&self, limit: usize, cursor: Option<&str>) -> Result<UserPage> {
    let mut req = self
      .auth(self.client.get(self.url("/admin/users")))
      .query(&[("limit", limit.to_string())]);
    if let Some(cursor) = cursor {
      req = req.query(&[("cursor", cursor)]);
    }
    let resp = req.send().await.context("GET /admin/users?limit failed")?;
    let resp = Self::check("GET /admin/users", resp).await?;

    let next = resp
      .headers()
      .get("x-next-cursor")
      .and_then(|v| v.to_str().ok())
      .map(str::to_string);
    let users = resp.json().await.context("deserialising users")?;
    Ok(UserPage { users, next })
  }

  /// `PATCH /api/admin/users/{id}`
  pub async fn update_user(&self, id: Uuid, update: &UserUpdate) -> Result<User> {
    let resp = self
      .auth(self.client.patch(self.url(&format!("/admin/users/{id}"))))
      .json(update)
      .send()
      .await
      .context("PATCH /admin/users failed")?;
    let resp = Self::check("PATCH /admin/users", resp).await?;
    resp.json().await.context("deserialising user")
  }

  /// `DELETE /api/admin/users/{id}`; returns the server's message.
  pub async fn delete_user(&self, id: Uuid) -> Result<String> {
    let resp = self
      .auth(self.client.delete(self.url(&format!("/admin/users/{id}"))))
      .send()
      .await
      .context("DELETE /admin/users failed")?;
    let resp = Self::check("DELETE /admin/users", resp).await?;
    let body: MessageBody = resp.json().await.context("deserialising delete reply")?;
    Ok(body.message)
  }

  // ── Analytics ─────────────────────────────────────────────────────────────

  /// `GET /api/admin/analytics/properties`
  pub async fn property_analytics(&self) -> Result<PropertyAnalytics> {
    let resp = self
      .auth(self.client.get(self.url("/admin/analytics/properties")))
      .send()
      .await
      .context("GET /admin/analytics/properties failed")?;
    let resp = Self::check("GET /admin/analytics/properties", resp).await?;
    resp.json().await.context("deserialising property analytics")
  }

  /// `GET /api/admin/analytics/transactions`
  pub async fn transaction_analytics(&self) -> Result<TransactionAnalytics> {
    let resp = self
      .auth(self.client.get(self.url("/admin/analytics/transactions")))
      .send()
      .await
      .context("GET /admin/analytics/transactions failed")?;
    let resp = Self::check("GET /admin/analytics/transactions", resp).await?;
    resp.json().await.context("deserialising transaction analytics")
  }
}

#[cfg(test)]
mod tests {
  use estate_core::feedback::FieldErrors;

  use super::*;

  fn offline_client() -> ApiClient {
    // Port 9 (discard) on loopback: any request that is actually sent fails
    // with a connection error rather than a validation error.
    ApiClient::new(ApiConfig {
      base_url: "http://127.0.0.1:9".to_string(),
      username: String::new(),
      password: String::new(),
    })
    .unwrap()
  }

  #[tokio::test]
  async fn invalid_feedback_is_rejected_before_any_request() {
    let form = FeedbackForm {
      name:    String::new(),
      email:   "a@b.com".to_string(),
      message: "hi".to_string(),
    };
    let err = offline_client().submit_feedback(&form).await.unwrap_err();
    let fields = err.downcast_ref::<FieldErrors>().expect("validation error");
    assert_eq!(fields.name, Some("Name is required"));
    assert_eq!(fields.email, None);
  }

  #[tokio::test]
  async fn valid_feedback_goes_to_the_network() {
    let form = FeedbackForm {
      name:    "Ada".to_string(),
      email:   "a@b.com".to_string(),
      message: "hi".to_string(),
    };
    let err = offline_client().submit_feedback(&form).await.unwrap_err();
    assert!(err.downcast_ref::<FieldErrors>().is_none());
  }

  #[test]
  fn urls_are_rooted_at_api() {
    let client = ApiClient::new(ApiConfig {
      base_url: "http://localhost:5000/".to_string(),
      username: String::new(),
      password: String::new(),
    })
    .unwrap();
    assert_eq!(client.url("/feedback"), "http://localhost:5000/api/feedback");
  }

  #[test]
  fn update_payload_omits_unset_fields() {
    let payload = UserUpdate {
      role:   None,
      status: Some(estate_core::user::UserStatus::Inactive),
    };
    assert_eq!(
      serde_json::to_value(&payload).unwrap(),
      serde_json::json!({ "status": "inactive" })
    );
  }
}
