//! Router tests: the real [`api_router`] over an in-memory `SqliteStore`.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use chrono::{TimeZone, Utc};
use estate_core::{
  property::{NewProperty, PropertyStatus},
  store::MarketStore,
  user::{NewUser, Role, User, UserStatus},
};
use estate_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{ApiConfig, Claims, api_router, cursor::NEXT_CURSOR_HEADER};

async fn make_store() -> Arc<SqliteStore> {
  Arc::new(SqliteStore::open_in_memory().await.unwrap())
}

async fn add_user(store: &SqliteStore, name: &str, role: Role) -> User {
  store
    .add_user(NewUser::new(
      name,
      format!("{}@example.com", name.to_lowercase()),
      "unused",
      role,
    ))
    .await
    .unwrap()
}

async fn add_property(store: &SqliteStore, seller: Uuid, kind: &str, status: PropertyStatus, day: u32) {
  let mut input = NewProperty::new(seller, format!("{kind} on day {day}"), kind, 100.0 * f64::from(day));
  input.status = status;
  input.created_at = Some(Utc.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap());
  store.add_property(input).await.unwrap();
}

fn admin() -> Option<Claims> {
  Some(Claims { user_id: Uuid::new_v4(), role: Role::Admin })
}

async fn send(
  store: &Arc<SqliteStore>,
  method: &str,
  uri: &str,
  claims: Option<Claims>,
  body: Option<Value>,
) -> Response {
  send_with_config(store, ApiConfig::default(), method, uri, claims, body).await
}

async fn send_with_config(
  store: &Arc<SqliteStore>,
  config: ApiConfig,
  method: &str,
  uri: &str,
  claims: Option<Claims>,
  body: Option<Value>,
) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(claims) = claims {
    builder = builder.extension(claims);
  }
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  api_router(Arc::clone(store), config)
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap()
}

async fn json_body(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

// ── Access ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_routes_without_claims_return_401() {
  let store = make_store().await;
  for uri in [
    "/admin/dashboard",
    "/admin/users",
    "/admin/analytics/properties",
    "/admin/analytics/transactions",
  ] {
    let resp = send(&store, "GET", uri, None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }
}

#[tokio::test]
async fn non_admin_roles_are_forbidden() {
  let store = make_store().await;
  for role in [Role::Buyer, Role::Seller, Role::Employee] {
    let claims = Claims { user_id: Uuid::new_v4(), role };
    let resp = send(&store, "GET", "/admin/dashboard", Some(claims), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{role}");
  }
}

#[tokio::test]
async fn feedback_is_public() {
  let store = make_store().await;
  let body = json!({ "name": "Ada", "email": "ada@example.com", "message": "hi" });
  let resp = send(&store, "POST", "/feedback", None, Some(body)).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
}

// ── Dashboard ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn dashboard_counts_and_recent_properties() {
  let store = make_store().await;
  add_user(&store, "Bea", Role::Buyer).await;
  add_user(&store, "Ben", Role::Buyer).await;
  let seller = add_user(&store, "Sol", Role::Seller).await;
  let emp = add_user(&store, "Emma", Role::Employee).await;
  add_user(&store, "Eli", Role::Employee).await;
  store
    .update_user(emp.id, estate_core::user::UserUpdate {
      role:   None,
      status: Some(UserStatus::Inactive),
    })
    .await
    .unwrap();

  let statuses = [PropertyStatus::Available, PropertyStatus::Pending, PropertyStatus::Sold];
  for day in 1..=7 {
    add_property(&store, seller.id, "flat", statuses[(day as usize) % 3], day).await;
  }

  let resp = send(&store, "GET", "/admin/dashboard", admin(), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;

  assert_eq!(
    body["totalCounts"],
    json!({ "properties": 7, "buyers": 2, "sellers": 1, "employees": 2 })
  );
  assert_eq!(body["employeeStats"], json!({ "active": 1, "inactive": 1, "total": 2 }));
  assert_eq!(body["propertyStatus"], json!({ "available": 2, "pending": 3, "sold": 2 }));

  let properties = body["properties"].as_array().unwrap();
  let recent = body["recentProperties"].as_array().unwrap();
  assert_eq!(recent.len(), 5);
  assert_eq!(recent[..], properties[..5]);
  assert_eq!(recent[0]["title"], "flat on day 7");
  assert_eq!(recent[0]["seller"]["name"], "Sol");

  for user in body["users"].as_array().unwrap() {
    assert!(user.get("password").is_none());
    assert!(user.get("passwordHash").is_none());
  }
  assert_eq!(body["employees"].as_array().unwrap().len(), 2);
  assert_eq!(body["feedbacks"], json!([]));
}

#[tokio::test]
async fn dashboard_applies_filters_and_keeps_shape() {
  let store = make_store().await;
  let seller = add_user(&store, "Sol", Role::Seller).await;
  add_user(&store, "Bea", Role::Buyer).await;
  add_property(&store, seller.id, "flat", PropertyStatus::Sold, 9).await;
  add_property(&store, seller.id, "flat", PropertyStatus::Sold, 10).await;
  add_property(&store, seller.id, "flat", PropertyStatus::Available, 10).await;
  add_property(&store, seller.id, "flat", PropertyStatus::Sold, 11).await;

  let uri = "/admin/dashboard?propertyStatus=sold&propertyDateFrom=2024-06-10\
             &propertyDateTo=2024-06-10&userRole=seller";
  let body = json_body(send(&store, "GET", uri, admin(), None).await).await;

  assert_eq!(body["properties"].as_array().unwrap().len(), 1);
  assert_eq!(body["propertyStatus"], json!({ "available": 0, "pending": 0, "sold": 1 }));
  assert_eq!(body["totalCounts"]["buyers"], 0);
  assert_eq!(body["totalCounts"]["sellers"], 1);
  assert_eq!(body["users"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_dashboard_filter_is_a_500_with_message() {
  let store = make_store().await;
  let resp = send(&store, "GET", "/admin/dashboard?userRole=landlord", admin(), None).await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  let body = json_body(resp).await;
  assert!(body["message"].as_str().unwrap().contains("landlord"));
}

#[tokio::test]
async fn dashboard_shows_recent_feedback_with_author() {
  let store = make_store().await;
  let ada = add_user(&store, "Ada", Role::Buyer).await;
  let claims = Claims { user_id: ada.id, role: Role::Buyer };
  let form = json!({ "name": "Ada", "email": "ada@example.com", "message": "Lovely site" });
  let resp = send(&store, "POST", "/feedback", Some(claims), Some(form)).await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let body = json_body(send(&store, "GET", "/admin/dashboard", admin(), None).await).await;
  let feedbacks = body["feedbacks"].as_array().unwrap();
  assert_eq!(feedbacks.len(), 1);
  assert_eq!(feedbacks[0]["message"], "Lovely site");
  assert_eq!(feedbacks[0]["user"]["email"], "ada@example.com");
}

// ── Users ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_user_twice_succeeds_both_times() {
  let store = make_store().await;
  let user = add_user(&store, "Bob", Role::Buyer).await;
  let uri = format!("/admin/users/{}", user.id);

  for _ in 0..2 {
    let resp = send(&store, "DELETE", &uri, admin(), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      json_body(resp).await,
      json!({ "success": true, "message": "User deleted successfully" })
    );
  }
  assert!(store.get_user(user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_with_unparsable_id_is_400() {
  let store = make_store().await;
  let resp = send(&store, "DELETE", "/admin/users/not-a-uuid", admin(), None).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json_body(resp).await["success"], false);
}

#[tokio::test]
async fn list_users_is_newest_first_without_passwords() {
  let store = make_store().await;
  let first = add_user(&store, "First", Role::Buyer).await;
  tokio::time::sleep(std::time::Duration::from_millis(5)).await;
  let second = add_user(&store, "Second", Role::Seller).await;

  let resp = send(&store, "GET", "/admin/users", admin(), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert!(!resp.headers().contains_key(NEXT_CURSOR_HEADER));
  let body = json_body(resp).await;
  let users = body.as_array().unwrap();
  assert_eq!(users.len(), 2);
  assert_eq!(users[0]["id"], second.id.to_string());
  assert_eq!(users[1]["id"], first.id.to_string());
  assert!(users.iter().all(|u| u.get("passwordHash").is_none()));
}

#[tokio::test]
async fn list_users_pages_follow_the_cursor() {
  let store = make_store().await;
  for i in 0..5 {
    add_user(&store, &format!("User{i}"), Role::Buyer).await;
  }
  let full = json_body(send(&store, "GET", "/admin/users", admin(), None).await).await;

  let mut seen = Vec::new();
  let mut uri = "/admin/users?limit=2".to_string();
  loop {
    let resp = send(&store, "GET", &uri, admin(), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let next = resp
      .headers()
      .get(NEXT_CURSOR_HEADER)
      .map(|v| v.to_str().unwrap().to_string());
    let page = json_body(resp).await;
    assert!(page.as_array().unwrap().len() <= 2);
    seen.extend(page.as_array().unwrap().iter().cloned());
    match next {
      Some(c) => uri = format!("/admin/users?limit=2&cursor={c}"),
      None => break,
    }
  }
  assert_eq!(Value::Array(seen), full);
}

#[tokio::test]
async fn page_size_is_clamped_to_the_configured_maximum() {
  let store = make_store().await;
  for i in 0..4 {
    add_user(&store, &format!("User{i}"), Role::Buyer).await;
  }
  let config = ApiConfig { max_page_size: 3 };
  let resp =
    send_with_config(&store, config, "GET", "/admin/users?limit=50", admin(), None).await;
  assert!(resp.headers().contains_key(NEXT_CURSOR_HEADER));
  assert_eq!(json_body(resp).await.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn bad_cursor_is_400() {
  let store = make_store().await;
  let resp = send(&store, "GET", "/admin/users?cursor=%21%21", admin(), None).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json_body(resp).await["message"], "invalid cursor");
}

#[tokio::test]
async fn patch_user_updates_role_and_status() {
  let store = make_store().await;
  let user = add_user(&store, "Eve", Role::Buyer).await;
  let uri = format!("/admin/users/{}", user.id);

  let resp = send(
    &store,
    "PATCH",
    &uri,
    admin(),
    Some(json!({ "role": "employee", "status": "inactive" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body["role"], "employee");
  assert_eq!(body["status"], "inactive");

  let missing = format!("/admin/users/{}", Uuid::new_v4());
  let resp = send(&store, "PATCH", &missing, admin(), Some(json!({ "role": "admin" }))).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Analytics ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn property_analytics_on_empty_store() {
  let store = make_store().await;
  let resp = send(&store, "GET", "/admin/analytics/properties", admin(), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(
    json_body(resp).await,
    json!({ "propertyTypes": [], "priceAnalytics": [], "monthlyListings": [] })
  );
}

#[tokio::test]
async fn property_analytics_shapes() {
  let store = make_store().await;
  let seller = add_user(&store, "Sol", Role::Seller).await;
  add_property(&store, seller.id, "flat", PropertyStatus::Available, 1).await;
  add_property(&store, seller.id, "flat", PropertyStatus::Available, 3).await;

  let body =
    json_body(send(&store, "GET", "/admin/analytics/properties", admin(), None).await).await;
  assert_eq!(body["propertyTypes"], json!([{ "propertyType": "flat", "count": 2 }]));
  assert_eq!(
    body["priceAnalytics"],
    json!([{ "propertyType": "flat", "averagePrice": 200.0, "minPrice": 100.0, "maxPrice": 300.0 }])
  );
  assert_eq!(body["monthlyListings"], json!([{ "year": 2024, "month": 6, "count": 2 }]));
}

#[tokio::test]
async fn transactions_rank_the_busiest_seller_first() {
  let store = make_store().await;
  let quiet = add_user(&store, "Quiet", Role::Seller).await;
  let busy = add_user(&store, "Busy", Role::Seller).await;
  add_property(&store, quiet.id, "flat", PropertyStatus::Sold, 1).await;
  add_property(&store, busy.id, "flat", PropertyStatus::Sold, 2).await;
  add_property(&store, busy.id, "flat", PropertyStatus::Sold, 3).await;

  let resp = send(&store, "GET", "/admin/analytics/transactions", admin(), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body["monthlySales"], json!([]));
  let top = body["topSellers"].as_array().unwrap();
  assert_eq!(top[0]["sellerId"], busy.id.to_string());
  assert_eq!(top[0]["propertiesSold"], 2);
  assert_eq!(top[0]["sellerDetails"]["name"], "Busy");
  assert!(top[0]["sellerDetails"].get("passwordHash").is_none());
}

#[tokio::test]
async fn transactions_fail_whole_when_a_seller_is_gone() {
  let store = make_store().await;
  let seller = add_user(&store, "Gone", Role::Seller).await;
  add_property(&store, seller.id, "flat", PropertyStatus::Sold, 1).await;
  let resp = send(&store, "DELETE", &format!("/admin/users/{}", seller.id), admin(), None).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let resp = send(&store, "GET", "/admin/analytics/transactions", admin(), None).await;
  assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(
    json_body(resp).await,
    json!({ "message": "Failed to fetch transaction analytics" })
  );
}

// ── Feedback ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn feedback_validation_errors_are_reported_per_field() {
  let store = make_store().await;
  let body = json!({ "name": "", "email": "a@b", "message": "hi" });
  let resp = send(&store, "POST", "/feedback", None, Some(body)).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body = json_body(resp).await;
  assert_eq!(
    body["errors"],
    json!({ "name": "Name is required", "email": "Email is invalid" })
  );
  assert!(body["message"].is_string());
  assert!(store.recent_feedback(5).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_feedback_fields_are_validation_errors() {
  let store = make_store().await;
  let resp = send(&store, "POST", "/feedback", None, Some(json!({}))).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let errors = &json_body(resp).await["errors"];
  assert_eq!(errors["email"], "Email is required");
  assert_eq!(errors["message"], "Message is required");
}

#[tokio::test]
async fn accepted_feedback_returns_a_message() {
  let store = make_store().await;
  let body = json!({ "name": "Ada", "email": "ada@example.com", "message": "Great listings" });
  let resp = send(&store, "POST", "/feedback", None, Some(body)).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  assert!(json_body(resp).await["message"].is_string());

  let stored = store.recent_feedback(5).await.unwrap();
  assert_eq!(stored.len(), 1);
  assert!(stored[0].feedback.user_id.is_none());
}
