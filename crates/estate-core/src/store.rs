//! The `MarketStore` trait.
//!
//! Implemented by storage backends (e.g. `estate-store-sqlite`). The API and
//! server crates depend on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  analytics::{MonthlyListings, MonthlySales, PriceStats, PropertyTypeCount, TopSeller},
  feedback::{Feedback, FeedbackEntry, NewFeedback},
  filter::{PropertyFilter, UserFilter},
  page::{Page, PageRequest},
  property::{NewProperty, Property, PropertyListing, PropertyStatus},
  purchase::{NewPurchase, Purchase, PurchaseOutcome},
  user::{Credentials, NewUser, User, UserUpdate},
};

/// Abstraction over the marketplace's four collections and the aggregations
/// computed over them.
///
/// Every read that decodes a role or status rejects values outside the
/// closed enums instead of skipping the record.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait MarketStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. Fails if the email is already registered.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up a user by email together with the stored password hash.
  fn find_credentials<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + 'a;

  /// All users matching `filter`, newest first (ties broken by id, descending).
  fn list_users<'a>(
    &'a self,
    filter: &'a UserFilter,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + 'a;

  /// One page of all users in the same order as [`list_users`](Self::list_users).
  fn list_users_page(
    &self,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<User>, Self::Error>> + Send + '_;

  /// Apply an admin role/status change. Returns `None` if the user does not
  /// exist.
  fn update_user(
    &self,
    id: Uuid,
    update: UserUpdate,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Permanently delete a user. Owned properties, purchases and feedback are
  /// left untouched. Returns whether a row was removed.
  fn delete_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Properties ────────────────────────────────────────────────────────

  fn add_property(
    &self,
    input: NewProperty,
  ) -> impl Future<Output = Result<Property, Self::Error>> + Send + '_;

  fn get_property(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Property>, Self::Error>> + Send + '_;

  /// All properties matching `filter` with their seller populated, newest
  /// first (ties broken by id, descending).
  fn list_properties<'a>(
    &'a self,
    filter: &'a PropertyFilter,
  ) -> impl Future<Output = Result<Vec<PropertyListing>, Self::Error>> + Send + 'a;

  /// Returns `None` if the property does not exist.
  fn set_property_status(
    &self,
    id: Uuid,
    status: PropertyStatus,
  ) -> impl Future<Output = Result<Option<Property>, Self::Error>> + Send + '_;

  // ── Feedback ──────────────────────────────────────────────────────────

  fn record_feedback(
    &self,
    input: NewFeedback,
  ) -> impl Future<Output = Result<Feedback, Self::Error>> + Send + '_;

  /// The `limit` most recent feedback entries with their author populated.
  fn recent_feedback(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<FeedbackEntry>, Self::Error>> + Send + '_;

  // ── Purchases ─────────────────────────────────────────────────────────

  /// Store a purchase as given. Fails if its payment reference is already
  /// recorded.
  fn record_purchase(
    &self,
    input: NewPurchase,
  ) -> impl Future<Output = Result<Purchase, Self::Error>> + Send + '_;

  /// Store a checkout's purchase and mark its property sold, atomically.
  ///
  /// Replays of a recorded payment reference and purchases of unknown
  /// properties write nothing.
  fn complete_purchase(
    &self,
    input: NewPurchase,
  ) -> impl Future<Output = Result<PurchaseOutcome, Self::Error>> + Send + '_;

  // ── Aggregations ──────────────────────────────────────────────────────

  /// Number of properties per `property_type`.
  fn property_type_counts(
    &self,
  ) -> impl Future<Output = Result<Vec<PropertyTypeCount>, Self::Error>> + Send + '_;

  /// Average, minimum and maximum price per `property_type`.
  fn price_analytics(
    &self,
  ) -> impl Future<Output = Result<Vec<PriceStats>, Self::Error>> + Send + '_;

  /// Listings per `(year, month)` of creation, newest month first, at most
  /// `limit` buckets.
  fn monthly_listings(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<MonthlyListings>, Self::Error>> + Send + '_;

  /// Purchase count and summed amount per `(year, month)` of purchase date,
  /// newest month first, at most `limit` buckets.
  fn monthly_sales(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<MonthlySales>, Self::Error>> + Send + '_;

  /// Sellers ranked by number of sold properties, at most `limit`.
  ///
  /// Fails as a whole if a ranked seller id has no matching user. Sellers
  /// with equal counts keep the order in which their first sold property was
  /// stored.
  fn top_sellers(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<TopSeller>, Self::Error>> + Send + '_;
}
