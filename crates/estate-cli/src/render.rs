//! Plain-text rendering of API responses.

use anyhow::Result;
use estate_core::{
  analytics::{PropertyAnalytics, TransactionAnalytics},
  dashboard::Dashboard,
  feedback::FieldErrors,
  user::User,
};
use serde::Serialize;

pub fn json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

pub fn field_errors(errors: &FieldErrors) {
  for (field, message) in [
    ("name", errors.name),
    ("email", errors.email),
    ("message", errors.message),
  ] {
    if let Some(message) = message {
      eprintln!("{field}: {message}");
    }
  }
}

pub fn users(users: &[User]) {
  for u in users {
    println!(
      "{}  {:<8} {:<8} {:<24} {}  {}",
      u.id,
      u.role,
      u.status,
      u.name,
      u.email,
      u.created_at.format("%Y-%m-%d"),
    );
  }
}

pub fn dashboard(d: &Dashboard) {
  let t = &d.total_counts;
  println!(
    "properties {}  buyers {}  sellers {}  employees {}",
    t.properties, t.buyers, t.sellers, t.employees
  );
  let s = &d.property_status;
  println!("available {}  pending {}  sold {}", s.available, s.pending, s.sold);
  let e = &d.employee_stats;
  println!("employees active {}  inactive {}", e.active, e.inactive);

  println!("\nrecent properties:");
  for l in &d.recent_properties {
    let p = &l.property;
    let seller = l.seller.as_ref().map_or("(unknown seller)", |s| s.name.as_str());
    println!(
      "  {}  {:<10} {:>12.2}  {:<9} {}  by {seller}",
      p.created_at.format("%Y-%m-%d"),
      p.property_type,
      p.price,
      p.status,
      p.title,
    );
  }

  println!("\nrecent feedback:");
  for f in &d.feedbacks {
    println!(
      "  {}  {} <{}>: {}",
      f.feedback.created_at.format("%Y-%m-%d"),
      f.feedback.name,
      f.feedback.email,
      f.feedback.message,
    );
  }
}

pub fn property_analytics(a: &PropertyAnalytics) {
  println!("by type:");
  for (count, price) in a.property_types.iter().zip(&a.price_analytics) {
    println!(
      "  {:<12} {:>5}  avg {:>12.2}  min {:>12.2}  max {:>12.2}",
      count.property_type, count.count, price.average_price, price.min_price, price.max_price
    );
  }
  println!("listings per month:");
  for m in &a.monthly_listings {
    println!("  {}-{:02}  {}", m.year, m.month, m.count);
  }
}

pub fn transaction_analytics(a: &TransactionAnalytics) {
  println!("sales per month:");
  for m in &a.monthly_sales {
    println!("  {}-{:02}  {:>5}  {:>14.2}", m.year, m.month, m.total_sales, m.total_value);
  }
  println!("top sellers:");
  for (rank, s) in a.top_sellers.iter().enumerate() {
    println!(
      "  {}. {} <{}>  {} sold",
      rank + 1,
      s.seller_details.name,
      s.seller_details.email,
      s.properties_sold
    );
  }
}
