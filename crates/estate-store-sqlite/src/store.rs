//! [`SqliteStore`]: the SQLite implementation of [`MarketStore`].

use std::path::Path;

use estate_core::{
  analytics::{MonthlyListings, MonthlySales, PriceStats, PropertyTypeCount, TopSeller},
  feedback::{Feedback, FeedbackEntry, NewFeedback},
  filter::{PropertyFilter, UserFilter},
  page::{Cursor, Page, PageRequest},
  property::{NewProperty, Property, PropertyListing, PropertyStatus},
  purchase::{NewPurchase, Purchase, PurchaseOutcome},
  store::MarketStore,
  user::{Credentials, NewUser, User, UserUpdate},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    PROPERTY_COLUMNS, RawCredentials, RawFeedback, RawListing, RawProperty,
    RawTopSeller, RawUser, RawUserRef, USER_COLUMNS, encode_dt, encode_uuid,
    non_negative, now, stored_precision,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A marketplace store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let shown = path.as_ref().display().to_string();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %shown, "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn fetch_user(&self, id_str: String) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.user_id = ?1"),
              rusqlite::params![id_str],
              |row| RawUser::from_row(row, 0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  /// Direct connection access for tests that need to plant rows the public
  /// API would never write.
  #[cfg(test)]
  pub(crate) fn connection(&self) -> &tokio_rusqlite::Connection { &self.conn }
}

// ─── Purchases ───────────────────────────────────────────────────────────────

enum Completion {
  Recorded,
  Duplicate,
  UnknownProperty,
}

fn new_purchase(input: NewPurchase) -> Purchase {
  Purchase {
    id:                Uuid::new_v4(),
    buyer_id:          input.buyer_id,
    property_id:       input.property_id,
    amount:            input.amount,
    purchase_date:     input.purchase_date.map_or_else(now, stored_precision),
    payment_reference: input.payment_reference,
  }
}

/// Purchases without a reference never collide.
fn reference_taken(
  conn: &rusqlite::Connection,
  reference: Option<&str>,
) -> rusqlite::Result<bool> {
  let Some(reference) = reference else {
    return Ok(false);
  };
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM purchases WHERE payment_reference = ?1",
        rusqlite::params![reference],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

fn insert_purchase(conn: &rusqlite::Connection, p: &Purchase) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO purchases (
       purchase_id, buyer_id, property_id, amount, purchase_date, payment_reference
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      encode_uuid(p.id),
      encode_uuid(p.buyer_id),
      encode_uuid(p.property_id),
      p.amount,
      encode_dt(p.purchase_date),
      p.payment_reference,
    ],
  )?;
  Ok(())
}

/// SQLite `LIMIT` takes an `i64`.
fn sql_limit(limit: usize) -> i64 { i64::try_from(limit).unwrap_or(i64::MAX) }

// ─── MarketStore impl ────────────────────────────────────────────────────────

impl MarketStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      id:         Uuid::new_v4(),
      name:       input.name,
      email:      input.email,
      role:       input.role,
      status:     input.status,
      created_at: now(),
    };

    let id_str     = encode_uuid(user.id);
    let name       = user.name.clone();
    let email      = user.email.clone();
    let hash       = input.password_hash;
    let role_str   = user.role.as_str();
    let status_str = user.status.as_str();
    let at_str     = encode_dt(user.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM users WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO users (user_id, name, email, password_hash, role, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, name, email, hash, role_str, status_str, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::DuplicateEmail(user.email));
    }
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    self.fetch_user(encode_uuid(id)).await
  }

  async fn find_credentials<'a>(&'a self, email: &'a str) -> Result<Option<Credentials>> {
    let email = email.to_owned();

    let raw: Option<RawCredentials> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {USER_COLUMNS}, u.password_hash FROM users u WHERE u.email = ?1"
              ),
              rusqlite::params![email],
              |row| {
                Ok(RawCredentials {
                  user:          RawUser::from_row(row, 0)?,
                  password_hash: row.get(6)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCredentials::into_credentials).transpose()
  }

  async fn list_users<'a>(&'a self, filter: &'a UserFilter) -> Result<Vec<User>> {
    let from_str = filter.created.from.map(encode_dt);
    let to_str   = filter.created.to.map(encode_dt);
    let role_str = filter.role.map(|r| r.as_str());

    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users u
           WHERE (?1 IS NULL OR u.created_at >= ?1)
             AND (?2 IS NULL OR u.created_at <= ?2)
             AND (?3 IS NULL OR u.role = ?3)
           ORDER BY u.created_at DESC, u.user_id DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![from_str, to_str, role_str], |row| {
            RawUser::from_row(row, 0)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn list_users_page(&self, page: PageRequest) -> Result<Page<User>> {
    let after_at = page.after.map(|c| encode_dt(c.created_at));
    let after_id = page.after.map(|c| encode_uuid(c.id));
    // One extra row tells us whether another page exists.
    let fetch = sql_limit(page.limit.saturating_add(1));

    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users u
           WHERE ?1 IS NULL
              OR u.created_at < ?1
              OR (u.created_at = ?1 AND u.user_id < ?2)
           ORDER BY u.created_at DESC, u.user_id DESC
           LIMIT ?3"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![after_at, after_id, fetch], |row| {
            RawUser::from_row(row, 0)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut items: Vec<User> = raws
      .into_iter()
      .map(RawUser::into_user)
      .collect::<Result<_>>()?;

    let next = if items.len() > page.limit {
      items.truncate(page.limit);
      items.last().map(|u| Cursor { created_at: u.created_at, id: u.id })
    } else {
      None
    };

    Ok(Page { items, next })
  }

  async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<Option<User>> {
    let id_str     = encode_uuid(id);
    let role_str   = update.role.map(|r| r.as_str());
    let status_str = update.status.map(|s| s.as_str());

    let changed = self
      .conn
      .call({
        let id_str = id_str.clone();
        move |conn| {
          Ok(conn.execute(
            "UPDATE users
             SET role = COALESCE(?2, role), status = COALESCE(?3, status)
             WHERE user_id = ?1",
            rusqlite::params![id_str, role_str, status_str],
          )?)
        }
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.fetch_user(id_str).await
  }

  async fn delete_user(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM users WHERE user_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  // ── Properties ────────────────────────────────────────────────────────────

  async fn add_property(&self, input: NewProperty) -> Result<Property> {
    let property = Property {
      id:            Uuid::new_v4(),
      title:         input.title,
      property_type: input.property_type,
      price:         input.price,
      location:      input.location,
      status:        input.status,
      seller_id:     input.seller_id,
      created_at:    input.created_at.map_or_else(now, stored_precision),
    };

    let id_str     = encode_uuid(property.id);
    let title      = property.title.clone();
    let kind       = property.property_type.clone();
    let price      = property.price;
    let location   = property.location.clone();
    let status_str = property.status.as_str();
    let seller_str = encode_uuid(property.seller_id);
    let at_str     = encode_dt(property.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO properties (
             property_id, title, property_type, price, location,
             status, seller_id, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str, title, kind, price, location, status_str, seller_str, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(property)
  }

  async fn get_property(&self, id: Uuid) -> Result<Option<Property>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawProperty> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {PROPERTY_COLUMNS} FROM properties p WHERE p.property_id = ?1"
              ),
              rusqlite::params![id_str],
              RawProperty::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProperty::into_property).transpose()
  }

  async fn list_properties<'a>(
    &'a self,
    filter: &'a PropertyFilter,
  ) -> Result<Vec<PropertyListing>> {
    let from_str   = filter.created.from.map(encode_dt);
    let to_str     = filter.created.to.map(encode_dt);
    let status_str = filter.status.map(|s| s.as_str());

    let raws: Vec<RawListing> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROPERTY_COLUMNS}, s.user_id, s.name, s.email
           FROM properties p
           LEFT JOIN users s ON s.user_id = p.seller_id
           WHERE (?1 IS NULL OR p.created_at >= ?1)
             AND (?2 IS NULL OR p.created_at <= ?2)
             AND (?3 IS NULL OR p.status = ?3)
           ORDER BY p.created_at DESC, p.property_id DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![from_str, to_str, status_str], |row| {
            Ok(RawListing {
              property: RawProperty::from_row(row)?,
              seller:   RawUserRef::from_row(row, 8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawListing::into_listing).collect()
  }

  async fn set_property_status(
    &self,
    id: Uuid,
    status: PropertyStatus,
  ) -> Result<Option<Property>> {
    let id_str     = encode_uuid(id);
    let status_str = status.as_str();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE properties SET status = ?2 WHERE property_id = ?1",
          rusqlite::params![id_str, status_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_property(id).await
  }

  // ── Feedback ──────────────────────────────────────────────────────────────

  async fn record_feedback(&self, input: NewFeedback) -> Result<Feedback> {
    let feedback = Feedback {
      id:         Uuid::new_v4(),
      name:       input.name,
      email:      input.email,
      message:    input.message,
      user_id:    input.user_id,
      created_at: now(),
    };

    let id_str      = encode_uuid(feedback.id);
    let name        = feedback.name.clone();
    let email       = feedback.email.clone();
    let message     = feedback.message.clone();
    let user_id_str = feedback.user_id.map(encode_uuid);
    let at_str      = encode_dt(feedback.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO feedback (feedback_id, name, email, message, user_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, name, email, message, user_id_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(feedback)
  }

  async fn recent_feedback(&self, limit: usize) -> Result<Vec<FeedbackEntry>> {
    let limit_val = sql_limit(limit);

    let raws: Vec<RawFeedback> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT f.feedback_id, f.name, f.email, f.message, f.user_id, f.created_at,
                  u.user_id, u.name, u.email
           FROM feedback f
           LEFT JOIN users u ON u.user_id = f.user_id
           ORDER BY f.created_at DESC, f.rowid DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], |row| {
            Ok(RawFeedback {
              feedback_id: row.get(0)?,
              name:        row.get(1)?,
              email:       row.get(2)?,
              message:     row.get(3)?,
              user_id:     row.get(4)?,
              created_at:  row.get(5)?,
              user:        RawUserRef::from_row(row, 6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFeedback::into_entry).collect()
  }

  // ── Purchases ─────────────────────────────────────────────────────────────

  async fn record_purchase(&self, input: NewPurchase) -> Result<Purchase> {
    let purchase = new_purchase(input);
    let row = purchase.clone();

    let inserted = self
      .conn
      .call(move |conn| {
        if reference_taken(conn, row.payment_reference.as_deref())? {
          return Ok(false);
        }
        insert_purchase(conn, &row)?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::DuplicatePayment(
        purchase.payment_reference.unwrap_or_default(),
      ));
    }
    Ok(purchase)
  }

  async fn complete_purchase(&self, input: NewPurchase) -> Result<PurchaseOutcome> {
    let purchase = new_purchase(input);
    let row = purchase.clone();

    let completion = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if reference_taken(&tx, row.payment_reference.as_deref())? {
          return Ok(Completion::Duplicate);
        }
        let sold = tx.execute(
          "UPDATE properties SET status = ?2 WHERE property_id = ?1",
          rusqlite::params![encode_uuid(row.property_id), PropertyStatus::Sold.as_str()],
        )?;
        if sold == 0 {
          return Ok(Completion::UnknownProperty);
        }
        insert_purchase(&tx, &row)?;
        tx.commit()?;
        Ok(Completion::Recorded)
      })
      .await?;

    Ok(match completion {
      Completion::Recorded => PurchaseOutcome::Recorded(purchase),
      Completion::Duplicate => PurchaseOutcome::Duplicate,
      Completion::UnknownProperty => PurchaseOutcome::UnknownProperty,
    })
  }

  // ── Aggregations ──────────────────────────────────────────────────────────

  async fn property_type_counts(&self) -> Result<Vec<PropertyTypeCount>> {
    let rows: Vec<(String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT property_type, COUNT(*)
           FROM properties
           GROUP BY property_type
           ORDER BY property_type",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(property_type, count)| PropertyTypeCount {
          property_type,
          count: non_negative(count),
        })
        .collect(),
    )
  }

  async fn price_analytics(&self) -> Result<Vec<PriceStats>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT property_type, AVG(price), MIN(price), MAX(price)
           FROM properties
           GROUP BY property_type
           ORDER BY property_type",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(PriceStats {
              property_type: row.get(0)?,
              average_price: row.get(1)?,
              min_price:     row.get(2)?,
              max_price:     row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }

  async fn monthly_listings(&self, limit: usize) -> Result<Vec<MonthlyListings>> {
    let limit_val = sql_limit(limit);

    let rows: Vec<(i32, u32, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT CAST(strftime('%Y', created_at) AS INTEGER) AS year,
                  CAST(strftime('%m', created_at) AS INTEGER) AS month,
                  COUNT(*)
           FROM properties
           GROUP BY year, month
           ORDER BY year DESC, month DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(year, month, count)| MonthlyListings {
          year,
          month,
          count: non_negative(count),
        })
        .collect(),
    )
  }

  async fn monthly_sales(&self, limit: usize) -> Result<Vec<MonthlySales>> {
    let limit_val = sql_limit(limit);

    let rows: Vec<(i32, u32, i64, f64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT CAST(strftime('%Y', purchase_date) AS INTEGER) AS year,
                  CAST(strftime('%m', purchase_date) AS INTEGER) AS month,
                  COUNT(*),
                  TOTAL(amount)
           FROM purchases
           GROUP BY year, month
           ORDER BY year DESC, month DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(year, month, sales, value)| MonthlySales {
          year,
          month,
          total_sales: non_negative(sales),
          total_value: value,
        })
        .collect(),
    )
  }

  async fn top_sellers(&self, limit: usize) -> Result<Vec<TopSeller>> {
    let limit_val = sql_limit(limit);

    let raws: Vec<RawTopSeller> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT t.seller_id, t.sold, {USER_COLUMNS}
           FROM (
             SELECT seller_id, COUNT(*) AS sold, MIN(rowid) AS first_sold
             FROM properties
             WHERE status = 'sold'
             GROUP BY seller_id
             ORDER BY sold DESC, first_sold ASC
             LIMIT ?1
           ) t
           LEFT JOIN users u ON u.user_id = t.seller_id
           ORDER BY t.sold DESC, t.first_sold ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], |row| {
            let matched: Option<String> = row.get(2)?;
            Ok(RawTopSeller {
              seller_id:       row.get(0)?,
              properties_sold: row.get(1)?,
              user:            matched.map(|_| RawUser::from_row(row, 2)).transpose()?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTopSeller::into_top_seller).collect()
  }
}
