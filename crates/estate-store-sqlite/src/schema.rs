//! SQL schema for the estate SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Reference columns (`seller_id`, `buyer_id`, `user_id`) carry no foreign
/// keys: deleting a user never cascades and never fails because of rows that
/// point at it.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS users (
    user_id        TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    email          TEXT NOT NULL UNIQUE,
    password_hash  TEXT NOT NULL,
    role           TEXT NOT NULL,   -- 'buyer' | 'seller' | 'employee' | 'admin'
    status         TEXT NOT NULL,   -- 'active' | 'inactive'
    created_at     TEXT NOT NULL    -- RFC 3339 UTC, millisecond precision
);

CREATE TABLE IF NOT EXISTS properties (
    property_id    TEXT PRIMARY KEY,
    title          TEXT NOT NULL,
    property_type  TEXT NOT NULL,
    price          REAL NOT NULL,
    location       TEXT,
    status         TEXT NOT NULL,   -- 'available' | 'pending' | 'sold'
    seller_id      TEXT NOT NULL,
    created_at     TEXT NOT NULL
);

-- Append-only.
CREATE TABLE IF NOT EXISTS feedback (
    feedback_id    TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    email          TEXT NOT NULL,
    message        TEXT NOT NULL,
    user_id        TEXT,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS purchases (
    purchase_id        TEXT PRIMARY KEY,
    buyer_id           TEXT NOT NULL,
    property_id        TEXT NOT NULL,
    amount             REAL NOT NULL,
    purchase_date      TEXT NOT NULL,
    payment_reference  TEXT
);

CREATE INDEX IF NOT EXISTS users_created_idx       ON users(created_at);
CREATE INDEX IF NOT EXISTS properties_created_idx  ON properties(created_at);
CREATE INDEX IF NOT EXISTS properties_seller_idx   ON properties(seller_id, status);
CREATE INDEX IF NOT EXISTS feedback_created_idx    ON feedback(created_at);
CREATE INDEX IF NOT EXISTS purchases_date_idx      ON purchases(purchase_date);
CREATE UNIQUE INDEX IF NOT EXISTS purchases_reference_idx ON purchases(payment_reference);

PRAGMA user_version = 1;
";
