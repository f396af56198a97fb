//! Core types and trait definitions for the estate marketplace.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::MarketStore`]; the API layer depends
//! only on that trait.

pub mod analytics;
pub mod dashboard;
pub mod error;
pub mod feedback;
pub mod filter;
pub mod page;
pub mod property;
pub mod purchase;
pub mod store;
pub mod user;

pub use error::{Error, Result};
