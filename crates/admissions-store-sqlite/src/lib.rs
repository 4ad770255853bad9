//! SQLite backend for the admissions store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Consulting updates run the core
//! orchestrator inside a single rusqlite transaction on that thread.

mod encode;
mod queries;
mod schema;
mod store;
mod tx;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
