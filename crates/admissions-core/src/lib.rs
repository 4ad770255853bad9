//! Core types and business rules for the admissions consulting store.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! update orchestrator runs against the [`orchestrator::ConsultingTx`] unit of
//! work and the KPI engine against [`store::KpiSource`]; storage backends
//! implement both.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod consultation;
pub mod counselor;
pub mod diff;
pub mod enrollment;
pub mod error;
pub mod history;
pub mod kpi;
pub mod orchestrator;
pub mod page;
pub mod store;
pub mod student;
pub mod update;

#[cfg(test)]
mod testing;

pub use error::{Error, ErrorClass, Result};
