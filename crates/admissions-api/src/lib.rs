//! JSON REST API for the admissions consulting store.
//!
//! Exposes an axum [`Router`] backed by any
//! [`admissions_core::store::AdmissionsStore`]. Authentication happens
//! upstream; handlers only read the acting user id from the `x-user-id`
//! header (see [`acting::ActingUser`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", admissions_api::api_router(store.clone()))
//! ```

pub mod acting;
pub mod counselors;
pub mod courses;
pub mod enrollments;
pub mod error;
pub mod kpi;
pub mod students;

use std::sync::Arc;

use admissions_core::store::AdmissionsStore;
use axum::{
  Router,
  routing::{get, patch, put},
};

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: AdmissionsStore + 'static,
{
  Router::new()
    // Students
    .route("/students", get(students::list::<S>).post(students::create::<S>))
    .route("/students/{id}", get(students::get_one::<S>))
    .route("/students/{id}/consulting", put(students::update_consulting::<S>))
    .route("/students/{id}/status-history", get(students::status_history::<S>))
    .route("/students/{id}/consultations", get(students::consultations::<S>))
    .route("/students/{id}/enrollments", get(enrollments::for_student::<S>))
    // Enrollments
    .route(
      "/enrollments/{id}",
      patch(enrollments::update::<S>).delete(enrollments::delete::<S>),
    )
    // Reference data
    .route("/counselors", get(counselors::list::<S>).post(counselors::create::<S>))
    .route("/counselors/{id}/status", patch(counselors::set_status::<S>))
    .route("/courses", get(courses::list::<S>).post(courses::create::<S>))
    // KPI
    .route("/kpi-statistics/overall", get(kpi::overall::<S>))
    .route("/kpi-statistics/counselor", get(kpi::counselor::<S>))
    .route("/kpi-statistics/warnings", get(kpi::warnings::<S>))
    .route("/kpi-statistics/summary", get(kpi::summary::<S>))
    .with_state(store)
}
