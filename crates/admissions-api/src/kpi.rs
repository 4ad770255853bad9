//! Handlers for `/kpi-statistics` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/kpi-statistics/overall` | `?startDate&endDate` |
//! | `GET` | `/kpi-statistics/counselor` | `?counselorId`, else the acting user |
//! | `GET` | `/kpi-statistics/warnings` | Active counselors below target |
//! | `GET` | `/kpi-statistics/summary` | Current month for the acting user |
//!
//! Dates are `YYYY-MM-DD`; when either is missing the current month is used.

use std::sync::Arc;

use admissions_core::{
  kpi::{self, KpiEngine, KpiSummary, KpiWarning, Statistics},
  store::AdmissionsStore,
};
use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{acting::ActingUser, error::ApiError};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodParams {
  pub start_date:   Option<NaiveDate>,
  pub end_date:     Option<NaiveDate>,
  pub counselor_id: Option<i64>,
}

/// `GET /kpi-statistics/overall`
pub async fn overall<S: AdmissionsStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<PeriodParams>,
) -> Result<Json<Statistics>, ApiError> {
  let stats = KpiEngine::new(store.as_ref())
    .overall(params.start_date, params.end_date)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(stats))
}

/// `GET /kpi-statistics/counselor`
pub async fn counselor<S: AdmissionsStore>(
  State(store): State<Arc<S>>,
  ActingUser(user_id): ActingUser,
  Query(params): Query<PeriodParams>,
) -> Result<Json<Statistics>, ApiError> {
  let counselor_id = params.counselor_id.unwrap_or(user_id);
  let stats = kpi::calculate(
    store.as_ref(),
    Some(counselor_id),
    params.start_date,
    params.end_date,
  )
  .await
  .map_err(ApiError::store)?;
  Ok(Json(stats))
}

/// `GET /kpi-statistics/warnings`
pub async fn warnings<S: AdmissionsStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<PeriodParams>,
) -> Result<Json<Vec<KpiWarning>>, ApiError> {
  let warnings = kpi::warnings(store.as_ref(), params.start_date, params.end_date)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(warnings))
}

/// `GET /kpi-statistics/summary`
pub async fn summary<S: AdmissionsStore>(
  State(store): State<Arc<S>>,
  ActingUser(user_id): ActingUser,
) -> Result<Json<KpiSummary>, ApiError> {
  let summary = KpiEngine::new(store.as_ref())
    .summary(Some(user_id))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(summary))
}
