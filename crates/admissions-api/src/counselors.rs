//! Handlers for `/counselors` endpoints.

use std::sync::Arc;

use admissions_core::{
  counselor::{AccountStatus, Counselor, NewCounselor},
  store::AdmissionsStore,
};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;

use crate::error::ApiError;

/// `GET /counselors`
pub async fn list<S: AdmissionsStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Counselor>>, ApiError> {
  let counselors = store.list_counselors().await.map_err(ApiError::store)?;
  Ok(Json(counselors))
}

/// `POST /counselors`
pub async fn create<S: AdmissionsStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewCounselor>,
) -> Result<impl IntoResponse, ApiError> {
  if body.full_name.trim().is_empty() {
    return Err(ApiError::BadRequest("full_name must not be empty".into()));
  }
  let counselor = store.add_counselor(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(counselor)))
}

/// Body of `PATCH /counselors/:id/status`.
#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: AccountStatus,
}

/// `PATCH /counselors/:id/status`
///
/// Inactive counselors drop out of KPI warnings.
pub async fn set_status<S: AdmissionsStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Counselor>, ApiError> {
  let counselor = store
    .set_counselor_status(id, body.status)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("counselor {id} not found")))?;
  Ok(Json(counselor))
}
