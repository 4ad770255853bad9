//! Handlers for enrollment payment records.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/students/:id/enrollments` | 404 if the student is missing |
//! | `PATCH`  | `/enrollments/:id` | Body: [`EnrollmentPatch`] |
//! | `DELETE` | `/enrollments/:id` | 204 on success |

use std::sync::Arc;

use admissions_core::{
  enrollment::{Enrollment, EnrollmentPatch},
  store::AdmissionsStore,
};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};

use crate::error::ApiError;

/// `GET /students/:id/enrollments`
pub async fn for_student<S: AdmissionsStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Vec<Enrollment>>, ApiError> {
  let enrollments = store
    .student_enrollments(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("student {id} not found")))?;
  Ok(Json(enrollments))
}

/// `PATCH /enrollments/:id`
pub async fn update<S: AdmissionsStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
  Json(patch): Json<EnrollmentPatch>,
) -> Result<Json<Enrollment>, ApiError> {
  if !patch.has_valid_fee() {
    return Err(ApiError::BadRequest("fee_paid must be a non-negative amount".into()));
  }
  let enrollment = store
    .update_enrollment(id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("enrollment {id} not found")))?;
  Ok(Json(enrollment))
}

/// `DELETE /enrollments/:id`
pub async fn delete<S: AdmissionsStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
  if store.delete_enrollment(id).await.map_err(ApiError::store)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("enrollment {id} not found")))
  }
}
