//! Handlers for `/courses` endpoints.

use std::sync::Arc;

use admissions_core::{
  enrollment::{Course, NewCourse},
  store::AdmissionsStore,
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::error::ApiError;

/// `GET /courses`
pub async fn list<S: AdmissionsStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Course>>, ApiError> {
  let courses = store.list_courses().await.map_err(ApiError::store)?;
  Ok(Json(courses))
}

/// `POST /courses`. Names are unique; a duplicate yields 409.
pub async fn create<S: AdmissionsStore>(
  State(store): State<Arc<S>>,
  Json(mut body): Json<NewCourse>,
) -> Result<impl IntoResponse, ApiError> {
  body.name = body.name.trim().to_owned();
  if body.name.is_empty() {
    return Err(ApiError::BadRequest("course name must not be empty".into()));
  }
  let course = store.add_course(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(course)))
}
