//! Handlers for `/students` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/students` | `?page&limit&counselorId`; rows plus page metadata |
//! | `POST` | `/students` | Body: [`NewStudent`] |
//! | `GET`  | `/students/:id` | Aggregate; 404 if not found |
//! | `PUT`  | `/students/:id/consulting` | Partial update; requires `x-user-id` |
//! | `GET`  | `/students/:id/status-history` | Full ledger, newest first; 404 if not found |
//! | `GET`  | `/students/:id/consultations` | All sessions, newest first; 404 if not found |

use std::sync::Arc;

use admissions_core::{
  aggregate::StudentAggregate,
  consultation::ConsultationSession,
  history::StatusHistoryEntry,
  page::{Page, PageRequest},
  store::AdmissionsStore,
  student::{NewStudent, Student},
  update::StudentUpdate,
};
use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;

use crate::{acting::ActingUser, error::ApiError};

/// Separator used by older clients that send course lists as one string.
const LEGACY_COURSE_SEPARATOR: &str = "___";

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub page:         Option<u32>,
  pub limit:        Option<u32>,
  pub counselor_id: Option<i64>,
}

/// `GET /students`
pub async fn list<S: AdmissionsStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<Student>>, ApiError> {
  let page = PageRequest::new(params.page, params.limit);
  let students = store
    .list_students(params.counselor_id, page)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(students))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /students`
pub async fn create<S: AdmissionsStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewStudent>,
) -> Result<impl IntoResponse, ApiError> {
  let student: Student = store.add_student(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(student)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /students/:id`
pub async fn get_one<S: AdmissionsStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<StudentAggregate>, ApiError> {
  let aggregate = store
    .get_aggregate(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("student {id} not found")))?;
  Ok(Json(aggregate))
}

// ─── Consulting update ───────────────────────────────────────────────────────

/// A course list as sent by clients: either a JSON array or a single
/// `"A___B"` string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CourseList {
  Names(Vec<String>),
  Joined(String),
}

impl CourseList {
  pub fn into_names(self) -> Vec<String> {
    match self {
      Self::Names(names) => names,
      Self::Joined(joined) => joined
        .split(LEGACY_COURSE_SEPARATOR)
        .map(str::to_owned)
        .collect(),
    }
  }
}

/// Body of `PUT /students/:id/consulting`.
#[derive(Debug, Deserialize)]
pub struct ConsultingBody {
  #[serde(flatten)]
  pub update:             StudentUpdate,
  pub interested_courses: Option<CourseList>,
  pub enrolled_courses:   Option<CourseList>,
}

impl ConsultingBody {
  pub fn into_update(self) -> StudentUpdate {
    StudentUpdate {
      interested_courses: self.interested_courses.map(CourseList::into_names),
      enrolled_courses: self.enrolled_courses.map(CourseList::into_names),
      ..self.update
    }
  }
}

/// `PUT /students/:id/consulting`
pub async fn update_consulting<S: AdmissionsStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
  ActingUser(user_id): ActingUser,
  Json(body): Json<ConsultingBody>,
) -> Result<Json<StudentAggregate>, ApiError> {
  let aggregate = store
    .update_consulting_information(id, body.into_update(), user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("student {id} not found")))?;
  Ok(Json(aggregate))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /students/:id/status-history`
pub async fn status_history<S: AdmissionsStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Vec<StatusHistoryEntry>>, ApiError> {
  let entries = store
    .status_history(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("student {id} not found")))?;
  Ok(Json(entries))
}

/// `GET /students/:id/consultations`
pub async fn consultations<S: AdmissionsStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Vec<ConsultationSession>>, ApiError> {
  let sessions = store
    .consultation_sessions(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("student {id} not found")))?;
  Ok(Json(sessions))
}
