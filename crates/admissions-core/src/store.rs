//! The `AdmissionsStore` and `KpiSource` traits and supporting query types.
//!
//! Storage backends (e.g. `admissions-store-sqlite`) implement both. The KPI
//! engine depends only on [`KpiSource`]; the HTTP layer on
//! [`AdmissionsStore`].

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  aggregate::StudentAggregate,
  consultation::ConsultationSession,
  counselor::{AccountStatus, Counselor, NewCounselor, ProgramType},
  enrollment::{Course, Enrollment, EnrollmentPatch, NewCourse},
  error::Classify,
  history::StatusHistoryEntry,
  page::{Page, PageRequest},
  student::{NewStudent, Student, StudentStatus},
  update::StudentUpdate,
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Half-open instant range `[from, until)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
  pub from:  DateTime<Utc>,
  pub until: DateTime<Utc>,
}

impl TimeRange {
  pub fn contains(&self, instant: DateTime<Utc>) -> bool {
    self.from <= instant && instant < self.until
  }
}

/// Parameters for [`KpiSource::count_students`]. Every filter is optional;
/// an empty `statuses` list matches any status.
#[derive(Debug, Clone, Default)]
pub struct StudentQuery {
  pub assigned_counselor_id:  Option<i64>,
  pub statuses:               Vec<StudentStatus>,
  pub created_between:        Option<TimeRange>,
  pub status_changed_between: Option<TimeRange>,
}

impl StudentQuery {
  /// Whether `student` passes every filter.
  pub fn matches(&self, student: &Student) -> bool {
    self
      .assigned_counselor_id
      .is_none_or(|id| student.assigned_counselor_id == Some(id))
      && (self.statuses.is_empty() || self.statuses.contains(&student.current_status))
      && self
        .created_between
        .is_none_or(|r| r.contains(student.created_at))
      && self
        .status_changed_between
        .is_none_or(|r| student.status_change_date.is_some_and(|d| r.contains(d)))
  }
}

/// Parameters for [`KpiSource::list_enrollments`].
#[derive(Debug, Clone, Default)]
pub struct EnrollmentQuery {
  pub counselor_id:     Option<i64>,
  pub enrolled_between: Option<TimeRange>,
}

/// The slice of an enrollment the KPI engine reads, joined with the enrolling
/// counselor's program type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrollmentRecord {
  pub student_id:             i64,
  pub counselor_id:           i64,
  pub fee_paid:               f64,
  pub counselor_program_type: Option<ProgramType>,
  pub enrollment_date:        DateTime<Utc>,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Read-only queries the KPI engine aggregates over.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait KpiSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static + From<crate::Error> + Classify;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_counselor(
    &self,
    counselor_id: i64,
  ) -> impl Future<Output = Result<Option<Counselor>, Self::Error>> + Send + '_;

  /// All users, ordered by id.
  fn list_counselors(
    &self,
  ) -> impl Future<Output = Result<Vec<Counselor>, Self::Error>> + Send + '_;

  fn count_students<'a>(
    &'a self,
    query: &'a StudentQuery,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  fn list_enrollments<'a>(
    &'a self,
    query: &'a EnrollmentQuery,
  ) -> impl Future<Output = Result<Vec<EnrollmentRecord>, Self::Error>> + Send + 'a;
}

/// Abstraction over an admissions store backend.
///
/// Status history and consultation sessions are append-only. Every write made
/// by [`update_consulting_information`](Self::update_consulting_information)
/// happens in one transaction.
pub trait AdmissionsStore: KpiSource {
  // ── Reference data ────────────────────────────────────────────────────

  fn add_counselor(
    &self,
    input: NewCounselor,
  ) -> impl Future<Output = Result<Counselor, Self::Error>> + Send + '_;

  fn add_course(
    &self,
    input: NewCourse,
  ) -> impl Future<Output = Result<Course, Self::Error>> + Send + '_;

  /// All courses, ordered by name.
  fn list_courses(&self) -> impl Future<Output = Result<Vec<Course>, Self::Error>> + Send + '_;

  // ── Students ──────────────────────────────────────────────────────────

  /// Persist a new student. `created_at`, `updated_at` and
  /// `status_change_date` are set to now by the store.
  fn add_student(
    &self,
    input: NewStudent,
  ) -> impl Future<Output = Result<Student, Self::Error>> + Send + '_;

  /// Materialise the [`StudentAggregate`]. Returns `None` if the student
  /// does not exist.
  fn get_aggregate(
    &self,
    student_id: i64,
  ) -> impl Future<Output = Result<Option<StudentAggregate>, Self::Error>> + Send + '_;

  /// Run the consulting update orchestrator for `student_id` on behalf of
  /// `acting_user_id`, atomically. Returns `None` if the student does not
  /// exist; an unknown acting user is [`crate::Error::ActingUserNotFound`].
  fn update_consulting_information(
    &self,
    student_id: i64,
    update: StudentUpdate,
    acting_user_id: i64,
  ) -> impl Future<Output = Result<Option<StudentAggregate>, Self::Error>> + Send + '_;

  /// One page of students ordered by id, optionally limited to those
  /// assigned to `counselor_id`.
  fn list_students(
    &self,
    counselor_id: Option<i64>,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<Student>, Self::Error>> + Send + '_;

  /// The full status ledger for a student, newest first. Returns `None` if
  /// the student does not exist.
  fn status_history(
    &self,
    student_id: i64,
  ) -> impl Future<Output = Result<Option<Vec<StatusHistoryEntry>>, Self::Error>> + Send + '_;

  /// Every consultation session for a student, newest first. Returns `None`
  /// if the student does not exist.
  fn consultation_sessions(
    &self,
    student_id: i64,
  ) -> impl Future<Output = Result<Option<Vec<ConsultationSession>>, Self::Error>> + Send + '_;

  // ── Counselors ────────────────────────────────────────────────────────

  /// Activate or deactivate a user. Returns `None` if the user does not
  /// exist.
  fn set_counselor_status(
    &self,
    counselor_id: i64,
    status: AccountStatus,
  ) -> impl Future<Output = Result<Option<Counselor>, Self::Error>> + Send + '_;

  // ── Enrollments ───────────────────────────────────────────────────────

  /// A student's enrollments, ordered by id. Returns `None` if the student
  /// does not exist.
  fn student_enrollments(
    &self,
    student_id: i64,
  ) -> impl Future<Output = Result<Option<Vec<Enrollment>>, Self::Error>> + Send + '_;

  /// Record payment details on an enrollment. Absent fields keep their
  /// stored values. Returns `None` if the enrollment does not exist.
  fn update_enrollment(
    &self,
    enrollment_id: i64,
    patch: EnrollmentPatch,
  ) -> impl Future<Output = Result<Option<Enrollment>, Self::Error>> + Send + '_;

  /// Returns `false` if the enrollment does not exist.
  fn delete_enrollment(
    &self,
    enrollment_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
