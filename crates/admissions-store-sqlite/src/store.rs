//! [`SqliteStore`], the SQLite implementation of [`AdmissionsStore`].

use std::path::Path;

use admissions_core::{
  aggregate::StudentAggregate,
  consultation::ConsultationSession,
  counselor::{AccountStatus, Counselor, NewCounselor},
  enrollment::{Course, Enrollment, EnrollmentPatch, NewCourse},
  history::StatusHistoryEntry,
  orchestrator::apply_consulting_update,
  page::{Page, PageRequest},
  store::{AdmissionsStore, EnrollmentQuery, EnrollmentRecord, KpiSource, StudentQuery},
  student::{NewStudent, Student},
  update::StudentUpdate,
};
use chrono::Utc;
use tracing::{debug, info};

use crate::{queries, schema::SCHEMA, tx::SqliteTx, Error, Result};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An admissions store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    debug!("schema initialised");
    Ok(())
  }

  /// Run `f` on the connection thread, surfacing its own error unchanged.
  async fn with_conn<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut rusqlite::Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }
}

// ─── KpiSource impl ──────────────────────────────────────────────────────────

impl KpiSource for SqliteStore {
  type Error = Error;

  async fn get_counselor(&self, counselor_id: i64) -> Result<Option<Counselor>> {
    self
      .with_conn(move |conn| queries::get_counselor(conn, counselor_id))
      .await
  }

  async fn list_counselors(&self) -> Result<Vec<Counselor>> {
    self.with_conn(|conn| queries::list_counselors(conn)).await
  }

  async fn count_students(&self, query: &StudentQuery) -> Result<u64> {
    let query = query.clone();
    self
      .with_conn(move |conn| queries::count_students(conn, &query))
      .await
  }

  async fn list_enrollments(&self, query: &EnrollmentQuery) -> Result<Vec<EnrollmentRecord>> {
    let query = query.clone();
    self
      .with_conn(move |conn| queries::enrollment_records(conn, &query))
      .await
  }
}

// ─── AdmissionsStore impl ────────────────────────────────────────────────────

impl AdmissionsStore for SqliteStore {
  // ── Reference data ────────────────────────────────────────────────────────

  async fn add_counselor(&self, input: NewCounselor) -> Result<Counselor> {
    self
      .with_conn(move |conn| queries::insert_counselor(conn, &input))
      .await
  }

  async fn add_course(&self, input: NewCourse) -> Result<Course> {
    self
      .with_conn(move |conn| queries::insert_course(conn, &input))
      .await
  }

  async fn list_courses(&self) -> Result<Vec<Course>> {
    self.with_conn(|conn| queries::list_courses(conn)).await
  }

  // ── Students ──────────────────────────────────────────────────────────────

  async fn add_student(&self, input: NewStudent) -> Result<Student> {
    let now = Utc::now();
    let student = self
      .with_conn(move |conn| {
        let id = queries::insert_student(conn, &input, now)?;
        queries::get_student(conn, id)?
          .ok_or(admissions_core::Error::StudentNotFound(id).into())
      })
      .await?;
    info!(student_id = student.student_id, "student created");
    Ok(student)
  }

  async fn get_aggregate(&self, student_id: i64) -> Result<Option<StudentAggregate>> {
    self
      .with_conn(move |conn| {
        queries::load_aggregate(
          conn,
          student_id,
          Some(admissions_core::aggregate::STATUS_HISTORY_LIMIT),
        )
      })
      .await
  }

  async fn update_consulting_information(
    &self,
    student_id: i64,
    update: StudentUpdate,
    acting_user_id: i64,
  ) -> Result<Option<StudentAggregate>> {
    let now = Utc::now();
    self
      .with_conn(move |conn| {
        // Dropping `tx` without commit rolls back every staged write.
        let tx = conn.transaction()?;
        let aggregate = apply_consulting_update(
          &mut SqliteTx::new(&tx),
          student_id,
          &update,
          acting_user_id,
          now,
        )?;
        tx.commit()?;
        Ok(aggregate)
      })
      .await
  }

  async fn list_students(
    &self,
    counselor_id: Option<i64>,
    page: PageRequest,
  ) -> Result<Page<Student>> {
    self
      .with_conn(move |conn| queries::list_students(conn, counselor_id, page))
      .await
  }

  async fn status_history(&self, student_id: i64) -> Result<Option<Vec<StatusHistoryEntry>>> {
    self
      .with_conn(move |conn| {
        if queries::get_student(conn, student_id)?.is_none() {
          return Ok(None);
        }
        queries::status_history(conn, student_id, None).map(Some)
      })
      .await
  }

  async fn consultation_sessions(
    &self,
    student_id: i64,
  ) -> Result<Option<Vec<ConsultationSession>>> {
    self
      .with_conn(move |conn| {
        if queries::get_student(conn, student_id)?.is_none() {
          return Ok(None);
        }
        queries::sessions(conn, student_id).map(Some)
      })
      .await
  }

  // ── Counselors ────────────────────────────────────────────────────────────

  async fn set_counselor_status(
    &self,
    counselor_id: i64,
    status: AccountStatus,
  ) -> Result<Option<Counselor>> {
    let counselor = self
      .with_conn(move |conn| {
        if !queries::set_counselor_status(conn, counselor_id, status)? {
          return Ok(None);
        }
        queries::get_counselor(conn, counselor_id)
      })
      .await?;
    if counselor.is_some() {
      info!(counselor_id, ?status, "counselor status changed");
    }
    Ok(counselor)
  }

  // ── Enrollments ───────────────────────────────────────────────────────────

  async fn student_enrollments(&self, student_id: i64) -> Result<Option<Vec<Enrollment>>> {
    self
      .with_conn(move |conn| {
        if queries::get_student(conn, student_id)?.is_none() {
          return Ok(None);
        }
        queries::enrollments(conn, student_id).map(Some)
      })
      .await
  }

  async fn update_enrollment(
    &self,
    enrollment_id: i64,
    patch: EnrollmentPatch,
  ) -> Result<Option<Enrollment>> {
    let enrollment = self
      .with_conn(move |conn| queries::update_enrollment(conn, enrollment_id, &patch))
      .await?;
    if let Some(e) = &enrollment {
      info!(
        enrollment_id,
        fee_paid = e.fee_paid,
        payment_status = ?e.payment_status,
        "enrollment payment updated"
      );
    }
    Ok(enrollment)
  }

  async fn delete_enrollment(&self, enrollment_id: i64) -> Result<bool> {
    let deleted = self
      .with_conn(move |conn| queries::delete_enrollment(conn, enrollment_id))
      .await?;
    if deleted {
      info!(enrollment_id, "enrollment deleted");
    }
    Ok(deleted)
  }
}
