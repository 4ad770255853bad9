//! Consulting record update orchestrator.
//!
//! [`apply_consulting_update`] drives one update cycle against a
//! [`ConsultingTx`]. The backend opens a single transaction, hands it to the
//! orchestrator, and commits only if the orchestrator returns `Ok`; any error
//! leaves nothing behind.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::{
  aggregate::{STATUS_HISTORY_LIMIT, StudentAggregate},
  consultation::{ConsultationInput, ConsultationSession, NewConsultationSession},
  counselor::Counselor,
  diff::{CourseSync, diff},
  enrollment::{Course, NewEnrollment, NewInterestedCourse, PaymentStatus},
  history::{NewStatusHistoryEntry, StatusHistoryEntry},
  student::Student,
  update::StudentUpdate,
  Error,
};

const INTEREST_NOTE: &str = "Updated via consulting information update";
const ENROLLMENT_NOTE: &str = "Enrolled via consulting information update";

// ─── Unit of work ────────────────────────────────────────────────────────────

/// The store operations one update cycle needs, all executed inside the same
/// open transaction.
pub trait ConsultingTx {
  type Error: From<Error>;

  /// Load a student with its relations; `history_limit` caps the ledger rows.
  fn load_aggregate(
    &mut self,
    student_id: i64,
    history_limit: usize,
  ) -> Result<Option<StudentAggregate>, Self::Error>;

  fn get_counselor(&mut self, counselor_id: i64) -> Result<Option<Counselor>, Self::Error>;

  /// First user whose full name contains `fragment`.
  fn find_counselor_by_name(&mut self, fragment: &str) -> Result<Option<Counselor>, Self::Error>;

  /// Courses whose name exactly matches one of `names`; unknown names are
  /// simply absent from the result.
  fn find_courses_by_name(&mut self, names: &[String]) -> Result<Vec<Course>, Self::Error>;

  /// Persist every column of `student`.
  fn save_student(&mut self, student: &Student) -> Result<(), Self::Error>;

  fn append_status_history(
    &mut self,
    entry: NewStatusHistoryEntry,
  ) -> Result<StatusHistoryEntry, Self::Error>;

  fn append_consultation(
    &mut self,
    session: NewConsultationSession,
  ) -> Result<ConsultationSession, Self::Error>;

  fn remove_interested_courses(
    &mut self,
    student_id: i64,
    course_ids: &[i64],
  ) -> Result<(), Self::Error>;

  /// Insert rows, skipping any `(student_id, course_id)` pair already present.
  fn add_interested_courses(&mut self, rows: &[NewInterestedCourse]) -> Result<(), Self::Error>;

  fn remove_enrollments(&mut self, student_id: i64, course_ids: &[i64]) -> Result<(), Self::Error>;

  /// Insert rows, skipping any `(student_id, course_id)` pair already present.
  fn add_enrollments(&mut self, rows: &[NewEnrollment]) -> Result<(), Self::Error>;
}

// ─── Orchestration ───────────────────────────────────────────────────────────

/// Apply `update` to student `student_id` on behalf of `acting_user_id`.
///
/// Returns `Ok(None)` if the student does not exist. When the update implies
/// no change the stored aggregate is returned without any write. Otherwise
/// the acting user must exist.
#[instrument(skip(tx, update, now))]
pub fn apply_consulting_update<T: ConsultingTx>(
  tx: &mut T,
  student_id: i64,
  update: &StudentUpdate,
  acting_user_id: i64,
  now: DateTime<Utc>,
) -> Result<Option<StudentAggregate>, T::Error> {
  let Some(existing) = tx.load_aggregate(student_id, STATUS_HISTORY_LIMIT)? else {
    warn!("student not found");
    return Ok(None);
  };

  let changes = diff(&existing, update);
  if changes.is_noop() {
    debug!("no changes detected; nothing written");
    return Ok(Some(existing));
  }

  if tx.get_counselor(acting_user_id)?.is_none() {
    return Err(Error::ActingUserNotFound(acting_user_id).into());
  }

  if let Some(change) = changes.status_change {
    tx.append_status_history(NewStatusHistoryEntry {
      student_id,
      old_status: Some(change.from),
      new_status: change.to,
      change_date: now,
      changed_by_user_id: acting_user_id,
      notes: Some(format!("Status changed from {} to {}", change.from, change.to)),
    })?;
  }

  if changes.has_student_changes() {
    if let Some(counselor_id) = changes.student.assigned_counselor_id {
      if tx.get_counselor(counselor_id)?.is_none() {
        return Err(Error::CounselorNotFound(counselor_id).into());
      }
    }

    let mut student = existing.student.clone();
    student.apply(&changes.student);
    if changes.status_changed() {
      student.status_change_date = Some(now);
    }
    student.updated_at = now;
    tx.save_student(&student)?;
  }

  let mut session_id = None;
  if let Some(input) = &changes.consultation {
    let counselor_id =
      resolve_counselor(tx, Some(input), update, &existing.student, acting_user_id)?;
    let session = tx.append_consultation(input.to_new_session(student_id, counselor_id, now))?;
    session_id = Some(session.session_id);
  }

  let interest_sync = match &changes.interested_courses {
    Some(names) => plan_course_sync(tx, names, &existing.interested_course_ids())?,
    None => None,
  };
  if let Some(sync) = interest_sync {
    tx.remove_interested_courses(student_id, &sync.remove)?;
    let rows: Vec<NewInterestedCourse> = sync
      .add
      .iter()
      .map(|&course_id| NewInterestedCourse {
        student_id,
        course_id,
        interest_date: now,
        notes: Some(INTEREST_NOTE.to_owned()),
      })
      .collect();
    tx.add_interested_courses(&rows)?;
  }

  let enrollment_sync = match &changes.enrolled_courses {
    Some(names) => plan_course_sync(tx, names, &existing.enrolled_course_ids())?,
    None => None,
  };
  if let Some(sync) = enrollment_sync {
    tx.remove_enrollments(student_id, &sync.remove)?;
    if !sync.add.is_empty() {
      let counselor_id = resolve_counselor(
        tx,
        changes.consultation.as_ref(),
        update,
        &existing.student,
        acting_user_id,
      )?;
      let rows: Vec<NewEnrollment> = sync
        .add
        .iter()
        .map(|&course_id| NewEnrollment {
          student_id,
          course_id,
          enrollment_date: now,
          fee_paid: 0.0,
          payment_status: PaymentStatus::Pending,
          counselor_id,
          consultation_session_id: session_id,
          notes: Some(ENROLLMENT_NOTE.to_owned()),
        })
        .collect();
      tx.add_enrollments(&rows)?;
    }
  }

  info!("consulting information updated");
  tx.load_aggregate(student_id, STATUS_HISTORY_LIMIT)
}

/// Effective counselor for rows created by this update: a counselor found by
/// the supplied name, then the payload's assignment, then the stored
/// assignment, then the acting user.
fn resolve_counselor<T: ConsultingTx>(
  tx: &mut T,
  consultation: Option<&ConsultationInput>,
  update: &StudentUpdate,
  existing: &Student,
  acting_user_id: i64,
) -> Result<i64, T::Error> {
  if let Some(fragment) = consultation.and_then(ConsultationInput::counselor_name_fragment) {
    match tx.find_counselor_by_name(fragment)? {
      Some(counselor) => return Ok(counselor.counselor_id),
      None => warn!(name = fragment, "no counselor matches name; falling back"),
    }
  }

  Ok(
    update
      .assigned_counselor_id
      .or(existing.assigned_counselor_id)
      .unwrap_or(acting_user_id),
  )
}

/// Work out which course rows to delete and insert.
///
/// A list with no usable names clears every row. Otherwise names are resolved
/// to ids; unknown names are logged and skipped, and if nothing resolves the
/// rows are left alone (`None`).
fn plan_course_sync<T: ConsultingTx>(
  tx: &mut T,
  names: &[String],
  current: &[i64],
) -> Result<Option<CourseSync>, T::Error> {
  let wanted: Vec<String> = names
    .iter()
    .map(|n| n.trim())
    .filter(|n| !n.is_empty())
    .map(str::to_owned)
    .collect();

  if wanted.is_empty() {
    return Ok(Some(CourseSync::clear(current)));
  }

  let found = tx.find_courses_by_name(&wanted)?;
  let missing: Vec<&str> = wanted
    .iter()
    .filter(|name| !found.iter().any(|c| &c.name == *name))
    .map(String::as_str)
    .collect();
  if !missing.is_empty() {
    warn!(?missing, "course names not found; skipping");
  }

  if found.is_empty() {
    return Ok(None);
  }

  let desired: Vec<i64> = found.iter().map(|c| c.course_id).collect();
  Ok(Some(CourseSync::between(&desired, current)))
}
