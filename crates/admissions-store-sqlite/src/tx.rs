//! [`SqliteTx`], the consulting unit of work over an open rusqlite
//! transaction.

use admissions_core::{
  aggregate::StudentAggregate,
  consultation::{ConsultationSession, NewConsultationSession},
  counselor::Counselor,
  enrollment::{Course, NewEnrollment, NewInterestedCourse},
  history::{NewStatusHistoryEntry, StatusHistoryEntry},
  orchestrator::ConsultingTx,
  student::Student,
};
use rusqlite::Connection;

use crate::{queries, Error, Result};

/// Borrowed view of a connection on which a transaction is already open.
/// Committing or rolling back is the caller's job.
pub struct SqliteTx<'c> {
  conn: &'c Connection,
}

impl<'c> SqliteTx<'c> {
  pub fn new(conn: &'c Connection) -> Self { Self { conn } }
}

impl ConsultingTx for SqliteTx<'_> {
  type Error = Error;

  fn load_aggregate(
    &mut self,
    student_id: i64,
    history_limit: usize,
  ) -> Result<Option<StudentAggregate>> {
    queries::load_aggregate(self.conn, student_id, Some(history_limit))
  }

  fn get_counselor(&mut self, counselor_id: i64) -> Result<Option<Counselor>> {
    queries::get_counselor(self.conn, counselor_id)
  }

  fn find_counselor_by_name(&mut self, fragment: &str) -> Result<Option<Counselor>> {
    queries::find_counselor_by_name(self.conn, fragment)
  }

  fn find_courses_by_name(&mut self, names: &[String]) -> Result<Vec<Course>> {
    queries::find_courses_by_name(self.conn, names)
  }

  fn save_student(&mut self, student: &Student) -> Result<()> {
    queries::update_student(self.conn, student)
  }

  fn append_status_history(&mut self, entry: NewStatusHistoryEntry) -> Result<StatusHistoryEntry> {
    queries::insert_history(self.conn, &entry)
  }

  fn append_consultation(
    &mut self,
    session: NewConsultationSession,
  ) -> Result<ConsultationSession> {
    queries::insert_session(self.conn, &session)
  }

  fn remove_interested_courses(&mut self, student_id: i64, course_ids: &[i64]) -> Result<()> {
    queries::delete_interests(self.conn, student_id, course_ids)
  }

  fn add_interested_courses(&mut self, rows: &[NewInterestedCourse]) -> Result<()> {
    queries::insert_interests(self.conn, rows)
  }

  fn remove_enrollments(&mut self, student_id: i64, course_ids: &[i64]) -> Result<()> {
    queries::delete_enrollments(self.conn, student_id, course_ids)
  }

  fn add_enrollments(&mut self, rows: &[NewEnrollment]) -> Result<()> {
    queries::insert_enrollments(self.conn, rows)
  }
}
