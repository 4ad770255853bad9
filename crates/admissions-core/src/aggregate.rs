//! The student aggregate: the read view returned after every update.

use serde::{Deserialize, Serialize};

use crate::{
  consultation::ConsultationSession,
  enrollment::{Enrollment, InterestedCourse},
  history::StatusHistoryEntry,
  student::Student,
};

/// How many ledger entries the aggregate carries, newest first.
pub const STATUS_HISTORY_LIMIT: usize = 5;

/// A student joined with its latest consultation, all enrollments, all
/// interested courses and recent status history. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentAggregate {
  pub student:             Student,
  pub latest_consultation: Option<ConsultationSession>,
  pub enrollments:         Vec<Enrollment>,
  pub interested_courses:  Vec<InterestedCourse>,
  /// At most [`STATUS_HISTORY_LIMIT`] entries, newest first.
  pub status_history:      Vec<StatusHistoryEntry>,
}

impl StudentAggregate {
  pub fn enrolled_course_ids(&self) -> Vec<i64> {
    self.enrollments.iter().map(|e| e.course_id).collect()
  }

  pub fn interested_course_ids(&self) -> Vec<i64> {
    self.interested_courses.iter().map(|c| c.course_id).collect()
  }
}
