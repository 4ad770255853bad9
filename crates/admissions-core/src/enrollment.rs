//! Courses, enrollments and interested-course rows.
//!
//! Enrollment and interest rows are unique per `(student_id, course_id)`;
//! both are reconciled against a desired course set. Only an enrollment's
//! payment fields are edited in place, through [`EnrollmentPatch`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::counselor::ProgramType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
  pub course_id:    i64,
  pub name:         String,
  pub description:  Option<String>,
  pub program_type: Option<ProgramType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourse {
  pub name:         String,
  pub description:  Option<String>,
  pub program_type: Option<ProgramType>,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
pub enum PaymentStatus {
  #[default]
  Pending,
  Paid,
  #[serde(rename = "Partially_Paid")]
  #[strum(serialize = "Partially_Paid")]
  PartiallyPaid,
  Refunded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
  pub enrollment_id:           i64,
  pub student_id:              i64,
  pub course_id:               i64,
  /// Denormalised from `courses` for read views.
  pub course_name:             String,
  pub enrollment_date:         DateTime<Utc>,
  pub fee_paid:                f64,
  pub payment_status:          PaymentStatus,
  pub counselor_id:            i64,
  pub consultation_session_id: Option<i64>,
  pub notes:                   Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEnrollment {
  pub student_id:              i64,
  pub course_id:               i64,
  pub enrollment_date:         DateTime<Utc>,
  pub fee_paid:                f64,
  pub payment_status:          PaymentStatus,
  pub counselor_id:            i64,
  pub consultation_session_id: Option<i64>,
  pub notes:                   Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestedCourse {
  pub interest_id:   i64,
  pub student_id:    i64,
  pub course_id:     i64,
  pub course_name:   String,
  pub interest_date: DateTime<Utc>,
  pub notes:         Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInterestedCourse {
  pub student_id:    i64,
  pub course_id:     i64,
  pub interest_date: DateTime<Utc>,
  pub notes:         Option<String>,
}

// ─── Patch ───────────────────────────────────────────────────────────────────

/// Payment-side edits to an existing enrollment. Absent fields are kept;
/// `notes: null` clears the note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub fee_paid:       Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub payment_status: Option<PaymentStatus>,
  #[serde(
    default,
    deserialize_with = "crate::update::present",
    skip_serializing_if = "Option::is_none"
  )]
  pub notes:          Option<Option<String>>,
}

impl EnrollmentPatch {
  /// A fee must be a finite, non-negative amount.
  pub fn has_valid_fee(&self) -> bool {
    self.fee_paid.is_none_or(|fee| fee.is_finite() && fee >= 0.0)
  }

  pub fn apply(&self, enrollment: &mut Enrollment) {
    if let Some(fee) = self.fee_paid {
      enrollment.fee_paid = fee;
    }
    if let Some(status) = self.payment_status {
      enrollment.payment_status = status;
    }
    if let Some(notes) = &self.notes {
      enrollment.notes = notes.clone();
    }
  }
}
