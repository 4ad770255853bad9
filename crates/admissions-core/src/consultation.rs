//! Consultation sessions.
//!
//! Sessions are append-only: every update cycle that touches a "last
//! consultation" field records a new row. The latest row by `session_date` is
//! the one surfaced on the student aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

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
pub enum SessionType {
  #[default]
  #[serde(rename = "Phone_Call")]
  #[strum(serialize = "Phone_Call")]
  PhoneCall,
  #[serde(rename = "Online_Meeting")]
  #[strum(serialize = "Online_Meeting")]
  OnlineMeeting,
  #[serde(rename = "In_Person")]
  #[strum(serialize = "In_Person")]
  InPerson,
  Email,
  Chat,
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
pub enum SessionStatus {
  #[default]
  Scheduled,
  Completed,
  Canceled,
  #[serde(rename = "No_Show")]
  #[strum(serialize = "No_Show")]
  NoShow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationSession {
  pub session_id:       i64,
  pub student_id:       i64,
  pub counselor_id:     i64,
  pub session_date:     DateTime<Utc>,
  pub duration_minutes: Option<i32>,
  pub session_type:     SessionType,
  pub session_status:   SessionStatus,
  pub notes:            String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewConsultationSession {
  pub student_id:       i64,
  pub counselor_id:     i64,
  pub session_date:     DateTime<Utc>,
  pub duration_minutes: Option<i32>,
  pub session_type:     SessionType,
  pub session_status:   SessionStatus,
  pub notes:            String,
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// The consultation fields carried by one update, with explicit nulls already
/// folded into "not supplied".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsultationInput {
  pub session_date:     Option<DateTime<Utc>>,
  pub duration_minutes: Option<i32>,
  pub notes:            Option<String>,
  pub session_type:     Option<SessionType>,
  pub session_status:   Option<SessionStatus>,
  /// Display name of the counselor who ran the session, possibly suffixed
  /// with a parenthesised role, e.g. `"Nguyen Van A (counselor)"`.
  pub counselor_name:   Option<String>,
}

impl ConsultationInput {
  /// Build the row to append, filling every unsupplied field with its default.
  pub fn to_new_session(
    &self,
    student_id: i64,
    counselor_id: i64,
    now: DateTime<Utc>,
  ) -> NewConsultationSession {
    NewConsultationSession {
      student_id,
      counselor_id,
      session_date:     self.session_date.unwrap_or(now),
      duration_minutes: self.duration_minutes,
      session_type:     self.session_type.unwrap_or_default(),
      session_status:   self.session_status.unwrap_or_default(),
      notes:            self.notes.clone().unwrap_or_default(),
    }
  }

  /// The name fragment used for counselor lookup: everything before the
  /// first `(`, trimmed. `None` when nothing usable remains.
  pub fn counselor_name_fragment(&self) -> Option<&str> {
    let name = self.counselor_name.as_deref()?;
    let fragment = name.split('(').next().unwrap_or_default().trim();
    (!fragment.is_empty()).then_some(fragment)
  }
}
