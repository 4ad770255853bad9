//! Status history ledger: one immutable row per funnel transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::student::StudentStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
  pub entry_id:           i64,
  pub student_id:         i64,
  pub old_status:         Option<StudentStatus>,
  pub new_status:         StudentStatus,
  pub change_date:        DateTime<Utc>,
  pub changed_by_user_id: i64,
  pub notes:              Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewStatusHistoryEntry {
  pub student_id:         i64,
  pub old_status:         Option<StudentStatus>,
  pub new_status:         StudentStatus,
  pub change_date:        DateTime<Utc>,
  pub changed_by_user_id: i64,
  pub notes:              Option<String>,
}
