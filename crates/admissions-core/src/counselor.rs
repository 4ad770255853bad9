//! Counselors and other staff accounts. Read-only for the consulting core.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserType {
  Admin,
  Counselor,
  Manager,
}

/// The training programme a counselor sells; drives the KPI target.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
pub enum ProgramType {
  Aptech,
  Arena,
  #[serde(rename = "Short_term_Steam")]
  #[strum(serialize = "Short_term_Steam")]
  ShortTermSteam,
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AccountStatus {
  #[default]
  Active,
  Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counselor {
  pub counselor_id: i64,
  pub full_name:    String,
  pub user_type:    UserType,
  pub program_type: Option<ProgramType>,
  pub status:       AccountStatus,
}

impl Counselor {
  /// Active accounts of type `counselor` are the ones KPI warnings cover.
  pub fn is_active_counselor(&self) -> bool {
    self.user_type == UserType::Counselor && self.status == AccountStatus::Active
  }
}

/// Input to [`crate::store::AdmissionsStore::add_counselor`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCounselor {
  pub full_name:    String,
  pub user_type:    UserType,
  pub program_type: Option<ProgramType>,
  #[serde(default)]
  pub status:       AccountStatus,
}
