//! Students, the records a counselor works on through the admissions funnel.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::update::StudentUpdate;

// ─── Enums ───────────────────────────────────────────────────────────────────

/// Position of a student in the admissions funnel.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
pub enum StudentStatus {
  Lead,
  Engaging,
  Registered,
  #[serde(rename = "Dropped_Out")]
  #[strum(serialize = "Dropped_Out")]
  DroppedOut,
  Archived,
}

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
pub enum EducationLevel {
  #[serde(rename = "THPT")]
  #[strum(serialize = "THPT")]
  HighSchool,
  #[serde(rename = "SinhVien")]
  #[strum(serialize = "SinhVien")]
  University,
  Other,
}

/// Marketing channel the lead came in through.
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
pub enum LeadSource {
  Mail,
  Fanpage,
  Zalo,
  Website,
  Friend,
  #[serde(rename = "SMS")]
  #[strum(serialize = "SMS")]
  Sms,
  Banderole,
  Poster,
  Brochure,
  Google,
  Brand,
  Event,
  Other,
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
pub enum NotificationConsent {
  #[default]
  Agree,
  Disagree,
  Other,
}

// ─── Student ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
  pub student_id:                             i64,
  pub student_name:                           String,
  pub email:                                  Option<String>,
  pub phone_number:                           String,
  pub zalo_phone:                             Option<String>,
  pub link_facebook:                          Option<String>,
  pub date_of_birth:                          Option<NaiveDate>,
  pub gender:                                 String,
  pub current_education_level:                EducationLevel,
  pub other_education_level_description:      Option<String>,
  pub high_school_name:                       Option<String>,
  pub city:                                   Option<String>,
  pub source:                                 Option<LeadSource>,
  pub other_source_description:               Option<String>,
  pub notification_consent:                   NotificationConsent,
  pub other_notification_consent_description: Option<String>,
  pub current_status:                         StudentStatus,
  /// Moves only when `current_status` moves.
  pub status_change_date:                     Option<DateTime<Utc>>,
  pub registration_date:                      Option<DateTime<Utc>>,
  pub assigned_counselor_id:                  Option<i64>,
  pub created_at:                             DateTime<Utc>,
  pub updated_at:                             DateTime<Utc>,
}

impl Student {
  /// Overwrite every student-row field that is present in `update`.
  ///
  /// Consultation and course fields are ignored; `status_change_date` and
  /// `updated_at` are the caller's responsibility.
  pub fn apply(&mut self, update: &StudentUpdate) {
    fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
      if let Some(v) = value {
        *slot = v.clone();
      }
    }

    set(&mut self.student_name, &update.student_name);
    set(&mut self.email, &update.email);
    set(&mut self.phone_number, &update.phone_number);
    set(&mut self.zalo_phone, &update.zalo_phone);
    set(&mut self.link_facebook, &update.link_facebook);
    set(&mut self.date_of_birth, &update.date_of_birth);
    set(&mut self.gender, &update.gender);
    set(&mut self.current_education_level, &update.current_education_level);
    set(
      &mut self.other_education_level_description,
      &update.other_education_level_description,
    );
    set(&mut self.high_school_name, &update.high_school_name);
    set(&mut self.city, &update.city);
    set(&mut self.source, &update.source);
    set(&mut self.other_source_description, &update.other_source_description);
    set(&mut self.notification_consent, &update.notification_consent);
    set(
      &mut self.other_notification_consent_description,
      &update.other_notification_consent_description,
    );
    set(&mut self.current_status, &update.current_status);
    set(&mut self.registration_date, &update.registration_date);
    if let Some(id) = update.assigned_counselor_id {
      self.assigned_counselor_id = Some(id);
    }
  }
}

// ─── NewStudent ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::AdmissionsStore::add_student`]. Ids and
/// timestamps are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudent {
  pub student_name:            String,
  pub phone_number:            String,
  #[serde(default)]
  pub gender:                  String,
  pub email:                   Option<String>,
  pub zalo_phone:              Option<String>,
  pub link_facebook:           Option<String>,
  pub date_of_birth:           Option<NaiveDate>,
  pub current_education_level: EducationLevel,
  pub high_school_name:        Option<String>,
  pub city:                    Option<String>,
  pub source:                  Option<LeadSource>,
  #[serde(default)]
  pub notification_consent:    NotificationConsent,
  #[serde(default = "default_status")]
  pub current_status:          StudentStatus,
  pub assigned_counselor_id:   Option<i64>,
}

fn default_status() -> StudentStatus { StudentStatus::Lead }

impl NewStudent {
  /// Convenience constructor for a fresh lead with every optional field unset.
  pub fn new(student_name: impl Into<String>, phone_number: impl Into<String>) -> Self {
    Self {
      student_name:            student_name.into(),
      phone_number:            phone_number.into(),
      gender:                  String::new(),
      email:                   None,
      zalo_phone:              None,
      link_facebook:           None,
      date_of_birth:           None,
      current_education_level: EducationLevel::HighSchool,
      high_school_name:        None,
      city:                    None,
      source:                  None,
      notification_consent:    NotificationConsent::default(),
      current_status:          StudentStatus::Lead,
      assigned_counselor_id:   None,
    }
  }
}
