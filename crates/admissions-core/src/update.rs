//! The partial update payload accepted by the consulting orchestrator.
//!
//! Every field is optional. Nullable columns use `Option<Option<T>>` so that
//! "absent" (`None`) and "explicitly cleared" (`Some(None)`) stay distinct
//! after deserialisation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
  consultation::{ConsultationInput, SessionStatus, SessionType},
  student::{EducationLevel, LeadSource, NotificationConsent, StudentStatus},
};

/// Deserialise a present field (including `null`) as `Some(..)`; combined with
/// `#[serde(default)]` an absent field stays `None`.
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentUpdate {
  // ── Student row ─────────────────────────────────────────────────────────
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub student_name: Option<String>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub email: Option<Option<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phone_number: Option<String>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub zalo_phone: Option<Option<String>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub link_facebook: Option<Option<String>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub date_of_birth: Option<Option<NaiveDate>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub gender: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub current_education_level: Option<EducationLevel>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub other_education_level_description: Option<Option<String>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub high_school_name: Option<Option<String>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub city: Option<Option<String>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub source: Option<Option<LeadSource>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub other_source_description: Option<Option<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notification_consent: Option<NotificationConsent>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub other_notification_consent_description: Option<Option<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub current_status: Option<StudentStatus>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub registration_date: Option<Option<DateTime<Utc>>>,
  /// Overwrites the assignment whenever present.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub assigned_counselor_id: Option<i64>,

  // ── Last consultation ───────────────────────────────────────────────────
  // Presence of any of these, even as `null`, appends a new session.
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub last_consultation_date: Option<Option<DateTime<Utc>>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub last_consultation_duration_minutes: Option<Option<i32>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub last_consultation_notes: Option<Option<String>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub last_consultation_type: Option<Option<SessionType>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub last_consultation_status: Option<Option<SessionStatus>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub last_consultation_counselor_name: Option<Option<String>>,

  // ── Courses ─────────────────────────────────────────────────────────────
  /// Desired interested-course names. An empty list clears all rows.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub interested_courses: Option<Vec<String>>,
  /// Desired enrolled-course names. An empty list clears all rows.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub enrolled_courses: Option<Vec<String>>,
}

impl StudentUpdate {
  /// True if any field stored on the student row itself is present.
  pub fn touches_student_row(&self) -> bool {
    self.student_name.is_some()
      || self.email.is_some()
      || self.phone_number.is_some()
      || self.zalo_phone.is_some()
      || self.link_facebook.is_some()
      || self.date_of_birth.is_some()
      || self.gender.is_some()
      || self.current_education_level.is_some()
      || self.other_education_level_description.is_some()
      || self.high_school_name.is_some()
      || self.city.is_some()
      || self.source.is_some()
      || self.other_source_description.is_some()
      || self.notification_consent.is_some()
      || self.other_notification_consent_description.is_some()
      || self.current_status.is_some()
      || self.registration_date.is_some()
      || self.assigned_counselor_id.is_some()
  }

  /// The consultation fields, if any of them is present.
  pub fn consultation(&self) -> Option<ConsultationInput> {
    let supplied = self.last_consultation_date.is_some()
      || self.last_consultation_duration_minutes.is_some()
      || self.last_consultation_notes.is_some()
      || self.last_consultation_type.is_some()
      || self.last_consultation_status.is_some()
      || self.last_consultation_counselor_name.is_some();

    supplied.then(|| ConsultationInput {
      session_date:     self.last_consultation_date.flatten(),
      duration_minutes: self.last_consultation_duration_minutes.flatten(),
      notes:            self.last_consultation_notes.clone().flatten(),
      session_type:     self.last_consultation_type.flatten(),
      session_status:   self.last_consultation_status.flatten(),
      counselor_name:   self.last_consultation_counselor_name.clone().flatten(),
    })
  }
}
