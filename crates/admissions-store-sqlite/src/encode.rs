//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with nanosecond precision,
//! dates as `YYYY-MM-DD`, and enums as their `strum` discriminant strings.

use std::str::FromStr;

use admissions_core::{
  consultation::ConsultationSession,
  counselor::Counselor,
  enrollment::{Course, Enrollment, InterestedCourse},
  error::parse_variant,
  history::StatusHistoryEntry,
  student::Student,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Row;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Nanos, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_enum<T: Into<&'static str>>(value: T) -> &'static str { value.into() }

pub fn decode_enum<T: FromStr>(kind: &'static str, s: &str) -> Result<T> {
  Ok(parse_variant(kind, s)?)
}

fn decode_opt_enum<T: FromStr>(kind: &'static str, s: Option<String>) -> Result<Option<T>> {
  s.as_deref().map(|s| decode_enum(kind, s)).transpose()
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, full_name, user_type, program_type, status";

/// Raw values read directly from a `users` row.
pub struct RawCounselor {
  pub user_id:      i64,
  pub full_name:    String,
  pub user_type:    String,
  pub program_type: Option<String>,
  pub status:       String,
}

impl RawCounselor {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:      row.get(0)?,
      full_name:    row.get(1)?,
      user_type:    row.get(2)?,
      program_type: row.get(3)?,
      status:       row.get(4)?,
    })
  }

  pub fn into_counselor(self) -> Result<Counselor> {
    Ok(Counselor {
      counselor_id: self.user_id,
      full_name:    self.full_name,
      user_type:    decode_enum("user type", &self.user_type)?,
      program_type: decode_opt_enum("program type", self.program_type)?,
      status:       decode_enum("account status", &self.status)?,
    })
  }
}

pub const COURSE_COLUMNS: &str = "course_id, name, description, program_type";

pub struct RawCourse {
  pub course_id:    i64,
  pub name:         String,
  pub description:  Option<String>,
  pub program_type: Option<String>,
}

impl RawCourse {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      course_id:    row.get(0)?,
      name:         row.get(1)?,
      description:  row.get(2)?,
      program_type: row.get(3)?,
    })
  }

  pub fn into_course(self) -> Result<Course> {
    Ok(Course {
      course_id:    self.course_id,
      name:         self.name,
      description:  self.description,
      program_type: decode_opt_enum("program type", self.program_type)?,
    })
  }
}

pub const STUDENT_COLUMNS: &str = "student_id, student_name, email, phone_number, zalo_phone, \
   link_facebook, date_of_birth, gender, current_education_level, \
   other_education_level_description, high_school_name, city, source, \
   other_source_description, notification_consent, other_notification_consent_description, \
   current_status, status_change_date, registration_date, assigned_counselor_id, created_at, \
   updated_at";

/// Raw values read directly from a `students` row, in [`STUDENT_COLUMNS`]
/// order.
pub struct RawStudent {
  pub student_id:                             i64,
  pub student_name:                           String,
  pub email:                                  Option<String>,
  pub phone_number:                           String,
  pub zalo_phone:                             Option<String>,
  pub link_facebook:                          Option<String>,
  pub date_of_birth:                          Option<String>,
  pub gender:                                 String,
  pub current_education_level:                String,
  pub other_education_level_description:      Option<String>,
  pub high_school_name:                       Option<String>,
  pub city:                                   Option<String>,
  pub source:                                 Option<String>,
  pub other_source_description:               Option<String>,
  pub notification_consent:                   String,
  pub other_notification_consent_description: Option<String>,
  pub current_status:                         String,
  pub status_change_date:                     Option<String>,
  pub registration_date:                      Option<String>,
  pub assigned_counselor_id:                  Option<i64>,
  pub created_at:                             String,
  pub updated_at:                             String,
}

impl RawStudent {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      student_id:                             row.get(0)?,
      student_name:                           row.get(1)?,
      email:                                  row.get(2)?,
      phone_number:                           row.get(3)?,
      zalo_phone:                             row.get(4)?,
      link_facebook:                          row.get(5)?,
      date_of_birth:                          row.get(6)?,
      gender:                                 row.get(7)?,
      current_education_level:                row.get(8)?,
      other_education_level_description:      row.get(9)?,
      high_school_name:                       row.get(10)?,
      city:                                   row.get(11)?,
      source:                                 row.get(12)?,
      other_source_description:               row.get(13)?,
      notification_consent:                   row.get(14)?,
      other_notification_consent_description: row.get(15)?,
      current_status:                         row.get(16)?,
      status_change_date:                     row.get(17)?,
      registration_date:                      row.get(18)?,
      assigned_counselor_id:                  row.get(19)?,
      created_at:                             row.get(20)?,
      updated_at:                             row.get(21)?,
    })
  }

  pub fn into_student(self) -> Result<Student> {
    Ok(Student {
      student_id: self.student_id,
      student_name: self.student_name,
      email: self.email,
      phone_number: self.phone_number,
      zalo_phone: self.zalo_phone,
      link_facebook: self.link_facebook,
      date_of_birth: self.date_of_birth.as_deref().map(decode_date).transpose()?,
      gender: self.gender,
      current_education_level: decode_enum(
        "education level",
        &self.current_education_level,
      )?,
      other_education_level_description: self.other_education_level_description,
      high_school_name: self.high_school_name,
      city: self.city,
      source: decode_opt_enum("lead source", self.source)?,
      other_source_description: self.other_source_description,
      notification_consent: decode_enum("notification consent", &self.notification_consent)?,
      other_notification_consent_description: self.other_notification_consent_description,
      current_status: decode_enum("student status", &self.current_status)?,
      status_change_date: decode_opt_dt(self.status_change_date)?,
      registration_date: decode_opt_dt(self.registration_date)?,
      assigned_counselor_id: self.assigned_counselor_id,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub const HISTORY_COLUMNS: &str =
  "history_id, student_id, old_status, new_status, change_date, changed_by_user_id, notes";

pub struct RawHistory {
  pub history_id:         i64,
  pub student_id:         i64,
  pub old_status:         Option<String>,
  pub new_status:         String,
  pub change_date:        String,
  pub changed_by_user_id: i64,
  pub notes:              Option<String>,
}

impl RawHistory {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      history_id:         row.get(0)?,
      student_id:         row.get(1)?,
      old_status:         row.get(2)?,
      new_status:         row.get(3)?,
      change_date:        row.get(4)?,
      changed_by_user_id: row.get(5)?,
      notes:              row.get(6)?,
    })
  }

  pub fn into_entry(self) -> Result<StatusHistoryEntry> {
    Ok(StatusHistoryEntry {
      entry_id:           self.history_id,
      student_id:         self.student_id,
      old_status:         decode_opt_enum("student status", self.old_status)?,
      new_status:         decode_enum("student status", &self.new_status)?,
      change_date:        decode_dt(&self.change_date)?,
      changed_by_user_id: self.changed_by_user_id,
      notes:              self.notes,
    })
  }
}

pub const SESSION_COLUMNS: &str = "session_id, student_id, counselor_id, session_date, \
   duration_minutes, session_type, session_status, notes";

pub struct RawSession {
  pub session_id:       i64,
  pub student_id:       i64,
  pub counselor_id:     i64,
  pub session_date:     String,
  pub duration_minutes: Option<i32>,
  pub session_type:     String,
  pub session_status:   String,
  pub notes:            String,
}

impl RawSession {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      session_id:       row.get(0)?,
      student_id:       row.get(1)?,
      counselor_id:     row.get(2)?,
      session_date:     row.get(3)?,
      duration_minutes: row.get(4)?,
      session_type:     row.get(5)?,
      session_status:   row.get(6)?,
      notes:            row.get(7)?,
    })
  }

  pub fn into_session(self) -> Result<ConsultationSession> {
    Ok(ConsultationSession {
      session_id:       self.session_id,
      student_id:       self.student_id,
      counselor_id:     self.counselor_id,
      session_date:     decode_dt(&self.session_date)?,
      duration_minutes: self.duration_minutes,
      session_type:     decode_enum("session type", &self.session_type)?,
      session_status:   decode_enum("session status", &self.session_status)?,
      notes:            self.notes,
    })
  }
}

/// Enrollment columns joined with `courses` (aliased `c`) for the name.
pub const ENROLLMENT_COLUMNS: &str = "e.enrollment_id, e.student_id, e.course_id, c.name, \
   e.enrollment_date, e.fee_paid, e.payment_status, e.counselor_id, \
   e.consultation_session_id, e.notes";

pub struct RawEnrollment {
  pub enrollment_id:           i64,
  pub student_id:              i64,
  pub course_id:               i64,
  pub course_name:             String,
  pub enrollment_date:         String,
  pub fee_paid:                f64,
  pub payment_status:          String,
  pub counselor_id:            i64,
  pub consultation_session_id: Option<i64>,
  pub notes:                   Option<String>,
}

impl RawEnrollment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      enrollment_id:           row.get(0)?,
      student_id:              row.get(1)?,
      course_id:               row.get(2)?,
      course_name:             row.get(3)?,
      enrollment_date:         row.get(4)?,
      fee_paid:                row.get(5)?,
      payment_status:          row.get(6)?,
      counselor_id:            row.get(7)?,
      consultation_session_id: row.get(8)?,
      notes:                   row.get(9)?,
    })
  }

  pub fn into_enrollment(self) -> Result<Enrollment> {
    Ok(Enrollment {
      enrollment_id:           self.enrollment_id,
      student_id:              self.student_id,
      course_id:               self.course_id,
      course_name:             self.course_name,
      enrollment_date:         decode_dt(&self.enrollment_date)?,
      fee_paid:                self.fee_paid,
      payment_status:          decode_enum("payment status", &self.payment_status)?,
      counselor_id:            self.counselor_id,
      consultation_session_id: self.consultation_session_id,
      notes:                   self.notes,
    })
  }
}

/// Interest columns joined with `courses` (aliased `c`) for the name.
pub const INTEREST_COLUMNS: &str =
  "i.interest_id, i.student_id, i.course_id, c.name, i.interest_date, i.notes";

pub struct RawInterest {
  pub interest_id:   i64,
  pub student_id:    i64,
  pub course_id:     i64,
  pub course_name:   String,
  pub interest_date: String,
  pub notes:         Option<String>,
}

impl RawInterest {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      interest_id:   row.get(0)?,
      student_id:    row.get(1)?,
      course_id:     row.get(2)?,
      course_name:   row.get(3)?,
      interest_date: row.get(4)?,
      notes:         row.get(5)?,
    })
  }

  pub fn into_interest(self) -> Result<InterestedCourse> {
    Ok(InterestedCourse {
      interest_id:   self.interest_id,
      student_id:    self.student_id,
      course_id:     self.course_id,
      course_name:   self.course_name,
      interest_date: decode_dt(&self.interest_date)?,
      notes:         self.notes,
    })
  }
}

#[cfg(test)]
mod tests {
  use admissions_core::student::StudentStatus;
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_as_text() {
    let early = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
    let late = early + chrono::Duration::nanoseconds(1_500);
    assert!(encode_dt(early) < encode_dt(late));
    assert_eq!(decode_dt(&encode_dt(late)).unwrap(), late);
  }

  #[test]
  fn enum_discriminants_match_stored_text() {
    assert_eq!(encode_enum(StudentStatus::DroppedOut), "Dropped_Out");
    let status: StudentStatus = decode_enum("student status", "Registered").unwrap();
    assert_eq!(status, StudentStatus::Registered);
    assert!(matches!(
      decode_enum::<StudentStatus>("student status", "Graduated"),
      Err(Error::Core(_))
    ));
  }
}
