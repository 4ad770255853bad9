//! Partial update differ: existing aggregate + incoming update → change set.
//!
//! Pure; performs no I/O. Course names are resolved to ids later by the
//! orchestrator, so the course lists pass through untouched.

use crate::{
  aggregate::StudentAggregate,
  consultation::ConsultationInput,
  student::StudentStatus,
  update::StudentUpdate,
};

/// A funnel transition detected by the differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
  pub from: StudentStatus,
  pub to:   StudentStatus,
}

/// The minimal set of changes an update implies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
  /// Only the student-row fields whose value differs from the stored one.
  pub student:            StudentUpdate,
  pub status_change:      Option<StatusChange>,
  pub consultation:       Option<ConsultationInput>,
  pub interested_courses: Option<Vec<String>>,
  pub enrolled_courses:   Option<Vec<String>>,
}

impl ChangeSet {
  pub fn has_student_changes(&self) -> bool { self.student.touches_student_row() }

  pub fn status_changed(&self) -> bool { self.status_change.is_some() }

  pub fn needs_consultation_update(&self) -> bool { self.consultation.is_some() }

  pub fn needs_interested_courses_update(&self) -> bool {
    self.interested_courses.is_some()
  }

  pub fn needs_enrolled_courses_update(&self) -> bool { self.enrolled_courses.is_some() }

  /// True when the update requires no writes at all.
  pub fn is_noop(&self) -> bool {
    !self.has_student_changes()
      && !self.needs_consultation_update()
      && !self.needs_interested_courses_update()
      && !self.needs_enrolled_courses_update()
  }
}

/// `Some(new)` if `incoming` is present and differs from `current`.
fn changed<T: PartialEq + Clone>(incoming: &Option<T>, current: &T) -> Option<T> {
  incoming.as_ref().filter(|v| *v != current).cloned()
}

/// Compute the change set that transitions `existing` according to `update`.
pub fn diff(existing: &StudentAggregate, update: &StudentUpdate) -> ChangeSet {
  let s = &existing.student;

  let student = StudentUpdate {
    student_name: changed(&update.student_name, &s.student_name),
    email: changed(&update.email, &s.email),
    phone_number: changed(&update.phone_number, &s.phone_number),
    zalo_phone: changed(&update.zalo_phone, &s.zalo_phone),
    link_facebook: changed(&update.link_facebook, &s.link_facebook),
    date_of_birth: changed(&update.date_of_birth, &s.date_of_birth),
    gender: changed(&update.gender, &s.gender),
    current_education_level: changed(
      &update.current_education_level,
      &s.current_education_level,
    ),
    other_education_level_description: changed(
      &update.other_education_level_description,
      &s.other_education_level_description,
    ),
    high_school_name: changed(&update.high_school_name, &s.high_school_name),
    city: changed(&update.city, &s.city),
    source: changed(&update.source, &s.source),
    other_source_description: changed(
      &update.other_source_description,
      &s.other_source_description,
    ),
    notification_consent: changed(&update.notification_consent, &s.notification_consent),
    other_notification_consent_description: changed(
      &update.other_notification_consent_description,
      &s.other_notification_consent_description,
    ),
    current_status: changed(&update.current_status, &s.current_status),
    registration_date: changed(&update.registration_date, &s.registration_date),
    assigned_counselor_id: update
      .assigned_counselor_id
      .filter(|id| s.assigned_counselor_id != Some(*id)),
    ..StudentUpdate::default()
  };

  let status_change = student.current_status.map(|to| StatusChange {
    from: s.current_status,
    to,
  });

  ChangeSet {
    student,
    status_change,
    consultation: update.consultation(),
    interested_courses: update.interested_courses.clone(),
    enrolled_courses: update.enrolled_courses.clone(),
  }
}

// ─── Course reconciliation ───────────────────────────────────────────────────

/// Rows to delete and insert so that the current course set becomes the
/// desired one. Courses in both sets are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseSync {
  pub remove: Vec<i64>,
  pub add:    Vec<i64>,
}

impl CourseSync {
  pub fn between(desired: &[i64], current: &[i64]) -> Self {
    let mut add: Vec<i64> = Vec::new();
    for id in desired {
      if !current.contains(id) && !add.contains(id) {
        add.push(*id);
      }
    }
    let remove = current
      .iter()
      .copied()
      .filter(|id| !desired.contains(id))
      .collect();
    Self { remove, add }
  }

  /// Remove every current row.
  pub fn clear(current: &[i64]) -> Self {
    Self {
      remove: current.to_vec(),
      add:    Vec::new(),
    }
  }

  pub fn is_empty(&self) -> bool { self.remove.is_empty() && self.add.is_empty() }
}
