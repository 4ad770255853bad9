//! In-memory fakes for the core traits, shared by unit tests.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::{
  aggregate::StudentAggregate,
  consultation::{ConsultationSession, NewConsultationSession},
  counselor::{AccountStatus, Counselor, ProgramType, UserType},
  enrollment::{
    Course, Enrollment, InterestedCourse, NewEnrollment, NewInterestedCourse, PaymentStatus,
  },
  history::{NewStatusHistoryEntry, StatusHistoryEntry},
  orchestrator::ConsultingTx,
  store::{EnrollmentQuery, EnrollmentRecord, KpiSource, StudentQuery},
  student::{EducationLevel, NotificationConsent, Student, StudentStatus},
  Error,
};

pub fn counselor(id: i64, user_type: UserType, program_type: Option<ProgramType>) -> Counselor {
  Counselor {
    counselor_id: id,
    full_name: format!("Counselor {id}"),
    user_type,
    program_type,
    status: AccountStatus::Active,
  }
}

/// A student created (and last moved) at `created`.
pub fn student_at(
  student_id: i64,
  status: StudentStatus,
  assigned_counselor_id: Option<i64>,
  created: DateTime<Utc>,
) -> Student {
  Student {
    student_id,
    student_name: format!("Student {student_id}"),
    email: Some(format!("student{student_id}@example.com")),
    phone_number: format!("09000000{student_id:02}"),
    zalo_phone: None,
    link_facebook: None,
    date_of_birth: NaiveDate::from_ymd_opt(2006, 4, 12),
    gender: "female".into(),
    current_education_level: EducationLevel::HighSchool,
    other_education_level_description: None,
    high_school_name: None,
    city: Some("Ha Noi".into()),
    source: None,
    other_source_description: None,
    notification_consent: NotificationConsent::Agree,
    other_notification_consent_description: None,
    current_status: status,
    status_change_date: Some(created),
    registration_date: None,
    assigned_counselor_id,
    created_at: created,
    updated_at: created,
  }
}

/// A bare aggregate for a student assigned to counselor 3.
pub fn aggregate(student_id: i64, status: StudentStatus) -> StudentAggregate {
  let created = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
  StudentAggregate {
    student:             student_at(student_id, status, Some(3), created),
    latest_consultation: None,
    enrollments:         vec![],
    interested_courses:  vec![],
    status_history:      vec![],
  }
}

// ─── MemoryTx ────────────────────────────────────────────────────────────────

/// A [`ConsultingTx`] over plain vectors. `writes` counts mutating calls.
///
/// [`MemoryTx::with_student`] seeds counselor 3, the assignee, and user 7,
/// the usual acting user.
#[derive(Debug, Default)]
pub struct MemoryTx {
  pub students:    HashMap<i64, Student>,
  pub counselors:  Vec<Counselor>,
  pub courses:     Vec<Course>,
  pub history:     Vec<StatusHistoryEntry>,
  pub sessions:    Vec<ConsultationSession>,
  pub interests:   Vec<InterestedCourse>,
  pub enrollments: Vec<Enrollment>,
  pub writes:      usize,
  next_id:         i64,
}

impl MemoryTx {
  pub fn with_student(student_id: i64, status: StudentStatus) -> Self {
    let mut tx = Self::default();
    tx.students
      .insert(student_id, aggregate(student_id, status).student);
    tx.counselors.push(counselor(3, UserType::Counselor, Some(ProgramType::Aptech)));
    tx.counselors.push(counselor(7, UserType::Manager, None));
    tx
  }

  pub fn aggregate(&self, student_id: i64) -> StudentAggregate {
    self.build(student_id, usize::MAX).expect("student exists")
  }

  pub fn add_courses<const N: usize>(&mut self, names: [&str; N]) -> [i64; N] {
    names.map(|name| {
      let course_id = self.next();
      self.courses.push(Course {
        course_id,
        name: name.to_owned(),
        description: None,
        program_type: None,
      });
      course_id
    })
  }

  pub fn interest(&mut self, student_id: i64, course_id: i64) {
    let interest_id = self.next();
    let course_name = self.course_name(course_id);
    self.interests.push(InterestedCourse {
      interest_id,
      student_id,
      course_id,
      course_name,
      interest_date: Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
      notes: None,
    });
  }

  pub fn enroll(&mut self, student_id: i64, course_id: i64) {
    let enrollment_id = self.next();
    let course_name = self.course_name(course_id);
    self.enrollments.push(Enrollment {
      enrollment_id,
      student_id,
      course_id,
      course_name,
      enrollment_date: Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
      fee_paid: 500.0,
      payment_status: PaymentStatus::Paid,
      counselor_id: 3,
      consultation_session_id: None,
      notes: None,
    });
  }

  fn next(&mut self) -> i64 {
    self.next_id += 1;
    self.next_id
  }

  fn course_name(&self, course_id: i64) -> String {
    self
      .courses
      .iter()
      .find(|c| c.course_id == course_id)
      .map(|c| c.name.clone())
      .unwrap_or_default()
  }

  fn build(&self, student_id: i64, history_limit: usize) -> Option<StudentAggregate> {
    let student = self.students.get(&student_id)?.clone();

    let latest_consultation = self
      .sessions
      .iter()
      .filter(|s| s.student_id == student_id)
      .max_by_key(|s| (s.session_date, s.session_id))
      .cloned();

    let mut status_history: Vec<StatusHistoryEntry> = self
      .history
      .iter()
      .filter(|h| h.student_id == student_id)
      .cloned()
      .collect();
    status_history.sort_by_key(|h| std::cmp::Reverse((h.change_date, h.entry_id)));
    status_history.truncate(history_limit);

    Some(StudentAggregate {
      student,
      latest_consultation,
      enrollments: self
        .enrollments
        .iter()
        .filter(|e| e.student_id == student_id)
        .cloned()
        .collect(),
      interested_courses: self
        .interests
        .iter()
        .filter(|i| i.student_id == student_id)
        .cloned()
        .collect(),
      status_history,
    })
  }
}

impl ConsultingTx for MemoryTx {
  type Error = Error;

  fn load_aggregate(
    &mut self,
    student_id: i64,
    history_limit: usize,
  ) -> Result<Option<StudentAggregate>, Error> {
    Ok(self.build(student_id, history_limit))
  }

  fn get_counselor(&mut self, counselor_id: i64) -> Result<Option<Counselor>, Error> {
    Ok(self.counselors.iter().find(|c| c.counselor_id == counselor_id).cloned())
  }

  fn find_counselor_by_name(&mut self, fragment: &str) -> Result<Option<Counselor>, Error> {
    Ok(self.counselors.iter().find(|c| c.full_name.contains(fragment)).cloned())
  }

  fn find_courses_by_name(&mut self, names: &[String]) -> Result<Vec<Course>, Error> {
    Ok(
      self
        .courses
        .iter()
        .filter(|c| names.contains(&c.name))
        .cloned()
        .collect(),
    )
  }

  fn save_student(&mut self, student: &Student) -> Result<(), Error> {
    self.writes += 1;
    self.students.insert(student.student_id, student.clone());
    Ok(())
  }

  fn append_status_history(
    &mut self,
    entry: NewStatusHistoryEntry,
  ) -> Result<StatusHistoryEntry, Error> {
    self.writes += 1;
    let row = StatusHistoryEntry {
      entry_id:           self.next(),
      student_id:         entry.student_id,
      old_status:         entry.old_status,
      new_status:         entry.new_status,
      change_date:        entry.change_date,
      changed_by_user_id: entry.changed_by_user_id,
      notes:              entry.notes,
    };
    self.history.push(row.clone());
    Ok(row)
  }

  fn append_consultation(
    &mut self,
    session: NewConsultationSession,
  ) -> Result<ConsultationSession, Error> {
    self.writes += 1;
    let row = ConsultationSession {
      session_id:       self.next(),
      student_id:       session.student_id,
      counselor_id:     session.counselor_id,
      session_date:     session.session_date,
      duration_minutes: session.duration_minutes,
      session_type:     session.session_type,
      session_status:   session.session_status,
      notes:            session.notes,
    };
    self.sessions.push(row.clone());
    Ok(row)
  }

  fn remove_interested_courses(
    &mut self,
    student_id: i64,
    course_ids: &[i64],
  ) -> Result<(), Error> {
    self.writes += 1;
    self
      .interests
      .retain(|i| i.student_id != student_id || !course_ids.contains(&i.course_id));
    Ok(())
  }

  fn add_interested_courses(&mut self, rows: &[NewInterestedCourse]) -> Result<(), Error> {
    self.writes += 1;
    for row in rows {
      let exists = self
        .interests
        .iter()
        .any(|i| i.student_id == row.student_id && i.course_id == row.course_id);
      if !exists {
        let interest_id = self.next();
        let course_name = self.course_name(row.course_id);
        self.interests.push(InterestedCourse {
          interest_id,
          student_id: row.student_id,
          course_id: row.course_id,
          course_name,
          interest_date: row.interest_date,
          notes: row.notes.clone(),
        });
      }
    }
    Ok(())
  }

  fn remove_enrollments(&mut self, student_id: i64, course_ids: &[i64]) -> Result<(), Error> {
    self.writes += 1;
    self
      .enrollments
      .retain(|e| e.student_id != student_id || !course_ids.contains(&e.course_id));
    Ok(())
  }

  fn add_enrollments(&mut self, rows: &[NewEnrollment]) -> Result<(), Error> {
    self.writes += 1;
    for row in rows {
      let exists = self
        .enrollments
        .iter()
        .any(|e| e.student_id == row.student_id && e.course_id == row.course_id);
      if !exists {
        let enrollment_id = self.next();
        let course_name = self.course_name(row.course_id);
        self.enrollments.push(Enrollment {
          enrollment_id,
          student_id: row.student_id,
          course_id: row.course_id,
          course_name,
          enrollment_date: row.enrollment_date,
          fee_paid: row.fee_paid,
          payment_status: row.payment_status,
          counselor_id: row.counselor_id,
          consultation_session_id: row.consultation_session_id,
          notes: row.notes.clone(),
        });
      }
    }
    Ok(())
  }
}

// ─── MemorySource ────────────────────────────────────────────────────────────

/// A [`KpiSource`] over plain vectors. Looking up a counselor listed in
/// `broken` fails as if its row could not be decoded.
#[derive(Debug, Default)]
pub struct MemorySource {
  pub counselors:  Vec<Counselor>,
  pub students:    Vec<Student>,
  pub enrollments: Vec<EnrollmentRecord>,
  pub broken:      Vec<i64>,
}

impl KpiSource for MemorySource {
  type Error = Error;

  async fn get_counselor(&self, counselor_id: i64) -> Result<Option<Counselor>, Error> {
    if self.broken.contains(&counselor_id) {
      return Err(Error::UnknownVariant {
        kind:  "program_type",
        value: "Bogus".into(),
      });
    }
    Ok(self.counselors.iter().find(|c| c.counselor_id == counselor_id).cloned())
  }

  async fn list_counselors(&self) -> Result<Vec<Counselor>, Error> { Ok(self.counselors.clone()) }

  async fn count_students(&self, query: &StudentQuery) -> Result<u64, Error> {
    Ok(self.students.iter().filter(|s| query.matches(s)).count() as u64)
  }

  async fn list_enrollments(
    &self,
    query: &EnrollmentQuery,
  ) -> Result<Vec<EnrollmentRecord>, Error> {
    Ok(
      self
        .enrollments
        .iter()
        .filter(|e| query.counselor_id.is_none_or(|id| e.counselor_id == id))
        .filter(|e| {
          query
            .enrolled_between
            .is_none_or(|r| r.contains(e.enrollment_date))
        })
        .cloned()
        .collect(),
    )
  }
}
