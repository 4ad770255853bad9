//! Integration tests for `SqliteStore` against an in-memory database.

use admissions_core::{
  ErrorClass,
  consultation::{SessionStatus, SessionType},
  counselor::{AccountStatus, Counselor, NewCounselor, ProgramType, UserType},
  enrollment::{EnrollmentPatch, NewCourse, PaymentStatus},
  error::Classify,
  kpi::KpiEngine,
  page::PageRequest,
  store::{AdmissionsStore, KpiSource, StudentQuery},
  student::{NewStudent, StudentStatus},
  update::StudentUpdate,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(
  s: &SqliteStore,
  name: &str,
  user_type: UserType,
  program: Option<ProgramType>,
) -> Counselor {
  s.add_counselor(NewCounselor {
    full_name: name.into(),
    user_type,
    program_type: program,
    status: AccountStatus::Active,
  })
  .await
  .unwrap()
}

async fn course(s: &SqliteStore, name: &str) -> i64 {
  s.add_course(NewCourse {
    name:         name.into(),
    description:  None,
    program_type: Some(ProgramType::Aptech),
  })
  .await
  .unwrap()
  .course_id
}

async fn student(s: &SqliteStore, status: StudentStatus, counselor: Option<i64>) -> i64 {
  let mut input = NewStudent::new("Pham Minh D", "0912345678");
  input.current_status = status;
  input.assigned_counselor_id = counselor;
  s.add_student(input).await.unwrap().student_id
}

fn status(to: StudentStatus) -> StudentUpdate {
  StudentUpdate {
    current_status: Some(to),
    ..Default::default()
  }
}

fn courses(names: &[&str]) -> Option<Vec<String>> {
  Some(names.iter().map(|n| n.to_string()).collect())
}

// ─── Students ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_aggregate() {
  let s = store().await;
  let counselor = user(&s, "Nguyen Van A", UserType::Counselor, Some(ProgramType::Aptech)).await;
  let id = student(&s, StudentStatus::Lead, Some(counselor.counselor_id)).await;

  let agg = s.get_aggregate(id).await.unwrap().unwrap();
  assert_eq!(agg.student.student_name, "Pham Minh D");
  assert_eq!(agg.student.current_status, StudentStatus::Lead);
  assert_eq!(agg.student.assigned_counselor_id, Some(counselor.counselor_id));
  assert_eq!(agg.student.status_change_date, Some(agg.student.created_at));
  assert!(agg.latest_consultation.is_none());
  assert!(agg.status_history.is_empty());
}

#[tokio::test]
async fn missing_student_is_none() {
  let s = store().await;
  assert!(s.get_aggregate(404).await.unwrap().is_none());

  let admin = user(&s, "Admin", UserType::Admin, None).await;
  let result = s
    .update_consulting_information(404, status(StudentStatus::Lead), admin.counselor_id)
    .await
    .unwrap();
  assert!(result.is_none());

  assert!(s.status_history(404).await.unwrap().is_none());
  assert!(s.consultation_sessions(404).await.unwrap().is_none());
  assert!(s.student_enrollments(404).await.unwrap().is_none());
}

#[tokio::test]
async fn known_student_without_rows_has_empty_lists() {
  let s = store().await;
  let id = student(&s, StudentStatus::Lead, None).await;

  assert_eq!(s.status_history(id).await.unwrap(), Some(vec![]));
  assert_eq!(s.consultation_sessions(id).await.unwrap(), Some(vec![]));
  assert_eq!(s.student_enrollments(id).await.unwrap(), Some(vec![]));
}

#[tokio::test]
async fn list_students_pages_and_filters() {
  let s = store().await;
  let mine = user(&s, "Mine", UserType::Counselor, None).await;
  let mut ids = Vec::new();
  for _ in 0..5 {
    ids.push(student(&s, StudentStatus::Lead, Some(mine.counselor_id)).await);
  }
  student(&s, StudentStatus::Lead, None).await;

  let page = s
    .list_students(None, PageRequest::new(Some(2), Some(4)))
    .await
    .unwrap();
  assert_eq!(page.metadata.total, 6);
  assert_eq!(page.metadata.total_pages, 2);
  assert_eq!(page.data.len(), 2);
  assert_eq!(page.data[0].student_id, ids[4]);

  let scoped = s
    .list_students(Some(mine.counselor_id), PageRequest::default())
    .await
    .unwrap();
  assert_eq!(scoped.metadata.total, 5);
  let listed: Vec<i64> = scoped.data.iter().map(|st| st.student_id).collect();
  assert_eq!(listed, ids);
}

#[tokio::test]
async fn duplicate_email_on_create_is_a_constraint() {
  let s = store().await;
  let mut first = NewStudent::new("A", "1");
  first.email = Some("same@example.com".into());
  s.add_student(first.clone()).await.unwrap();

  let err = s.add_student(first).await.unwrap_err();
  assert!(matches!(err, Error::Constraint(_)), "{err:?}");
  assert_eq!(err.class(), ErrorClass::Conflict);
}

// ─── Status ledger ───────────────────────────────────────────────────────────

#[tokio::test]
async fn status_change_appends_one_ledger_entry() {
  let s = store().await;
  let counselor = user(&s, "Le Thi E", UserType::Counselor, None).await;
  let id = student(&s, StudentStatus::Engaging, None).await;
  let before = s.get_aggregate(id).await.unwrap().unwrap();

  let agg = s
    .update_consulting_information(id, status(StudentStatus::Registered), counselor.counselor_id)
    .await
    .unwrap()
    .unwrap();

  assert_eq!(agg.student.current_status, StudentStatus::Registered);
  assert!(agg.student.status_change_date > before.student.status_change_date);
  assert_eq!(agg.status_history.len(), 1);
  let entry = &agg.status_history[0];
  assert_eq!(entry.old_status, Some(StudentStatus::Engaging));
  assert_eq!(entry.new_status, StudentStatus::Registered);
  assert_eq!(entry.changed_by_user_id, counselor.counselor_id);
  assert_eq!(Some(entry.change_date), agg.student.status_change_date);
  assert_eq!(entry.notes.as_deref(), Some("Status changed from Engaging to Registered"));
}

#[tokio::test]
async fn aggregate_carries_five_newest_entries() {
  let s = store().await;
  let admin = user(&s, "Admin", UserType::Admin, None).await;
  let id = student(&s, StudentStatus::Lead, None).await;

  let cycle = [StudentStatus::Engaging, StudentStatus::Lead];
  for i in 0..7 {
    s.update_consulting_information(id, status(cycle[i % 2]), admin.counselor_id)
      .await
      .unwrap();
  }

  let agg = s.get_aggregate(id).await.unwrap().unwrap();
  assert_eq!(agg.status_history.len(), 5);
  let full = s.status_history(id).await.unwrap().unwrap();
  assert_eq!(full.len(), 7);
  assert_eq!(agg.status_history[..], full[..5]);
  assert!(full.windows(2).all(|w| w[0].change_date >= w[1].change_date));
  assert_eq!(full[0].new_status, StudentStatus::Engaging);
}

#[tokio::test]
async fn noop_update_writes_nothing() {
  let s = store().await;
  let admin = user(&s, "Admin", UserType::Admin, None).await;
  let id = student(&s, StudentStatus::Engaging, None).await;
  let before = s.get_aggregate(id).await.unwrap().unwrap();

  let update = StudentUpdate {
    student_name: Some(before.student.student_name.clone()),
    current_status: Some(StudentStatus::Engaging),
    ..Default::default()
  };
  let after = s
    .update_consulting_information(id, update, admin.counselor_id)
    .await
    .unwrap()
    .unwrap();

  assert_eq!(after, before);
  assert!(s.status_history(id).await.unwrap().unwrap().is_empty());
}

// ─── Atomicity ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_counselor_rolls_back_everything() {
  let s = store().await;
  let admin = user(&s, "Admin", UserType::Admin, None).await;
  let id = student(&s, StudentStatus::Lead, None).await;
  let before = s.get_aggregate(id).await.unwrap().unwrap();

  let update = StudentUpdate {
    current_status: Some(StudentStatus::Engaging),
    assigned_counselor_id: Some(999),
    ..Default::default()
  };
  let err = s
    .update_consulting_information(id, update, admin.counselor_id)
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Core(admissions_core::Error::CounselorNotFound(999))));
  assert_eq!(err.class(), ErrorClass::NotFound);
  assert_eq!(s.get_aggregate(id).await.unwrap().unwrap(), before);
  assert!(s.status_history(id).await.unwrap().unwrap().is_empty());
}

#[tokio::test]
async fn constraint_failure_rolls_back_ledger_entry() {
  let s = store().await;
  let admin = user(&s, "Admin", UserType::Admin, None).await;
  let mut taken = NewStudent::new("Taken", "1");
  taken.email = Some("taken@example.com".into());
  s.add_student(taken).await.unwrap();
  let id = student(&s, StudentStatus::Lead, None).await;

  let update = StudentUpdate {
    current_status: Some(StudentStatus::Engaging),
    email: Some(Some("taken@example.com".into())),
    last_consultation_notes: Some(Some("should vanish".into())),
    ..Default::default()
  };
  let err = s
    .update_consulting_information(id, update, admin.counselor_id)
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Constraint(_)), "{err:?}");
  let agg = s.get_aggregate(id).await.unwrap().unwrap();
  assert_eq!(agg.student.current_status, StudentStatus::Lead);
  assert_eq!(agg.student.email, None);
  assert!(s.status_history(id).await.unwrap().unwrap().is_empty());
  assert!(s.consultation_sessions(id).await.unwrap().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_acting_user_is_not_found_and_writes_nothing() {
  let s = store().await;
  let id = student(&s, StudentStatus::Lead, None).await;
  let before = s.get_aggregate(id).await.unwrap().unwrap();

  let update = StudentUpdate {
    current_status: Some(StudentStatus::Engaging),
    last_consultation_notes: Some(Some("never saved".into())),
    ..Default::default()
  };
  let err = s
    .update_consulting_information(id, update, 555)
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Core(admissions_core::Error::ActingUserNotFound(555))));
  assert_eq!(err.class(), ErrorClass::NotFound);
  assert!(err.to_string().contains("acting user not found: 555"), "{err}");
  assert_eq!(s.get_aggregate(id).await.unwrap().unwrap(), before);
  assert!(s.consultation_sessions(id).await.unwrap().unwrap().is_empty());
}

// ─── Consultation sessions ───────────────────────────────────────────────────

#[tokio::test]
async fn sessions_are_append_only() {
  let s = store().await;
  let counselor = user(&s, "Tran Thi B", UserType::Counselor, Some(ProgramType::Arena)).await;
  let admin = user(&s, "Admin", UserType::Admin, None).await;
  let id = student(&s, StudentStatus::Lead, None).await;

  let first = StudentUpdate {
    last_consultation_notes: Some(Some("first call".into())),
    last_consultation_counselor_name: Some(Some("Tran Thi B (tư vấn viên)".into())),
    ..Default::default()
  };
  let agg = s
    .update_consulting_information(id, first, admin.counselor_id)
    .await
    .unwrap()
    .unwrap();
  let session = agg.latest_consultation.unwrap();
  assert_eq!(session.counselor_id, counselor.counselor_id);
  assert_eq!(session.session_type, SessionType::PhoneCall);
  assert_eq!(session.session_status, SessionStatus::Scheduled);

  let second = StudentUpdate {
    last_consultation_notes: Some(Some("follow-up".into())),
    last_consultation_type: Some(Some(SessionType::InPerson)),
    ..Default::default()
  };
  let agg = s
    .update_consulting_information(id, second, admin.counselor_id)
    .await
    .unwrap()
    .unwrap();

  let all = s.consultation_sessions(id).await.unwrap().unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all[1], session);
  assert_eq!(agg.latest_consultation.as_ref(), all.first());
  assert_eq!(all[0].notes, "follow-up");
  assert_eq!(all[0].counselor_id, admin.counselor_id);
}

// ─── Courses ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn interested_courses_keep_shared_rows() {
  let s = store().await;
  let admin = user(&s, "Admin", UserType::Admin, None).await;
  let (a, b, c) = (course(&s, "A").await, course(&s, "B").await, course(&s, "C").await);
  let id = student(&s, StudentStatus::Lead, None).await;

  let update = StudentUpdate {
    interested_courses: courses(&["A", "B"]),
    ..Default::default()
  };
  let agg = s
    .update_consulting_information(id, update, admin.counselor_id)
    .await
    .unwrap()
    .unwrap();
  let b_row = agg
    .interested_courses
    .iter()
    .find(|i| i.course_id == b)
    .cloned()
    .unwrap();
  assert_eq!(agg.interested_course_ids(), vec![a, b]);

  let update = StudentUpdate {
    interested_courses: courses(&["B", "C", "Unknown course"]),
    ..Default::default()
  };
  let agg = s
    .update_consulting_information(id, update, admin.counselor_id)
    .await
    .unwrap()
    .unwrap();

  let mut ids = agg.interested_course_ids();
  ids.sort_unstable();
  assert_eq!(ids, vec![b, c]);
  assert!(agg.interested_courses.contains(&b_row));
}

#[tokio::test]
async fn enrollments_sync_and_clear() {
  let s = store().await;
  let counselor = user(&s, "Vo Van F", UserType::Counselor, Some(ProgramType::Aptech)).await;
  let admin = user(&s, "Admin", UserType::Admin, None).await;
  course(&s, "A").await;
  course(&s, "B").await;
  let id = student(&s, StudentStatus::Engaging, Some(counselor.counselor_id)).await;

  let update = StudentUpdate {
    enrolled_courses: courses(&["A", " B ", ""]),
    last_consultation_status: Some(Some(SessionStatus::Completed)),
    ..Default::default()
  };
  let agg = s
    .update_consulting_information(id, update, admin.counselor_id)
    .await
    .unwrap()
    .unwrap();

  assert_eq!(agg.enrollments.len(), 2);
  let session_id = agg.latest_consultation.as_ref().map(|s| s.session_id);
  for e in &agg.enrollments {
    assert_eq!(e.payment_status, PaymentStatus::Pending);
    assert_eq!(e.fee_paid, 0.0);
    assert_eq!(e.counselor_id, counselor.counselor_id);
    assert_eq!(e.consultation_session_id, session_id);
    assert_eq!(e.notes.as_deref(), Some("Enrolled via consulting information update"));
  }

  let clear = StudentUpdate {
    enrolled_courses: Some(vec![]),
    ..Default::default()
  };
  let agg = s
    .update_consulting_information(id, clear, admin.counselor_id)
    .await
    .unwrap()
    .unwrap();
  assert!(agg.enrollments.is_empty());
}

#[tokio::test]
async fn unresolvable_course_list_leaves_rows() {
  let s = store().await;
  let admin = user(&s, "Admin", UserType::Admin, None).await;
  let a = course(&s, "A").await;
  let id = student(&s, StudentStatus::Lead, None).await;

  let update = StudentUpdate {
    interested_courses: courses(&["A"]),
    ..Default::default()
  };
  s.update_consulting_information(id, update, admin.counselor_id)
    .await
    .unwrap();

  let ghosts = StudentUpdate {
    interested_courses: courses(&["Ghost"]),
    ..Default::default()
  };
  let agg = s
    .update_consulting_information(id, ghosts, admin.counselor_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(agg.interested_course_ids(), vec![a]);
}

#[tokio::test]
async fn recorded_payment_counts_toward_revenue() {
  let s = store().await;
  let counselor = user(&s, "Bui H", UserType::Counselor, Some(ProgramType::Aptech)).await;
  course(&s, "A").await;
  let id = student(&s, StudentStatus::Registered, Some(counselor.counselor_id)).await;

  let update = StudentUpdate {
    enrolled_courses: courses(&["A"]),
    ..Default::default()
  };
  let agg = s
    .update_consulting_information(id, update, counselor.counselor_id)
    .await
    .unwrap()
    .unwrap();
  let enrollment_id = agg.enrollments[0].enrollment_id;

  let before = KpiEngine::new(&s).overall(None, None).await.unwrap();
  assert_eq!(before.details.total_revenue, 0.0);

  let patch = EnrollmentPatch {
    fee_paid: Some(1500.0),
    payment_status: Some(PaymentStatus::Paid),
    ..Default::default()
  };
  let paid = s
    .update_enrollment(enrollment_id, patch)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(paid.fee_paid, 1500.0);
  assert_eq!(paid.payment_status, PaymentStatus::Paid);
  assert_eq!(paid.notes.as_deref(), Some("Enrolled via consulting information update"));

  let stored = s.student_enrollments(id).await.unwrap().unwrap();
  assert_eq!(stored, vec![paid]);

  let after = KpiEngine::new(&s).overall(None, None).await.unwrap();
  assert_eq!(after.details.total_revenue, 1500.0);
  assert_eq!(after.statistics.enrollments.count, 1);
}

#[tokio::test]
async fn missing_enrollment_is_none() {
  let s = store().await;
  let patch = EnrollmentPatch {
    fee_paid: Some(10.0),
    ..Default::default()
  };
  assert!(s.update_enrollment(404, patch).await.unwrap().is_none());
  assert!(!s.delete_enrollment(404).await.unwrap());
}

#[tokio::test]
async fn deleted_enrollment_leaves_the_student() {
  let s = store().await;
  let admin = user(&s, "Admin", UserType::Admin, None).await;
  course(&s, "A").await;
  course(&s, "B").await;
  let id = student(&s, StudentStatus::Registered, None).await;

  let update = StudentUpdate {
    enrolled_courses: courses(&["A", "B"]),
    ..Default::default()
  };
  let agg = s
    .update_consulting_information(id, update, admin.counselor_id)
    .await
    .unwrap()
    .unwrap();

  assert!(s.delete_enrollment(agg.enrollments[0].enrollment_id).await.unwrap());
  let left = s.student_enrollments(id).await.unwrap().unwrap();
  assert_eq!(left, agg.enrollments[1..]);
}

// ─── Counselors ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn deactivated_counselor_is_dropped_from_warnings() {
  let s = store().await;
  let kept = user(&s, "Kept", UserType::Counselor, Some(ProgramType::Aptech)).await;
  let leaving = user(&s, "Leaving", UserType::Counselor, Some(ProgramType::Arena)).await;

  let warnings = KpiEngine::new(&s).warnings(None, None).await.unwrap();
  assert_eq!(warnings.len(), 2);

  let updated = s
    .set_counselor_status(leaving.counselor_id, AccountStatus::Inactive)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.status, AccountStatus::Inactive);
  assert_eq!(
    s.get_counselor(leaving.counselor_id).await.unwrap(),
    Some(updated)
  );

  let warnings = KpiEngine::new(&s).warnings(None, None).await.unwrap();
  assert_eq!(warnings.len(), 1);
  assert_eq!(warnings[0].counselor_id, kept.counselor_id);

  assert!(
    s.set_counselor_status(404, AccountStatus::Active)
      .await
      .unwrap()
      .is_none()
  );
}

// ─── KPI source ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn kpi_queries_respect_scope() {
  let s = store().await;
  let mine = user(&s, "Mine", UserType::Counselor, Some(ProgramType::Aptech)).await;
  let other = user(&s, "Other", UserType::Counselor, Some(ProgramType::ShortTermSteam)).await;
  student(&s, StudentStatus::Lead, Some(mine.counselor_id)).await;
  student(&s, StudentStatus::Engaging, Some(mine.counselor_id)).await;
  student(&s, StudentStatus::Registered, Some(other.counselor_id)).await;

  let all = s.count_students(&StudentQuery::default()).await.unwrap();
  assert_eq!(all, 3);
  let scoped = StudentQuery {
    assigned_counselor_id: Some(mine.counselor_id),
    statuses: vec![StudentStatus::Lead, StudentStatus::Engaging],
    ..Default::default()
  };
  assert_eq!(s.count_students(&scoped).await.unwrap(), 2);

  let stats = KpiEngine::new(&s)
    .calculate(Some(mine.counselor_id), None, None)
    .await
    .unwrap();
  assert_eq!(stats.statistics.potential.total, 2);
  assert_eq!(stats.statistics.potential.percentage, 100.0);
  assert_eq!(stats.kpi.monthly_target, 25);
  assert!(stats.kpi.is_warning);

  let overall = KpiEngine::new(&s).overall(None, None).await.unwrap();
  assert_eq!(overall.statistics.registration.count, 1);
  assert_eq!(overall.other_counts.registered, 1);
}

#[tokio::test]
async fn kpi_enrollments_join_counselor_program() {
  let s = store().await;
  let counselor = user(&s, "Dang G", UserType::Counselor, Some(ProgramType::Arena)).await;
  course(&s, "A").await;
  let id = student(&s, StudentStatus::Registered, Some(counselor.counselor_id)).await;

  let update = StudentUpdate {
    enrolled_courses: courses(&["A"]),
    ..Default::default()
  };
  s.update_consulting_information(id, update, counselor.counselor_id)
    .await
    .unwrap();

  let stats = KpiEngine::new(&s).overall(None, None).await.unwrap();
  assert_eq!(stats.statistics.enrollments.count, 1);
  assert_eq!(stats.details.enrollments_by_program.get("Arena"), Some(&1));

  let warnings = KpiEngine::new(&s).warnings(None, None).await.unwrap();
  assert_eq!(warnings.len(), 1);
  assert_eq!(warnings[0].counselor_id, counselor.counselor_id);
  assert_eq!(warnings[0].performance_rate, 4.0);
}
