//! Synchronous SQL shared by [`SqliteStore`](crate::SqliteStore) and the
//! transactional [`SqliteTx`](crate::tx::SqliteTx).
//!
//! Every function takes a plain `&Connection`, so it runs equally on the
//! connection itself or inside an open `Transaction`.

use admissions_core::{
  aggregate::StudentAggregate,
  consultation::{ConsultationSession, NewConsultationSession},
  counselor::{AccountStatus, Counselor, NewCounselor},
  enrollment::{
    Course, Enrollment, EnrollmentPatch, InterestedCourse, NewCourse, NewEnrollment,
    NewInterestedCourse,
  },
  history::{NewStatusHistoryEntry, StatusHistoryEntry},
  page::{Page, PageMetadata, PageRequest},
  store::{EnrollmentQuery, EnrollmentRecord, StudentQuery},
  student::{NewStudent, Student},
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter, types::Value};

use crate::{
  encode::{
    COURSE_COLUMNS, ENROLLMENT_COLUMNS, HISTORY_COLUMNS, INTEREST_COLUMNS, RawCounselor,
    RawCourse, RawEnrollment, RawHistory, RawInterest, RawSession, RawStudent, SESSION_COLUMNS,
    STUDENT_COLUMNS, USER_COLUMNS, decode_dt, decode_enum, encode_date, encode_dt, encode_enum,
  },
  Result,
};

/// `?, ?, …` with `n` placeholders.
fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

// ─── Users ───────────────────────────────────────────────────────────────────

pub fn insert_counselor(conn: &Connection, input: &NewCounselor) -> Result<Counselor> {
  conn.execute(
    "INSERT INTO users (full_name, user_type, program_type, status) VALUES (?1, ?2, ?3, ?4)",
    params![
      input.full_name,
      encode_enum(input.user_type),
      input.program_type.map(encode_enum),
      encode_enum(input.status),
    ],
  )?;
  Ok(Counselor {
    counselor_id: conn.last_insert_rowid(),
    full_name:    input.full_name.clone(),
    user_type:    input.user_type,
    program_type: input.program_type,
    status:       input.status,
  })
}

pub fn get_counselor(conn: &Connection, counselor_id: i64) -> Result<Option<Counselor>> {
  let raw = conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
      params![counselor_id],
      RawCounselor::from_row,
    )
    .optional()?;
  raw.map(RawCounselor::into_counselor).transpose()
}

pub fn list_counselors(conn: &Connection) -> Result<Vec<Counselor>> {
  let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY user_id"))?;
  let raws = stmt
    .query_map([], RawCounselor::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawCounselor::into_counselor).collect()
}

/// Returns `false` if no such user exists.
pub fn set_counselor_status(
  conn: &Connection,
  counselor_id: i64,
  status: AccountStatus,
) -> Result<bool> {
  let changed = conn.execute(
    "UPDATE users SET status = ?2 WHERE user_id = ?1",
    params![counselor_id, encode_enum(status)],
  )?;
  Ok(changed > 0)
}

/// First user, by id, whose full name contains `fragment`.
pub fn find_counselor_by_name(conn: &Connection, fragment: &str) -> Result<Option<Counselor>> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {USER_COLUMNS} FROM users WHERE instr(full_name, ?1) > 0 ORDER BY user_id LIMIT 1"
      ),
      params![fragment],
      RawCounselor::from_row,
    )
    .optional()?;
  raw.map(RawCounselor::into_counselor).transpose()
}

// ─── Courses ─────────────────────────────────────────────────────────────────

pub fn insert_course(conn: &Connection, input: &NewCourse) -> Result<Course> {
  conn.execute(
    "INSERT INTO courses (name, description, program_type) VALUES (?1, ?2, ?3)",
    params![input.name, input.description, input.program_type.map(encode_enum)],
  )?;
  Ok(Course {
    course_id:    conn.last_insert_rowid(),
    name:         input.name.clone(),
    description:  input.description.clone(),
    program_type: input.program_type,
  })
}

pub fn list_courses(conn: &Connection) -> Result<Vec<Course>> {
  let mut stmt = conn.prepare(&format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY name"))?;
  let raws = stmt
    .query_map([], RawCourse::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawCourse::into_course).collect()
}

pub fn find_courses_by_name(conn: &Connection, names: &[String]) -> Result<Vec<Course>> {
  if names.is_empty() {
    return Ok(Vec::new());
  }
  let mut stmt = conn.prepare(&format!(
    "SELECT {COURSE_COLUMNS} FROM courses WHERE name IN ({}) ORDER BY course_id",
    placeholders(names.len())
  ))?;
  let raws = stmt
    .query_map(params_from_iter(names), RawCourse::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawCourse::into_course).collect()
}

// ─── Students ────────────────────────────────────────────────────────────────

pub fn insert_student(conn: &Connection, input: &NewStudent, now: DateTime<Utc>) -> Result<i64> {
  let now = encode_dt(now);
  conn.execute(
    "INSERT INTO students (
       student_name, email, phone_number, zalo_phone, link_facebook, date_of_birth, gender,
       current_education_level, high_school_name, city, source, notification_consent,
       current_status, status_change_date, assigned_counselor_id, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?14, ?14)",
    params![
      input.student_name,
      input.email,
      input.phone_number,
      input.zalo_phone,
      input.link_facebook,
      input.date_of_birth.map(encode_date),
      input.gender,
      encode_enum(input.current_education_level),
      input.high_school_name,
      input.city,
      input.source.map(encode_enum),
      encode_enum(input.notification_consent),
      encode_enum(input.current_status),
      now,
      input.assigned_counselor_id,
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

pub fn get_student(conn: &Connection, student_id: i64) -> Result<Option<Student>> {
  let raw = conn
    .query_row(
      &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE student_id = ?1"),
      params![student_id],
      RawStudent::from_row,
    )
    .optional()?;
  raw.map(RawStudent::into_student).transpose()
}

pub fn list_students(
  conn: &Connection,
  counselor_id: Option<i64>,
  request: PageRequest,
) -> Result<Page<Student>> {
  let (filter, values) = match counselor_id {
    Some(id) => (" WHERE assigned_counselor_id = ?", vec![Value::Integer(id)]),
    None => ("", Vec::new()),
  };

  let total: i64 = conn.query_row(
    &format!("SELECT COUNT(*) FROM students{filter}"),
    params_from_iter(values.iter()),
    |r| r.get(0),
  )?;

  let mut stmt = conn.prepare(&format!(
    "SELECT {STUDENT_COLUMNS} FROM students{filter} ORDER BY student_id LIMIT ? OFFSET ?"
  ))?;
  let paging = [
    Value::Integer(i64::from(request.limit)),
    Value::Integer(i64::try_from(request.offset()).unwrap_or(i64::MAX)),
  ];
  let raws = stmt
    .query_map(params_from_iter(values.iter().chain(&paging)), RawStudent::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Page {
    data:     raws
      .into_iter()
      .map(RawStudent::into_student)
      .collect::<Result<_>>()?,
    metadata: PageMetadata::new(request, total.unsigned_abs()),
  })
}

/// Overwrite every mutable column of the student row.
pub fn update_student(conn: &Connection, s: &Student) -> Result<()> {
  conn.execute(
    "UPDATE students SET
       student_name = ?2, email = ?3, phone_number = ?4, zalo_phone = ?5, link_facebook = ?6,
       date_of_birth = ?7, gender = ?8, current_education_level = ?9,
       other_education_level_description = ?10, high_school_name = ?11, city = ?12,
       source = ?13, other_source_description = ?14, notification_consent = ?15,
       other_notification_consent_description = ?16, current_status = ?17,
       status_change_date = ?18, registration_date = ?19, assigned_counselor_id = ?20,
       updated_at = ?21
     WHERE student_id = ?1",
    params![
      s.student_id,
      s.student_name,
      s.email,
      s.phone_number,
      s.zalo_phone,
      s.link_facebook,
      s.date_of_birth.map(encode_date),
      s.gender,
      encode_enum(s.current_education_level),
      s.other_education_level_description,
      s.high_school_name,
      s.city,
      s.source.map(encode_enum),
      s.other_source_description,
      encode_enum(s.notification_consent),
      s.other_notification_consent_description,
      encode_enum(s.current_status),
      s.status_change_date.map(encode_dt),
      s.registration_date.map(encode_dt),
      s.assigned_counselor_id,
      encode_dt(s.updated_at),
    ],
  )?;
  Ok(())
}

/// Load the student with its relations. `history_limit` of `None` returns the
/// whole ledger.
pub fn load_aggregate(
  conn: &Connection,
  student_id: i64,
  history_limit: Option<usize>,
) -> Result<Option<StudentAggregate>> {
  let Some(student) = get_student(conn, student_id)? else {
    return Ok(None);
  };

  let latest_consultation = conn
    .query_row(
      &format!(
        "SELECT {SESSION_COLUMNS} FROM consultation_sessions WHERE student_id = ?1
         ORDER BY session_date DESC, session_id DESC LIMIT 1"
      ),
      params![student_id],
      RawSession::from_row,
    )
    .optional()?
    .map(RawSession::into_session)
    .transpose()?;

  Ok(Some(StudentAggregate {
    student,
    latest_consultation,
    enrollments: enrollments(conn, student_id)?,
    interested_courses: interests(conn, student_id)?,
    status_history: status_history(conn, student_id, history_limit)?,
  }))
}

pub fn enrollments(conn: &Connection, student_id: i64) -> Result<Vec<Enrollment>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {ENROLLMENT_COLUMNS} FROM enrollments e JOIN courses c ON c.course_id = e.course_id
     WHERE e.student_id = ?1 ORDER BY e.enrollment_id"
  ))?;
  let raws = stmt
    .query_map(params![student_id], RawEnrollment::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawEnrollment::into_enrollment).collect()
}

pub fn get_enrollment(conn: &Connection, enrollment_id: i64) -> Result<Option<Enrollment>> {
  let raw = conn
    .query_row(
      &format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM enrollments e JOIN courses c ON c.course_id = e.course_id
         WHERE e.enrollment_id = ?1"
      ),
      params![enrollment_id],
      RawEnrollment::from_row,
    )
    .optional()?;
  raw.map(RawEnrollment::into_enrollment).transpose()
}

/// Apply `patch` to the stored row and return the result, or `None` if the
/// enrollment does not exist.
pub fn update_enrollment(
  conn: &Connection,
  enrollment_id: i64,
  patch: &EnrollmentPatch,
) -> Result<Option<Enrollment>> {
  let Some(mut enrollment) = get_enrollment(conn, enrollment_id)? else {
    return Ok(None);
  };
  patch.apply(&mut enrollment);
  conn.execute(
    "UPDATE enrollments SET fee_paid = ?2, payment_status = ?3, notes = ?4
     WHERE enrollment_id = ?1",
    params![
      enrollment_id,
      enrollment.fee_paid,
      encode_enum(enrollment.payment_status),
      enrollment.notes,
    ],
  )?;
  Ok(Some(enrollment))
}

pub fn delete_enrollment(conn: &Connection, enrollment_id: i64) -> Result<bool> {
  let deleted = conn.execute(
    "DELETE FROM enrollments WHERE enrollment_id = ?1",
    params![enrollment_id],
  )?;
  Ok(deleted > 0)
}

pub fn interests(conn: &Connection, student_id: i64) -> Result<Vec<InterestedCourse>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {INTEREST_COLUMNS} FROM interested_courses i JOIN courses c ON c.course_id = i.course_id
     WHERE i.student_id = ?1 ORDER BY i.interest_id"
  ))?;
  let raws = stmt
    .query_map(params![student_id], RawInterest::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawInterest::into_interest).collect()
}

// ─── Ledger & sessions ───────────────────────────────────────────────────────

/// Ledger entries for a student, newest first.
pub fn status_history(
  conn: &Connection,
  student_id: i64,
  limit: Option<usize>,
) -> Result<Vec<StatusHistoryEntry>> {
  // SQLite treats a negative LIMIT as unbounded.
  let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
  let mut stmt = conn.prepare(&format!(
    "SELECT {HISTORY_COLUMNS} FROM status_history WHERE student_id = ?1
     ORDER BY change_date DESC, history_id DESC LIMIT ?2"
  ))?;
  let raws = stmt
    .query_map(params![student_id, limit], RawHistory::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawHistory::into_entry).collect()
}

pub fn insert_history(
  conn: &Connection,
  entry: &NewStatusHistoryEntry,
) -> Result<StatusHistoryEntry> {
  conn.execute(
    "INSERT INTO status_history
       (student_id, old_status, new_status, change_date, changed_by_user_id, notes)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    params![
      entry.student_id,
      entry.old_status.map(encode_enum),
      encode_enum(entry.new_status),
      encode_dt(entry.change_date),
      entry.changed_by_user_id,
      entry.notes,
    ],
  )?;
  Ok(StatusHistoryEntry {
    entry_id:           conn.last_insert_rowid(),
    student_id:         entry.student_id,
    old_status:         entry.old_status,
    new_status:         entry.new_status,
    change_date:        entry.change_date,
    changed_by_user_id: entry.changed_by_user_id,
    notes:              entry.notes.clone(),
  })
}

/// Every session for a student, newest first.
pub fn sessions(conn: &Connection, student_id: i64) -> Result<Vec<ConsultationSession>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {SESSION_COLUMNS} FROM consultation_sessions WHERE student_id = ?1
     ORDER BY session_date DESC, session_id DESC"
  ))?;
  let raws = stmt
    .query_map(params![student_id], RawSession::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawSession::into_session).collect()
}

pub fn insert_session(
  conn: &Connection,
  s: &NewConsultationSession,
) -> Result<ConsultationSession> {
  conn.execute(
    "INSERT INTO consultation_sessions
       (student_id, counselor_id, session_date, duration_minutes, session_type,
        session_status, notes)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    params![
      s.student_id,
      s.counselor_id,
      encode_dt(s.session_date),
      s.duration_minutes,
      encode_enum(s.session_type),
      encode_enum(s.session_status),
      s.notes,
    ],
  )?;
  Ok(ConsultationSession {
    session_id:       conn.last_insert_rowid(),
    student_id:       s.student_id,
    counselor_id:     s.counselor_id,
    session_date:     s.session_date,
    duration_minutes: s.duration_minutes,
    session_type:     s.session_type,
    session_status:   s.session_status,
    notes:            s.notes.clone(),
  })
}

// ─── Course rows ─────────────────────────────────────────────────────────────

fn delete_course_rows(
  conn: &Connection,
  table: &str,
  student_id: i64,
  course_ids: &[i64],
) -> Result<()> {
  if course_ids.is_empty() {
    return Ok(());
  }
  let sql = format!(
    "DELETE FROM {table} WHERE student_id = ? AND course_id IN ({})",
    placeholders(course_ids.len())
  );
  let values = std::iter::once(student_id).chain(course_ids.iter().copied());
  conn.execute(&sql, params_from_iter(values))?;
  Ok(())
}

pub fn delete_interests(conn: &Connection, student_id: i64, course_ids: &[i64]) -> Result<()> {
  delete_course_rows(conn, "interested_courses", student_id, course_ids)
}

pub fn delete_enrollments(conn: &Connection, student_id: i64, course_ids: &[i64]) -> Result<()> {
  delete_course_rows(conn, "enrollments", student_id, course_ids)
}

/// Existing `(student_id, course_id)` pairs are skipped.
pub fn insert_interests(conn: &Connection, rows: &[NewInterestedCourse]) -> Result<()> {
  let mut stmt = conn.prepare(
    "INSERT OR IGNORE INTO interested_courses (student_id, course_id, interest_date, notes)
     VALUES (?1, ?2, ?3, ?4)",
  )?;
  for row in rows {
    stmt.execute(params![
      row.student_id,
      row.course_id,
      encode_dt(row.interest_date),
      row.notes,
    ])?;
  }
  Ok(())
}

/// Existing `(student_id, course_id)` pairs are skipped.
pub fn insert_enrollments(conn: &Connection, rows: &[NewEnrollment]) -> Result<()> {
  let mut stmt = conn.prepare(
    "INSERT OR IGNORE INTO enrollments
       (student_id, course_id, enrollment_date, fee_paid, payment_status, counselor_id,
        consultation_session_id, notes)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
  )?;
  for row in rows {
    stmt.execute(params![
      row.student_id,
      row.course_id,
      encode_dt(row.enrollment_date),
      row.fee_paid,
      encode_enum(row.payment_status),
      row.counselor_id,
      row.consultation_session_id,
      row.notes,
    ])?;
  }
  Ok(())
}

// ─── KPI reads ───────────────────────────────────────────────────────────────

pub fn count_students(conn: &Connection, query: &StudentQuery) -> Result<u64> {
  let mut clauses: Vec<String> = Vec::new();
  let mut values: Vec<Value> = Vec::new();

  if let Some(id) = query.assigned_counselor_id {
    clauses.push("assigned_counselor_id = ?".into());
    values.push(Value::Integer(id));
  }
  if !query.statuses.is_empty() {
    clauses.push(format!("current_status IN ({})", placeholders(query.statuses.len())));
    values.extend(
      query
        .statuses
        .iter()
        .map(|s| Value::Text(encode_enum(*s).to_owned())),
    );
  }
  if let Some(range) = query.created_between {
    clauses.push("created_at >= ? AND created_at < ?".into());
    values.push(Value::Text(encode_dt(range.from)));
    values.push(Value::Text(encode_dt(range.until)));
  }
  if let Some(range) = query.status_changed_between {
    clauses.push("status_change_date >= ? AND status_change_date < ?".into());
    values.push(Value::Text(encode_dt(range.from)));
    values.push(Value::Text(encode_dt(range.until)));
  }

  let mut sql = String::from("SELECT COUNT(*) FROM students");
  if !clauses.is_empty() {
    sql.push_str(" WHERE ");
    sql.push_str(&clauses.join(" AND "));
  }

  let count: i64 = conn.query_row(&sql, params_from_iter(values), |r| r.get(0))?;
  Ok(count.unsigned_abs())
}

pub fn enrollment_records(
  conn: &Connection,
  query: &EnrollmentQuery,
) -> Result<Vec<EnrollmentRecord>> {
  let mut clauses: Vec<&str> = Vec::new();
  let mut values: Vec<Value> = Vec::new();

  if let Some(id) = query.counselor_id {
    clauses.push("e.counselor_id = ?");
    values.push(Value::Integer(id));
  }
  if let Some(range) = query.enrolled_between {
    clauses.push("e.enrollment_date >= ? AND e.enrollment_date < ?");
    values.push(Value::Text(encode_dt(range.from)));
    values.push(Value::Text(encode_dt(range.until)));
  }

  let mut sql = String::from(
    "SELECT e.student_id, e.counselor_id, e.fee_paid, u.program_type, e.enrollment_date
     FROM enrollments e LEFT JOIN users u ON u.user_id = e.counselor_id",
  );
  if !clauses.is_empty() {
    sql.push_str(" WHERE ");
    sql.push_str(&clauses.join(" AND "));
  }

  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map(params_from_iter(values), |r| {
      Ok((
        r.get::<_, i64>(0)?,
        r.get::<_, i64>(1)?,
        r.get::<_, f64>(2)?,
        r.get::<_, Option<String>>(3)?,
        r.get::<_, String>(4)?,
      ))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  rows
    .into_iter()
    .map(|(student_id, counselor_id, fee_paid, program, date)| {
      Ok(EnrollmentRecord {
        student_id,
        counselor_id,
        fee_paid,
        counselor_program_type: program
          .as_deref()
          .map(|p| decode_enum("program type", p))
          .transpose()?,
        enrollment_date: decode_dt(&date)?,
      })
    })
    .collect()
}
