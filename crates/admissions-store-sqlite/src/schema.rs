//! SQL schema for the admissions SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Timestamps are fixed-width RFC 3339 UTC strings, so text comparison orders
/// them chronologically.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Counselors, managers and admins.
CREATE TABLE IF NOT EXISTS users (
    user_id      INTEGER PRIMARY KEY,
    full_name    TEXT NOT NULL,
    user_type    TEXT NOT NULL,   -- 'admin' | 'counselor' | 'manager'
    program_type TEXT,
    status       TEXT NOT NULL DEFAULT 'active'
);

CREATE TABLE IF NOT EXISTS courses (
    course_id    INTEGER PRIMARY KEY,
    name         TEXT NOT NULL UNIQUE,
    description  TEXT,
    program_type TEXT
);

CREATE TABLE IF NOT EXISTS students (
    student_id                             INTEGER PRIMARY KEY,
    student_name                           TEXT NOT NULL,
    email                                  TEXT UNIQUE,
    phone_number                           TEXT NOT NULL,
    zalo_phone                             TEXT,
    link_facebook                          TEXT,
    date_of_birth                          TEXT,     -- YYYY-MM-DD
    gender                                 TEXT NOT NULL DEFAULT '',
    current_education_level                TEXT NOT NULL,
    other_education_level_description      TEXT,
    high_school_name                       TEXT,
    city                                   TEXT,
    source                                 TEXT,
    other_source_description               TEXT,
    notification_consent                   TEXT NOT NULL,
    other_notification_consent_description TEXT,
    current_status                         TEXT NOT NULL,
    status_change_date                     TEXT,
    registration_date                      TEXT,
    assigned_counselor_id                  INTEGER REFERENCES users(user_id),
    created_at                             TEXT NOT NULL,
    updated_at                             TEXT NOT NULL
);

-- Append-only: one row per status transition.
CREATE TABLE IF NOT EXISTS status_history (
    history_id         INTEGER PRIMARY KEY,
    student_id         INTEGER NOT NULL REFERENCES students(student_id),
    old_status         TEXT,
    new_status         TEXT NOT NULL,
    change_date        TEXT NOT NULL,
    changed_by_user_id INTEGER NOT NULL REFERENCES users(user_id),
    notes              TEXT
);

-- Append-only.
CREATE TABLE IF NOT EXISTS consultation_sessions (
    session_id       INTEGER PRIMARY KEY,
    student_id       INTEGER NOT NULL REFERENCES students(student_id),
    counselor_id     INTEGER NOT NULL REFERENCES users(user_id),
    session_date     TEXT NOT NULL,
    duration_minutes INTEGER,
    session_type     TEXT NOT NULL,
    session_status   TEXT NOT NULL,
    notes            TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS enrollments (
    enrollment_id           INTEGER PRIMARY KEY,
    student_id              INTEGER NOT NULL REFERENCES students(student_id),
    course_id               INTEGER NOT NULL REFERENCES courses(course_id),
    enrollment_date         TEXT NOT NULL,
    fee_paid                REAL NOT NULL DEFAULT 0,
    payment_status          TEXT NOT NULL,
    counselor_id            INTEGER NOT NULL REFERENCES users(user_id),
    consultation_session_id INTEGER REFERENCES consultation_sessions(session_id),
    notes                   TEXT,
    UNIQUE (student_id, course_id)
);

CREATE TABLE IF NOT EXISTS interested_courses (
    interest_id   INTEGER PRIMARY KEY,
    student_id    INTEGER NOT NULL REFERENCES students(student_id),
    course_id     INTEGER NOT NULL REFERENCES courses(course_id),
    interest_date TEXT NOT NULL,
    notes         TEXT,
    UNIQUE (student_id, course_id)
);

CREATE INDEX IF NOT EXISTS students_counselor_idx ON students(assigned_counselor_id);
CREATE INDEX IF NOT EXISTS students_created_idx   ON students(created_at);
CREATE INDEX IF NOT EXISTS students_changed_idx   ON students(status_change_date);
CREATE INDEX IF NOT EXISTS history_student_idx    ON status_history(student_id, change_date);
CREATE INDEX IF NOT EXISTS sessions_student_idx   ON consultation_sessions(student_id, session_date);
CREATE INDEX IF NOT EXISTS enrollments_kpi_idx    ON enrollments(counselor_id, enrollment_date);

PRAGMA user_version = 1;
";
