//! KPI aggregation engine.
//!
//! Read-only: every figure is computed from [`KpiSource`] queries over an
//! inclusive calendar-date window and compared against the same window
//! shifted back one calendar month.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{
  counselor::{Counselor, ProgramType, UserType},
  store::{EnrollmentQuery, EnrollmentRecord, KpiSource, StudentQuery, TimeRange},
  student::StudentStatus,
  Error,
};

/// Performance below this percentage of the monthly target raises a warning.
pub const WARNING_THRESHOLD: f64 = 80.0;

// ─── Window ──────────────────────────────────────────────────────────────────

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
  #[serde(rename = "startDate")]
  pub start: NaiveDate,
  #[serde(rename = "endDate")]
  pub end:   NaiveDate,
}

impl DateWindow {
  /// The requested window, or the calendar month containing `today` when
  /// either bound is missing.
  pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>, today: NaiveDate) -> Self {
    match (start, end) {
      (Some(start), Some(end)) => Self { start, end },
      _ => Self::current_month(today),
    }
  }

  pub fn current_month(today: NaiveDate) -> Self {
    let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
    let end = start
      .checked_add_months(Months::new(1))
      .and_then(|d| d.pred_opt())
      .unwrap_or(today);
    Self { start, end }
  }

  /// Both bounds moved back one calendar month, clamped to month end. For a
  /// window spanning several months the result overlaps the input window.
  pub fn previous_month(&self) -> Self {
    let back = |d: NaiveDate| d.checked_sub_months(Months::new(1)).unwrap_or(NaiveDate::MIN);
    Self {
      start: back(self.start),
      end:   back(self.end),
    }
  }

  /// `[start 00:00Z, end + 1 day 00:00Z)`.
  pub fn to_range(&self) -> TimeRange {
    let until = self.end.succ_opt().unwrap_or(NaiveDate::MAX);
    TimeRange {
      from:  self.start.and_time(NaiveTime::MIN).and_utc(),
      until: until.and_time(NaiveTime::MIN).and_utc(),
    }
  }
}

// ─── Targets & arithmetic ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KpiTargets {
  pub annual:  u32,
  pub monthly: u32,
}

impl KpiTargets {
  /// Overall scope carries no target.
  pub const NONE: Self = Self {
    annual:  0,
    monthly: 0,
  };

  pub fn for_program(program: Option<ProgramType>) -> Self {
    let annual = match program {
      Some(ProgramType::ShortTermSteam) => 1000,
      Some(ProgramType::Aptech | ProgramType::Arena) | None => 300,
    };
    Self {
      annual,
      monthly: (f64::from(annual) / 12.0).round() as u32,
    }
  }
}

/// Round half up to two decimals.
pub fn round2(value: f64) -> f64 { (value * 100.0 + 0.5).floor() / 100.0 }

/// `count / total` as a percentage; 0 when `total` is 0.
pub fn rate(count: u64, total: u64) -> f64 {
  if total == 0 {
    return 0.0;
  }
  round2(count as f64 / total as f64 * 100.0)
}

/// Relative change from `previous` to `current` as a percentage; 0 when there
/// is nothing to compare against.
pub fn trend(current: u64, previous: u64) -> f64 {
  if previous == 0 {
    return 0.0;
  }
  round2((current as f64 - previous as f64) / previous as f64 * 100.0)
}

// ─── Output ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
  pub period:       DateWindow,
  pub counselor:    CounselorScope,
  pub kpi:          KpiProgress,
  pub statistics:   Metrics,
  pub details:      Details,
  pub other_counts: OtherCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounselorScope {
  pub id:           Option<i64>,
  pub program_type: Option<ProgramType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiProgress {
  pub monthly_target:      u32,
  pub annual_target:       u32,
  pub current_enrollments: u64,
  pub performance_rate:    f64,
  pub is_warning:          bool,
  pub warning_message:     Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
  pub consulting:   RateMetric,
  pub registration: RateMetric,
  pub potential:    RateMetric,
  pub enrollments:  CountMetric,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateMetric {
  pub percentage: f64,
  pub count:      u64,
  pub total:      u64,
  pub trend:      f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountMetric {
  pub count: u64,
  pub trend: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Details {
  /// Enrollments in the window keyed by the enrolling counselor's program.
  pub enrollments_by_program: BTreeMap<String, u64>,
  pub total_revenue:          f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherCounts {
  /// Current-status counts in scope, independent of the window.
  pub lead:                      u64,
  pub engaging:                  u64,
  pub registered:                u64,
  /// Students with two or more enrollments dated in the window.
  pub multi_enrollment_students: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiWarning {
  pub counselor_id:        i64,
  pub counselor_name:      String,
  pub program_type:        Option<ProgramType>,
  pub current_enrollments: u64,
  pub monthly_target:      u32,
  pub performance_rate:    f64,
  pub warning_message:     String,
}

/// Dashboard projection of the current month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
  pub consulting:   SummaryRate,
  pub registration: SummaryRate,
  pub potential:    SummaryRate,
  pub enrollments:  CountMetric,
  pub kpi_warning:  Option<String>,
  pub other_counts: OtherCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryRate {
  pub percentage: f64,
  pub trend:      f64,
  pub count:      u64,
}

impl From<RateMetric> for SummaryRate {
  fn from(m: RateMetric) -> Self {
    Self {
      percentage: m.percentage,
      trend:      m.trend,
      count:      m.count,
    }
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The raw counts for one window.
struct WindowCounts {
  total:        u64,
  consulting:   u64,
  registration: u64,
  potential:    u64,
  enrollments:  Vec<EnrollmentRecord>,
}

pub struct KpiEngine<'a, S> {
  source: &'a S,
  today:  NaiveDate,
}

impl<'a, S: KpiSource> KpiEngine<'a, S> {
  pub fn new(source: &'a S) -> Self { Self::as_of(source, Utc::now().date_naive()) }

  /// An engine whose default window is the month containing `today`.
  pub fn as_of(source: &'a S, today: NaiveDate) -> Self { Self { source, today } }

  /// Statistics for `counselor_id` over `[start, end]`.
  ///
  /// Only a user of type counselor narrows the scope; any other user, or
  /// `None`, yields overall figures with no target.
  #[instrument(skip(self))]
  pub async fn calculate(
    &self,
    counselor_id: Option<i64>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
  ) -> Result<Statistics, S::Error> {
    let window = DateWindow::resolve(start, end, self.today);

    let user = match counselor_id {
      Some(id) => Some(
        self
          .source
          .get_counselor(id)
          .await?
          .ok_or(Error::CounselorNotFound(id))?,
      ),
      None => None,
    };
    let scoped = user.filter(|u| u.user_type == UserType::Counselor);
    let scope = scoped.as_ref().map(|c| c.counselor_id);
    let program_type = scoped.as_ref().and_then(|c| c.program_type);
    let targets = match &scoped {
      Some(c) => KpiTargets::for_program(c.program_type),
      None => KpiTargets::NONE,
    };

    let current = self.window_counts(scope, window).await?;
    let previous = self.window_counts(scope, window.previous_month()).await?;
    debug!(?window, total = current.total, "window counted");

    let enrollment_count = current.enrollments.len() as u64;
    let performance_rate = if targets.monthly == 0 {
      0.0
    } else {
      round2(enrollment_count as f64 / f64::from(targets.monthly) * 100.0)
    };
    let is_warning = performance_rate < WARNING_THRESHOLD;

    let metric = |count: u64, prev: u64| RateMetric {
      percentage: rate(count, current.total),
      count,
      total: current.total,
      trend: trend(count, prev),
    };
    let statistics = Metrics {
      consulting:   metric(current.consulting, previous.consulting),
      registration: metric(current.registration, previous.registration),
      potential:    metric(current.potential, previous.potential),
      enrollments:  CountMetric {
        count: enrollment_count,
        trend: trend(enrollment_count, previous.enrollments.len() as u64),
      },
    };

    let mut by_program = BTreeMap::new();
    let mut per_student: HashMap<i64, u32> = HashMap::new();
    for e in &current.enrollments {
      let key = e
        .counselor_program_type
        .map_or("Unknown", <&'static str>::from);
      *by_program.entry(key.to_owned()).or_insert(0) += 1;
      *per_student.entry(e.student_id).or_insert(0) += 1;
    }
    let details = Details {
      enrollments_by_program: by_program,
      total_revenue:          current.enrollments.iter().map(|e| e.fee_paid).sum(),
    };

    let other_counts = OtherCounts {
      lead:                      self.count_status(scope, StudentStatus::Lead).await?,
      engaging:                  self.count_status(scope, StudentStatus::Engaging).await?,
      registered:                self.count_status(scope, StudentStatus::Registered).await?,
      multi_enrollment_students: per_student.values().filter(|&&n| n >= 2).count() as u64,
    };

    Ok(Statistics {
      period: window,
      counselor: CounselorScope {
        id: counselor_id,
        program_type,
      },
      kpi: KpiProgress {
        monthly_target: targets.monthly,
        annual_target: targets.annual,
        current_enrollments: enrollment_count,
        performance_rate,
        is_warning,
        warning_message: is_warning.then(|| {
          format!(
            "KPI below monthly target: {enrollment_count} enrollments against a target of {}",
            targets.monthly
          )
        }),
      },
      statistics,
      details,
      other_counts,
    })
  }

  /// Overall figures across every counselor.
  pub async fn overall(
    &self,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
  ) -> Result<Statistics, S::Error> {
    self.calculate(None, start, end).await
  }

  /// Every active counselor whose performance is below the threshold.
  ///
  /// A counselor whose statistics cannot be computed is logged and left out
  /// rather than failing the whole report.
  #[instrument(skip(self))]
  pub async fn warnings(
    &self,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
  ) -> Result<Vec<KpiWarning>, S::Error> {
    let counselors: Vec<Counselor> = self
      .source
      .list_counselors()
      .await?
      .into_iter()
      .filter(Counselor::is_active_counselor)
      .collect();

    let mut warnings = Vec::new();
    for counselor in counselors {
      let stats = match self.calculate(Some(counselor.counselor_id), start, end).await {
        Ok(stats) => stats,
        Err(error) => {
          warn!(counselor_id = counselor.counselor_id, %error, "KPI calculation failed; skipping");
          continue;
        }
      };
      if stats.kpi.is_warning {
        warnings.push(KpiWarning {
          counselor_id:        counselor.counselor_id,
          counselor_name:      counselor.full_name,
          program_type:        counselor.program_type,
          current_enrollments: stats.kpi.current_enrollments,
          monthly_target:      stats.kpi.monthly_target,
          performance_rate:    stats.kpi.performance_rate,
          warning_message:     stats.kpi.warning_message.unwrap_or_default(),
        });
      }
    }
    Ok(warnings)
  }

  /// Current-month dashboard figures.
  pub async fn summary(&self, counselor_id: Option<i64>) -> Result<KpiSummary, S::Error> {
    let stats = self.calculate(counselor_id, None, None).await?;
    Ok(KpiSummary {
      consulting:   stats.statistics.consulting.into(),
      registration: stats.statistics.registration.into(),
      potential:    stats.statistics.potential.into(),
      enrollments:  stats.statistics.enrollments,
      kpi_warning:  stats.kpi.warning_message,
      other_counts: stats.other_counts,
    })
  }

  async fn window_counts(
    &self,
    scope: Option<i64>,
    window: DateWindow,
  ) -> Result<WindowCounts, S::Error> {
    let range = window.to_range();
    let created = StudentQuery {
      assigned_counselor_id: scope,
      created_between: Some(range),
      ..Default::default()
    };
    let changed_to = |status| StudentQuery {
      assigned_counselor_id: scope,
      statuses: vec![status],
      status_changed_between: Some(range),
      ..Default::default()
    };
    let potential = StudentQuery {
      statuses: vec![StudentStatus::Lead, StudentStatus::Engaging],
      ..created.clone()
    };
    let enrollments = EnrollmentQuery {
      counselor_id:     scope,
      enrolled_between: Some(range),
    };

    Ok(WindowCounts {
      total:        self.source.count_students(&created).await?,
      consulting:   self
        .source
        .count_students(&changed_to(StudentStatus::Engaging))
        .await?,
      registration: self
        .source
        .count_students(&changed_to(StudentStatus::Registered))
        .await?,
      potential:    self.source.count_students(&potential).await?,
      enrollments:  self.source.list_enrollments(&enrollments).await?,
    })
  }

  async fn count_status(&self, scope: Option<i64>, status: StudentStatus) -> Result<u64, S::Error> {
    let query = StudentQuery {
      assigned_counselor_id: scope,
      statuses: vec![status],
      ..Default::default()
    };
    self.source.count_students(&query).await
  }
}

/// [`KpiEngine::calculate`] as of today.
pub async fn calculate<S: KpiSource>(
  source: &S,
  counselor_id: Option<i64>,
  start: Option<NaiveDate>,
  end: Option<NaiveDate>,
) -> Result<Statistics, S::Error> {
  KpiEngine::new(source).calculate(counselor_id, start, end).await
}

/// [`KpiEngine::warnings`] as of today.
pub async fn warnings<S: KpiSource>(
  source: &S,
  start: Option<NaiveDate>,
  end: Option<NaiveDate>,
) -> Result<Vec<KpiWarning>, S::Error> {
  KpiEngine::new(source).warnings(start, end).await
}
