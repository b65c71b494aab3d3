use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::{AppError, with_deadline};
use crate::model::attendance::{CaptureMethod, EventStatus, EventType, GeoPoint};
use crate::store::{EventStore, Roster};

/// Assumed working days per month, the denominator of the global rate.
const WORKING_DAYS_PER_MONTH: u64 = 22;
const RATE_WINDOW_DAYS: i64 = 30;
const RECENT_ACTIVITY_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Period {
    #[default]
    Week,
    Month,
    Quarter,
}

impl Period {
    fn days(self) -> i64 {
        match self {
            Period::Week => 7,
            Period::Month => 30,
            Period::Quarter => 90,
        }
    }

    /// Unknown or absent period names fall back to `week`.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_employees: u64,
    pub present_today: u64,
    pub attendance_rate: i64,
    pub department_stats: Vec<DepartmentStat>,
    pub team_performance: Vec<TeamPerformance>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentStat {
    pub department: String,
    pub total_employees: u64,
    pub present_today: u64,
    pub attendance_rate: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamPerformance {
    pub team_name: String,
    pub total_members: u64,
    pub present_today: u64,
    pub attendance_rate: i64,
}

/// Parallel ordered sequences: one entry per calendar day in the requested
/// range, zero-filled for days with no check-ins.
#[derive(Debug, Serialize, ToSchema)]
pub struct TrendSeries {
    pub dates: Vec<String>,
    pub counts: Vec<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityEntry {
    pub employee: String,
    pub department: String,
    pub action: String,
    pub time: String,
    pub location: GeoPoint,
    pub method: CaptureMethod,
    pub status: EventStatus,
}

/// Rate policy, defined once: a zero denominator yields 0, never an error.
/// The result is not clamped and may exceed 100.
fn rate(numerator: u64, denominator: u64) -> i64 {
    if denominator == 0 {
        0
    } else {
        (100.0 * numerator as f64 / denominator as f64).round() as i64
    }
}

fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn day_end(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_milli_opt(23, 59, 59, 999)
        .expect("in-range wall-clock time")
        .and_utc()
}

fn today_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    (day_start(today), day_end(today))
}

/// `[now - N days at start-of-day, now at end-of-day]`, both ends inclusive.
fn period_range(now: DateTime<Utc>, period: Period) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    (
        day_start(today - chrono::Duration::days(period.days())),
        day_end(today),
    )
}

fn fill_gaps(start: NaiveDate, end: NaiveDate, rows: &[(NaiveDate, u64)]) -> TrendSeries {
    let by_day: HashMap<NaiveDate, u64> = rows.iter().copied().collect();
    let mut dates = Vec::new();
    let mut counts = Vec::new();
    let mut day = start;
    while day <= end {
        dates.push(day.format("%Y-%m-%d").to_string());
        counts.push(by_day.get(&day).copied().unwrap_or(0));
        day = day.succ_opt().expect("date within supported range");
    }
    TrendSeries { dates, counts }
}

/// Read-only aggregation over the event log and the roster snapshot. An
/// in-flight write may or may not be reflected; dashboards are refresh-driven.
#[derive(Clone)]
pub struct Analytics {
    events: Arc<dyn EventStore>,
    roster: Arc<dyn Roster>,
    deadline: Duration,
}

impl Analytics {
    pub fn new(events: Arc<dyn EventStore>, roster: Arc<dyn Roster>, deadline: Duration) -> Self {
        Self {
            events,
            roster,
            deadline,
        }
    }

    /// Global snapshot. Sub-computations run concurrently and fail the whole
    /// request if any one of them fails.
    pub async fn global_stats(&self, now: DateTime<Utc>) -> Result<GlobalStats, AppError> {
        let (total_employees, present_today, attendance_rate, department_stats, team_performance) =
            futures::try_join!(
                self.total_active(),
                self.present_today(now),
                self.attendance_rate(now),
                self.department_stats(now),
                self.team_performance(now),
            )?;
        Ok(GlobalStats {
            total_employees,
            present_today,
            attendance_rate,
            department_stats,
            team_performance,
        })
    }

    async fn total_active(&self) -> Result<u64, AppError> {
        with_deadline(self.deadline, self.roster.count_active()).await
    }

    async fn present_today(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let (start, end) = today_bounds(now);
        with_deadline(self.deadline, self.events.count_valid_check_ins(start, end, None)).await
    }

    /// round(100 x check-ins in the trailing 30 days / (active x 22)).
    async fn attendance_rate(&self, now: DateTime<Utc>) -> Result<i64, AppError> {
        let start = day_start(now.date_naive() - chrono::Duration::days(RATE_WINDOW_DAYS));
        let end = day_end(now.date_naive());
        let check_ins = with_deadline(
            self.deadline,
            self.events.count_valid_check_ins(start, end, None),
        )
        .await?;
        let active = self.total_active().await?;
        Ok(rate(check_ins, active * WORKING_DAYS_PER_MONTH))
    }

    pub async fn attendance_trend(
        &self,
        now: DateTime<Utc>,
        period: Period,
    ) -> Result<TrendSeries, AppError> {
        let (start, end) = period_range(now, period);
        let rows =
            with_deadline(self.deadline, self.events.daily_check_in_counts(start, end)).await?;
        Ok(fill_gaps(start.date_naive(), end.date_naive(), &rows))
    }

    /// Per-department breakdown. `totalEmployees` counts active employees
    /// only; `presentToday` counts today's valid check-ins across all of the
    /// department's employees, matching the source's aggregation.
    pub async fn department_stats(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<DepartmentStat>, AppError> {
        let (start, end) = today_bounds(now);
        let departments = with_deadline(self.deadline, self.roster.departments()).await?;

        let mut stats = Vec::with_capacity(departments.len());
        for department in departments {
            let members = with_deadline(
                self.deadline,
                self.roster.employees_in_department(&department),
            )
            .await?;
            let total = members.iter().filter(|e| e.is_active()).count() as u64;
            let ids: Vec<Uuid> = members.iter().map(|e| e.id).collect();
            let present = with_deadline(
                self.deadline,
                self.events.count_valid_check_ins(start, end, Some(&ids)),
            )
            .await?;
            stats.push(DepartmentStat {
                department,
                total_employees: total,
                present_today: present,
                attendance_rate: rate(present, total),
            });
        }
        Ok(stats)
    }

    pub async fn team_performance(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<TeamPerformance>, AppError> {
        let (start, end) = today_bounds(now);
        let teams = with_deadline(self.deadline, self.roster.list_teams()).await?;

        let mut performance = Vec::with_capacity(teams.len());
        for team in teams {
            let present = with_deadline(
                self.deadline,
                self.events
                    .count_valid_check_ins(start, end, Some(&team.member_ids)),
            )
            .await?;
            let total = team.member_ids.len() as u64;
            performance.push(TeamPerformance {
                team_name: team.name,
                total_members: total,
                present_today: present,
                attendance_rate: rate(present, total),
            });
        }
        Ok(performance)
    }

    /// Audit feed: the latest 20 events, newest first, annotated with the
    /// employee's name and department.
    pub async fn recent_activity(&self) -> Result<Vec<ActivityEntry>, AppError> {
        let events = with_deadline(
            self.deadline,
            self.events.recent_events(RECENT_ACTIVITY_LIMIT),
        )
        .await?;

        let mut feed = Vec::with_capacity(events.len());
        for event in events {
            let employee =
                with_deadline(self.deadline, self.roster.find_by_id(event.employee_id)).await?;
            let (name, department) = match employee {
                Some(e) => (e.name, e.department),
                None => ("unknown".to_string(), "unknown".to_string()),
            };
            feed.push(ActivityEntry {
                employee: name,
                department,
                action: match event.event_type {
                    EventType::CheckIn => "Checked In",
                    EventType::CheckOut => "Checked Out",
                }
                .to_string(),
                time: event.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                location: event.location,
                method: event.method,
                status: event.status,
            });
        }
        Ok(feed)
    }
}
