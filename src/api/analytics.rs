use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::analytics::{Analytics, Period};
use crate::errors::AppError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct TrendQuery {
    /// `week`, `month` or `quarter`; anything else falls back to `week`.
    pub period: Option<String>,
}

/// Global snapshot
#[utoipa::path(
    get,
    path = "/api/analytics/stats",
    responses(
        (status = 200, description = "Global attendance snapshot", body = crate::analytics::GlobalStats),
        (status = 500, description = "Storage failure"),
        (status = 504, description = "Storage deadline exceeded")
    ),
    tag = "Analytics"
)]
pub async fn stats(analytics: web::Data<Analytics>) -> Result<HttpResponse, AppError> {
    let snapshot = analytics.global_stats(Utc::now()).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

/// Date-bucketed trend with gap filling
#[utoipa::path(
    get,
    path = "/api/analytics/attendance-trend",
    params(
        ("period" = Option<String>, Query, description = "week | month | quarter, default week")
    ),
    responses(
        (status = 200, description = "Gap-filled daily check-in counts", body = crate::analytics::TrendSeries),
        (status = 500, description = "Storage failure"),
        (status = 504, description = "Storage deadline exceeded")
    ),
    tag = "Analytics"
)]
pub async fn attendance_trend(
    analytics: web::Data<Analytics>,
    query: web::Query<TrendQuery>,
) -> Result<HttpResponse, AppError> {
    let period = Period::parse_lenient(query.period.as_deref());
    let series = analytics.attendance_trend(Utc::now(), period).await?;
    Ok(HttpResponse::Ok().json(series))
}

/// Audit feed of the most recent events
#[utoipa::path(
    get,
    path = "/api/analytics/recent-activity",
    responses(
        (status = 200, description = "Latest 20 events, newest first", body = [crate::analytics::ActivityEntry]),
        (status = 500, description = "Storage failure"),
        (status = 504, description = "Storage deadline exceeded")
    ),
    tag = "Analytics"
)]
pub async fn recent_activity(analytics: web::Data<Analytics>) -> Result<HttpResponse, AppError> {
    let feed = analytics.recent_activity().await?;
    Ok(HttpResponse::Ok().json(feed))
}

/// Per-department breakdown
#[utoipa::path(
    get,
    path = "/api/analytics/department-stats",
    responses(
        (status = 200, description = "Attendance by department", body = [crate::analytics::DepartmentStat]),
        (status = 500, description = "Storage failure"),
        (status = 504, description = "Storage deadline exceeded")
    ),
    tag = "Analytics"
)]
pub async fn department_stats(analytics: web::Data<Analytics>) -> Result<HttpResponse, AppError> {
    let stats = analytics.department_stats(Utc::now()).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// Per-team breakdown
#[utoipa::path(
    get,
    path = "/api/analytics/team-performance",
    responses(
        (status = 200, description = "Attendance by team", body = [crate::analytics::TeamPerformance]),
        (status = 500, description = "Storage failure"),
        (status = 504, description = "Storage deadline exceeded")
    ),
    tag = "Analytics"
)]
pub async fn team_performance(analytics: web::Data<Analytics>) -> Result<HttpResponse, AppError> {
    let performance = analytics.team_performance(Utc::now()).await?;
    Ok(HttpResponse::Ok().json(performance))
}
