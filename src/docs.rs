use crate::analytics::{
    ActivityEntry, DepartmentStat, GlobalStats, Period, TeamPerformance, TrendSeries,
};
use crate::api::attendance::{FaceSubmission, LocationDto, QrSubmission};
use crate::api::employee::RegisterEmployee;
use crate::api::team::{CreateTeam, ProjectInput, TeamStats, TeamView};
use crate::model::attendance::{AttendanceEvent, CaptureMethod, EventStatus, EventType, GeoPoint};
use crate::model::employee::{Employee, EmployeeStatus, Role};
use crate::model::team::{Project, ProjectStatus, Team};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Engine API",
        version = "1.0.0",
        description = r#"
## Attendance Event Validation & Analytics

Records employee presence via face or QR-code check-in/check-out events and
reports attendance analytics.

### Key Features
- **Attendance Recording**
  - Geofence validation against a configured permitted region
  - Strict check-in/check-out alternation per employee
  - Rejected attempts are persisted with status `invalid` for audit
- **Analytics**
  - Global snapshot, department and team breakdowns
  - Gap-filled daily attendance trend (week / month / quarter)
  - Recent activity audit feed
- **Roster**
  - Employee registration and team management

### Response Format
JSON-based RESTful responses; failures use `{"error": "..."}`.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::mark_attendance_face,
        crate::api::attendance::mark_attendance_qr,

        crate::api::analytics::stats,
        crate::api::analytics::attendance_trend,
        crate::api::analytics::recent_activity,
        crate::api::analytics::department_stats,
        crate::api::analytics::team_performance,

        crate::api::employee::register_employee,
        crate::api::employee::list_employees,

        crate::api::team::create_team,
        crate::api::team::list_teams,
    ),
    components(schemas(
        AttendanceEvent,
        EventType,
        EventStatus,
        CaptureMethod,
        GeoPoint,
        Employee,
        Role,
        EmployeeStatus,
        Team,
        Project,
        ProjectStatus,
        FaceSubmission,
        QrSubmission,
        LocationDto,
        RegisterEmployee,
        CreateTeam,
        ProjectInput,
        TeamView,
        TeamStats,
        GlobalStats,
        DepartmentStat,
        TeamPerformance,
        TrendSeries,
        ActivityEntry,
        Period,
    )),
    tags(
        (name = "Attendance", description = "Check-in / check-out submission"),
        (name = "Analytics", description = "Attendance aggregation views"),
        (name = "Employee", description = "Roster registration"),
        (name = "Team", description = "Team management")
    )
)]
pub struct ApiDoc;
