use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};
use uuid::Uuid;

use super::{EventStore, Roster, StoreError, StoreResult};
use crate::model::attendance::{AttendanceEvent, GeoPoint};
use crate::model::employee::Employee;
use crate::model::team::{Project, Team};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS employees (
    id CHAR(36) PRIMARY KEY,
    employee_code VARCHAR(64) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL,
    department VARCHAR(128) NOT NULL,
    role VARCHAR(16) NOT NULL,
    team_id CHAR(36) NULL,
    joining_date DATETIME(3) NOT NULL,
    status VARCHAR(16) NOT NULL
);
CREATE TABLE IF NOT EXISTS teams (
    id CHAR(36) PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    department VARCHAR(128) NOT NULL,
    manager_id CHAR(36) NOT NULL
);
CREATE TABLE IF NOT EXISTS team_members (
    team_id CHAR(36) NOT NULL,
    employee_id CHAR(36) NOT NULL,
    PRIMARY KEY (team_id, employee_id)
);
CREATE TABLE IF NOT EXISTS team_projects (
    team_id CHAR(36) NOT NULL,
    name VARCHAR(255) NOT NULL,
    description TEXT NULL,
    status VARCHAR(16) NOT NULL
);
CREATE TABLE IF NOT EXISTS attendance_events (
    id CHAR(36) PRIMARY KEY,
    employee_id CHAR(36) NOT NULL,
    timestamp DATETIME(3) NOT NULL,
    event_type VARCHAR(16) NOT NULL,
    longitude DOUBLE NOT NULL,
    latitude DOUBLE NOT NULL,
    method VARCHAR(8) NOT NULL,
    device_info VARCHAR(255) NULL,
    status VARCHAR(16) NOT NULL,
    INDEX idx_employee_time (employee_id, timestamp),
    INDEX idx_time (timestamp)
)
"#;

/// Durable MySQL backend.
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = MySqlPool::connect(database_url).await?;
        for statement in SCHEMA.split(';') {
            if !statement.trim().is_empty() {
                sqlx::query(statement).execute(&pool).await?;
            }
        }
        Ok(Self { pool })
    }
}

fn parse_col<T>(raw: &str, column: &str) -> StoreResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| StoreError::Backend(format!("corrupt {column} column {raw:?}: {e}")))
}

fn event_from_row(row: &MySqlRow) -> StoreResult<AttendanceEvent> {
    Ok(AttendanceEvent {
        id: parse_col(&row.try_get::<String, _>("id")?, "id")?,
        employee_id: parse_col(&row.try_get::<String, _>("employee_id")?, "employee_id")?,
        timestamp: row.try_get("timestamp")?,
        event_type: parse_col(&row.try_get::<String, _>("event_type")?, "event_type")?,
        location: GeoPoint {
            longitude: row.try_get("longitude")?,
            latitude: row.try_get("latitude")?,
        },
        method: parse_col(&row.try_get::<String, _>("method")?, "method")?,
        device_info: row.try_get("device_info")?,
        status: parse_col(&row.try_get::<String, _>("status")?, "status")?,
    })
}

fn employee_from_row(row: &MySqlRow) -> StoreResult<Employee> {
    let team_id: Option<String> = row.try_get("team_id")?;
    Ok(Employee {
        id: parse_col(&row.try_get::<String, _>("id")?, "id")?,
        employee_code: row.try_get("employee_code")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        department: row.try_get("department")?,
        role: parse_col(&row.try_get::<String, _>("role")?, "role")?,
        team_id: team_id.map(|id| parse_col(&id, "team_id")).transpose()?,
        joining_date: row.try_get("joining_date")?,
        status: parse_col(&row.try_get::<String, _>("status")?, "status")?,
    })
}

fn is_duplicate_key(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().as_deref() == Some("23000");
    }
    false
}

#[async_trait]
impl EventStore for MySqlStore {
    async fn insert_event(&self, event: AttendanceEvent) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO attendance_events
            (id, employee_id, timestamp, event_type, longitude, latitude, method, device_info, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.id.to_string())
        .bind(event.employee_id.to_string())
        .bind(event.timestamp)
        .bind(event.event_type.to_string())
        .bind(event.location.longitude)
        .bind(event.location.latitude)
        .bind(event.method.to_string())
        .bind(event.device_info)
        .bind(event.status.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn latest_valid_event(&self, employee_id: Uuid) -> StoreResult<Option<AttendanceEvent>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM attendance_events
            WHERE employee_id = ? AND status = 'valid'
            ORDER BY timestamp DESC
            LIMIT 1
            "#,
        )
        .bind(employee_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(event_from_row).transpose()
    }

    async fn count_valid_check_ins(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        employees: Option<&[Uuid]>,
    ) -> StoreResult<u64> {
        let mut builder: QueryBuilder<MySql> = QueryBuilder::new(
            "SELECT COUNT(*) AS n FROM attendance_events \
             WHERE status = 'valid' AND event_type = 'check_in' AND timestamp BETWEEN ",
        );
        builder.push_bind(start);
        builder.push(" AND ");
        builder.push_bind(end);

        if let Some(ids) = employees {
            if ids.is_empty() {
                return Ok(0);
            }
            builder.push(" AND employee_id IN (");
            let mut separated = builder.separated(", ");
            for id in ids {
                separated.push_bind(id.to_string());
            }
            builder.push(")");
        }

        let row = builder.build().fetch_one(&self.pool).await?;
        Ok(row.try_get::<i64, _>("n")? as u64)
    }

    async fn daily_check_in_counts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<(NaiveDate, u64)>> {
        let rows = sqlx::query(
            r#"
            SELECT DATE(timestamp) AS day, COUNT(*) AS n
            FROM attendance_events
            WHERE status = 'valid' AND event_type = 'check_in' AND timestamp BETWEEN ? AND ?
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok((
                    row.try_get::<NaiveDate, _>("day")?,
                    row.try_get::<i64, _>("n")? as u64,
                ))
            })
            .collect()
    }

    async fn recent_events(&self, limit: usize) -> StoreResult<Vec<AttendanceEvent>> {
        let rows = sqlx::query("SELECT * FROM attendance_events ORDER BY timestamp DESC LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(event_from_row).collect()
    }
}

#[async_trait]
impl Roster for MySqlStore {
    async fn insert_employee(&self, employee: Employee) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees
            (id, employee_code, name, email, department, role, team_id, joining_date, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(employee.id.to_string())
        .bind(&employee.employee_code)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.department)
        .bind(employee.role.to_string())
        .bind(employee.team_id.map(|id| id.to_string()))
        .bind(employee.joining_date)
        .bind(employee.status.to_string())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate(format!(
                "employee code {} already exists",
                employee.employee_code
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_code(&self, employee_code: &str) -> StoreResult<Option<Employee>> {
        let row = sqlx::query("SELECT * FROM employees WHERE employee_code = ?")
            .bind(employee_code)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(employee_from_row).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Employee>> {
        let row = sqlx::query("SELECT * FROM employees WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(employee_from_row).transpose()
    }

    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        let rows = sqlx::query("SELECT * FROM employees ORDER BY employee_code")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(employee_from_row).collect()
    }

    async fn count_active(&self) -> StoreResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM employees WHERE status = 'active'")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("n")? as u64)
    }

    async fn departments(&self) -> StoreResult<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT department FROM employees ORDER BY department")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| Ok(row.try_get::<String, _>("department")?))
            .collect()
    }

    async fn employees_in_department(&self, department: &str) -> StoreResult<Vec<Employee>> {
        let rows = sqlx::query("SELECT * FROM employees WHERE department = ?")
            .bind(department)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(employee_from_row).collect()
    }

    async fn insert_team(&self, team: Team) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO teams (id, name, department, manager_id) VALUES (?, ?, ?, ?)")
            .bind(team.id.to_string())
            .bind(&team.name)
            .bind(&team.department)
            .bind(team.manager_id.to_string())
            .execute(&mut *tx)
            .await?;

        for member_id in &team.member_ids {
            sqlx::query("INSERT INTO team_members (team_id, employee_id) VALUES (?, ?)")
                .bind(team.id.to_string())
                .bind(member_id.to_string())
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE employees SET team_id = ? WHERE id = ?")
                .bind(team.id.to_string())
                .bind(member_id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        for project in &team.projects {
            sqlx::query(
                "INSERT INTO team_projects (team_id, name, description, status) VALUES (?, ?, ?, ?)",
            )
            .bind(team.id.to_string())
            .bind(&project.name)
            .bind(&project.description)
            .bind(project.status.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_teams(&self) -> StoreResult<Vec<Team>> {
        let team_rows = sqlx::query("SELECT * FROM teams ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        let mut teams = Vec::with_capacity(team_rows.len());
        for row in &team_rows {
            let id: Uuid = parse_col(&row.try_get::<String, _>("id")?, "id")?;

            let member_rows =
                sqlx::query("SELECT employee_id FROM team_members WHERE team_id = ?")
                    .bind(id.to_string())
                    .fetch_all(&self.pool)
                    .await?;
            let member_ids = member_rows
                .iter()
                .map(|r| parse_col(&r.try_get::<String, _>("employee_id")?, "employee_id"))
                .collect::<StoreResult<Vec<Uuid>>>()?;

            let project_rows =
                sqlx::query("SELECT name, description, status FROM team_projects WHERE team_id = ?")
                    .bind(id.to_string())
                    .fetch_all(&self.pool)
                    .await?;
            let projects = project_rows
                .iter()
                .map(|r| {
                    Ok(Project {
                        name: r.try_get("name")?,
                        description: r.try_get("description")?,
                        status: parse_col(&r.try_get::<String, _>("status")?, "status")?,
                    })
                })
                .collect::<StoreResult<Vec<Project>>>()?;

            teams.push(Team {
                id,
                name: row.try_get("name")?,
                department: row.try_get("department")?,
                manager_id: parse_col(&row.try_get::<String, _>("manager_id")?, "manager_id")?,
                member_ids,
                projects,
            });
        }
        Ok(teams)
    }
}
