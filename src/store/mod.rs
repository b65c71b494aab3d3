pub mod memory;
pub mod mysql;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use uuid::Uuid;

use crate::model::attendance::AttendanceEvent;
use crate::model::employee::Employee;
use crate::model::team::Team;

#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "storage backend error: {}", _0)]
    Backend(String),
    #[display(fmt = "{}", _0)]
    Duplicate(String),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Append-mostly attendance event log. Only the recorder writes; everything
/// else reads.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert_event(&self, event: AttendanceEvent) -> StoreResult<()>;

    /// Most recent event with status `valid` for one employee, by timestamp.
    async fn latest_valid_event(&self, employee_id: Uuid) -> StoreResult<Option<AttendanceEvent>>;

    /// Valid check-in events with timestamp in `[start, end]`, optionally
    /// restricted to a set of employees.
    async fn count_valid_check_ins(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        employees: Option<&[Uuid]>,
    ) -> StoreResult<u64>;

    /// Valid check-in events in `[start, end]` bucketed by UTC calendar day,
    /// ascending. Days with no events are absent.
    async fn daily_check_in_counts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<(NaiveDate, u64)>>;

    /// The most recent events across all employees, newest first.
    async fn recent_events(&self, limit: usize) -> StoreResult<Vec<AttendanceEvent>>;
}

/// Roster snapshot: employees and teams. Populated by the registration and
/// team collaborators, read by the recorder and the aggregation engine.
#[async_trait]
pub trait Roster: Send + Sync {
    async fn insert_employee(&self, employee: Employee) -> StoreResult<()>;
    async fn find_by_code(&self, employee_code: &str) -> StoreResult<Option<Employee>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Employee>>;
    async fn list_employees(&self) -> StoreResult<Vec<Employee>>;
    async fn count_active(&self) -> StoreResult<u64>;
    async fn departments(&self) -> StoreResult<Vec<String>>;
    async fn employees_in_department(&self, department: &str) -> StoreResult<Vec<Employee>>;
    async fn insert_team(&self, team: Team) -> StoreResult<()>;
    async fn list_teams(&self) -> StoreResult<Vec<Team>>;
}

/// Handles to the configured backend, owned by the process entry point and
/// injected into every component.
#[derive(Clone)]
pub struct Stores {
    pub events: Arc<dyn EventStore>,
    pub roster: Arc<dyn Roster>,
}

pub async fn init_store(database_url: Option<&str>) -> anyhow::Result<Stores> {
    match database_url {
        Some(url) => {
            let store = Arc::new(mysql::MySqlStore::connect(url).await?);
            tracing::info!("Using MySQL event store");
            Ok(Stores {
                events: store.clone(),
                roster: store,
            })
        }
        None => {
            let store = Arc::new(memory::MemoryStore::new());
            tracing::warn!("DATABASE_URL not set, using in-memory event store");
            Ok(Stores {
                events: store.clone(),
                roster: store,
            })
        }
    }
}
