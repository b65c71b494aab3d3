use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EventStore, Roster, StoreError, StoreResult};
use crate::model::attendance::{AttendanceEvent, EventStatus, EventType};
use crate::model::employee::Employee;
use crate::model::team::Team;

/// In-memory backend. Used for tests and DATABASE_URL-less development runs;
/// contents do not survive a restart.
#[derive(Default)]
pub struct MemoryStore {
    events: RwLock<Vec<AttendanceEvent>>,
    employees: RwLock<Vec<Employee>>,
    teams: RwLock<Vec<Team>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_valid_check_in(event: &AttendanceEvent) -> bool {
    event.status == EventStatus::Valid && event.event_type == EventType::CheckIn
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert_event(&self, event: AttendanceEvent) -> StoreResult<()> {
        self.events.write().await.push(event);
        Ok(())
    }

    async fn latest_valid_event(&self, employee_id: Uuid) -> StoreResult<Option<AttendanceEvent>> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .filter(|e| e.employee_id == employee_id && e.status == EventStatus::Valid)
            .max_by_key(|e| e.timestamp)
            .cloned())
    }

    async fn count_valid_check_ins(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        employees: Option<&[Uuid]>,
    ) -> StoreResult<u64> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .filter(|e| is_valid_check_in(e))
            .filter(|e| e.timestamp >= start && e.timestamp <= end)
            .filter(|e| employees.is_none_or(|ids| ids.contains(&e.employee_id)))
            .count() as u64)
    }

    async fn daily_check_in_counts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<(NaiveDate, u64)>> {
        let events = self.events.read().await;
        let mut buckets: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for event in events
            .iter()
            .filter(|e| is_valid_check_in(e))
            .filter(|e| e.timestamp >= start && e.timestamp <= end)
        {
            *buckets.entry(event.timestamp.date_naive()).or_default() += 1;
        }
        Ok(buckets.into_iter().collect())
    }

    async fn recent_events(&self, limit: usize) -> StoreResult<Vec<AttendanceEvent>> {
        let events = self.events.read().await;
        let mut recent: Vec<AttendanceEvent> = events.clone();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent.truncate(limit);
        Ok(recent)
    }
}

#[async_trait]
impl Roster for MemoryStore {
    async fn insert_employee(&self, employee: Employee) -> StoreResult<()> {
        let mut employees = self.employees.write().await;
        if employees
            .iter()
            .any(|e| e.employee_code == employee.employee_code)
        {
            return Err(StoreError::Duplicate(format!(
                "employee code {} already exists",
                employee.employee_code
            )));
        }
        employees.push(employee);
        Ok(())
    }

    async fn find_by_code(&self, employee_code: &str) -> StoreResult<Option<Employee>> {
        let employees = self.employees.read().await;
        Ok(employees
            .iter()
            .find(|e| e.employee_code == employee_code)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Employee>> {
        let employees = self.employees.read().await;
        Ok(employees.iter().find(|e| e.id == id).cloned())
    }

    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        Ok(self.employees.read().await.clone())
    }

    async fn count_active(&self) -> StoreResult<u64> {
        let employees = self.employees.read().await;
        Ok(employees.iter().filter(|e| e.is_active()).count() as u64)
    }

    async fn departments(&self) -> StoreResult<Vec<String>> {
        let employees = self.employees.read().await;
        let mut departments: Vec<String> =
            employees.iter().map(|e| e.department.clone()).collect();
        departments.sort();
        departments.dedup();
        Ok(departments)
    }

    async fn employees_in_department(&self, department: &str) -> StoreResult<Vec<Employee>> {
        let employees = self.employees.read().await;
        Ok(employees
            .iter()
            .filter(|e| e.department == department)
            .cloned()
            .collect())
    }

    async fn insert_team(&self, team: Team) -> StoreResult<()> {
        let mut employees = self.employees.write().await;
        for employee in employees
            .iter_mut()
            .filter(|e| team.member_ids.contains(&e.id))
        {
            employee.team_id = Some(team.id);
        }
        drop(employees);
        self.teams.write().await.push(team);
        Ok(())
    }

    async fn list_teams(&self) -> StoreResult<Vec<Team>> {
        Ok(self.teams.read().await.clone())
    }
}
