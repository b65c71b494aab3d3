use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Employee,
    Manager,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EmployeeStatus {
    Active,
    Inactive,
    OnLeave,
}

/// Roster record. Employees are never hard-deleted; the status field
/// transitions instead.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "7b9886c0-9b6f-4b44-9d1f-0b6ad53a50b1",
    "employee_code": "EMP-001",
    "name": "John Doe",
    "email": "john.doe@company.com",
    "department": "Engineering",
    "role": "employee",
    "team_id": null,
    "joining_date": "2024-01-01T00:00:00Z",
    "status": "active"
}))]
pub struct Employee {
    pub id: Uuid,
    pub employee_code: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: Role,
    pub team_id: Option<Uuid>,
    #[schema(value_type = String, format = "date-time")]
    pub joining_date: DateTime<Utc>,
    pub status: EmployeeStatus,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }
}
