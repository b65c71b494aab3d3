use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::{AppError, with_deadline};
use crate::model::employee::{Employee, EmployeeStatus, Role};
use crate::store::Stores;

#[derive(Deserialize, Serialize, ToSchema)]
pub struct RegisterEmployee {
    #[schema(example = "John Doe")]
    pub name: String,
    /// Unique employee code, the identifier clients submit with events.
    #[schema(example = "EMP-001")]
    pub employee_id: String,
    #[schema(example = "john.doe@company.com", format = "email")]
    pub email: String,
    #[schema(example = "Engineering")]
    pub department: String,
    pub role: Option<Role>,
    pub status: Option<EmployeeStatus>,
}

/// Register an employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = RegisterEmployee,
    responses(
        (status = 201, description = "Employee registered", body = Object, example = json!({
            "message": "User registered successfully",
            "id": "7b9886c0-9b6f-4b44-9d1f-0b6ad53a50b1"
        })),
        (status = 400, description = "Missing fields or duplicate employee code"),
        (status = 500, description = "Storage failure")
    ),
    tag = "Employee"
)]
pub async fn register_employee(
    stores: web::Data<Stores>,
    config: web::Data<Config>,
    payload: web::Json<RegisterEmployee>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();
    if payload.employee_id.trim().is_empty() || payload.name.trim().is_empty() {
        return Err(AppError::Validation(
            "name and employee_id are required".to_string(),
        ));
    }

    let employee = Employee {
        id: Uuid::new_v4(),
        employee_code: payload.employee_id,
        name: payload.name,
        email: payload.email,
        department: payload.department,
        role: payload.role.unwrap_or(Role::Employee),
        team_id: None,
        joining_date: Utc::now(),
        status: payload.status.unwrap_or(EmployeeStatus::Active),
    };
    with_deadline(
        config.store_timeout(),
        stores.roster.insert_employee(employee.clone()),
    )
    .await?;

    tracing::info!(employee = %employee.employee_code, department = %employee.department, "Employee registered");
    Ok(HttpResponse::Created().json(json!({
        "message": "User registered successfully",
        "id": employee.id,
    })))
}

/// List employees
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "All roster records", body = [Employee]),
        (status = 500, description = "Storage failure")
    ),
    tag = "Employee"
)]
pub async fn list_employees(
    stores: web::Data<Stores>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let employees = with_deadline(config.store_timeout(), stores.roster.list_employees()).await?;
    Ok(HttpResponse::Ok().json(employees))
}
