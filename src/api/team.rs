use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::{AppError, with_deadline};
use crate::model::employee::Employee;
use crate::model::team::{Project, ProjectStatus, Team};
use crate::store::Stores;

#[derive(Deserialize, ToSchema)]
pub struct ProjectInput {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateTeam {
    #[schema(example = "Platform")]
    pub name: String,
    #[schema(example = "Engineering")]
    pub department: String,
    /// Employee code of the team manager.
    #[schema(example = "EMP-001")]
    pub manager: String,
    /// Employee codes of the members.
    pub members: Option<Vec<String>>,
    pub projects: Option<Vec<ProjectInput>>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub total_members: usize,
    pub active_members: usize,
    pub active_projects: usize,
    pub completed_projects: usize,
}

#[derive(Serialize, ToSchema)]
pub struct TeamView {
    pub id: Uuid,
    pub name: String,
    pub department: String,
    pub manager_id: Uuid,
    pub member_ids: Vec<Uuid>,
    pub projects: Vec<Project>,
    pub stats: TeamStats,
}

async fn resolve_member_codes(
    stores: &Stores,
    config: &Config,
    codes: &[String],
) -> Result<Vec<Employee>, AppError> {
    let mut members = Vec::with_capacity(codes.len());
    for code in codes {
        let employee =
            with_deadline(config.store_timeout(), stores.roster.find_by_code(code)).await?;
        match employee {
            Some(e) => members.push(e),
            None => {
                return Err(AppError::Validation(
                    "One or more invalid member IDs".to_string(),
                ));
            }
        }
    }
    Ok(members)
}

/// Create a team
#[utoipa::path(
    post,
    path = "/api/team/teams",
    request_body = CreateTeam,
    responses(
        (status = 201, description = "Team created", body = Team),
        (status = 400, description = "Unknown manager or member reference"),
        (status = 500, description = "Storage failure")
    ),
    tag = "Team"
)]
pub async fn create_team(
    stores: web::Data<Stores>,
    config: web::Data<Config>,
    payload: web::Json<CreateTeam>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();

    let manager = with_deadline(
        config.store_timeout(),
        stores.roster.find_by_code(&payload.manager),
    )
    .await?
    .ok_or_else(|| AppError::Validation("Invalid manager ID".to_string()))?;

    let member_codes = payload.members.unwrap_or_default();
    let members = resolve_member_codes(stores.get_ref(), config.get_ref(), &member_codes).await?;

    let team = Team {
        id: Uuid::new_v4(),
        name: payload.name,
        department: payload.department,
        manager_id: manager.id,
        member_ids: members.iter().map(|e| e.id).collect(),
        projects: payload
            .projects
            .unwrap_or_default()
            .into_iter()
            .map(|p| Project {
                name: p.name,
                description: p.description,
                status: p.status.unwrap_or(ProjectStatus::Active),
            })
            .collect(),
    };
    with_deadline(config.store_timeout(), stores.roster.insert_team(team.clone())).await?;

    tracing::info!(team = %team.name, members = team.member_ids.len(), "Team created");
    Ok(HttpResponse::Created().json(team))
}

/// List teams with membership and project counters
#[utoipa::path(
    get,
    path = "/api/team/teams",
    responses(
        (status = 200, description = "All teams", body = [TeamView]),
        (status = 500, description = "Storage failure")
    ),
    tag = "Team"
)]
pub async fn list_teams(
    stores: web::Data<Stores>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let teams = with_deadline(config.store_timeout(), stores.roster.list_teams()).await?;

    let mut views = Vec::with_capacity(teams.len());
    for team in teams {
        let mut active_members = 0;
        for member_id in &team.member_ids {
            let member =
                with_deadline(config.store_timeout(), stores.roster.find_by_id(*member_id))
                    .await?;
            if member.is_some_and(|m| m.is_active()) {
                active_members += 1;
            }
        }
        let stats = TeamStats {
            total_members: team.member_ids.len(),
            active_members,
            active_projects: team
                .projects
                .iter()
                .filter(|p| p.status == ProjectStatus::Active)
                .count(),
            completed_projects: team
                .projects
                .iter()
                .filter(|p| p.status == ProjectStatus::Completed)
                .count(),
        };
        views.push(TeamView {
            id: team.id,
            name: team.name,
            department: team.department,
            manager_id: team.manager_id,
            member_ids: team.member_ids,
            projects: team.projects,
            stats,
        });
    }
    Ok(HttpResponse::Ok().json(views))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::{EmployeeStatus, Role};
    use crate::store::Roster;
    use crate::store::memory::MemoryStore;
    use actix_web::{App, test};
    use chrono::Utc;
    use serde_json::Value;
    use std::sync::Arc;

    fn test_config() -> Config {
        Config {
            server_addr: "127.0.0.1:0".to_string(),
            database_url: None,
            geofence: None,
            store_timeout_ms: 5000,
            rate_submit_per_min: 120,
            rate_read_per_min: 600,
            api_prefix: "/api".to_string(),
        }
    }

    async fn seeded_stores() -> Stores {
        let store = Arc::new(MemoryStore::new());
        for (code, status) in [
            ("MGR-1", EmployeeStatus::Active),
            ("EMP-1", EmployeeStatus::Active),
            ("EMP-2", EmployeeStatus::Inactive),
        ] {
            store
                .insert_employee(Employee {
                    id: Uuid::new_v4(),
                    employee_code: code.to_string(),
                    name: format!("Employee {code}"),
                    email: format!("{code}@company.com"),
                    department: "Eng".to_string(),
                    role: Role::Employee,
                    team_id: None,
                    joining_date: Utc::now(),
                    status,
                })
                .await
                .unwrap();
        }
        Stores {
            events: store.clone(),
            roster: store,
        }
    }

    macro_rules! team_app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(seeded_stores().await))
                    .app_data(web::Data::new(test_config()))
                    .service(
                        web::scope("/api/team").service(
                            web::resource("/teams")
                                .route(web::get().to(list_teams))
                                .route(web::post().to(create_team)),
                        ),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn create_team_then_list_with_stats() {
        let app = team_app!();

        let req = test::TestRequest::post()
            .uri("/api/team/teams")
            .set_json(json!({
                "name": "Platform",
                "department": "Eng",
                "manager": "MGR-1",
                "members": ["EMP-1", "EMP-2"],
                "projects": [
                    { "name": "Rollout", "status": "active" },
                    { "name": "Migration", "status": "completed" }
                ]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);

        let req = test::TestRequest::get().uri("/api/team/teams").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let teams = body.as_array().unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0]["name"], "Platform");
        assert_eq!(teams[0]["stats"]["totalMembers"], 2);
        assert_eq!(teams[0]["stats"]["activeMembers"], 1);
        assert_eq!(teams[0]["stats"]["activeProjects"], 1);
        assert_eq!(teams[0]["stats"]["completedProjects"], 1);
    }

    #[actix_web::test]
    async fn unknown_manager_is_rejected() {
        let app = team_app!();
        let req = test::TestRequest::post()
            .uri("/api/team/teams")
            .set_json(json!({
                "name": "Platform",
                "department": "Eng",
                "manager": "NOBODY"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn unknown_member_is_rejected() {
        let app = team_app!();
        let req = test::TestRequest::post()
            .uri("/api/team/teams")
            .set_json(json!({
                "name": "Platform",
                "department": "Eng",
                "manager": "MGR-1",
                "members": ["GHOST"]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }
}
