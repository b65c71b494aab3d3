use crate::{
    api::{analytics, attendance, employee, team},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-scope limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/attendance")
                    .wrap(build_limiter(config.rate_submit_per_min))
                    .service(
                        web::resource("/face")
                            .route(web::post().to(attendance::mark_attendance_face)),
                    )
                    .service(
                        web::resource("/qr").route(web::post().to(attendance::mark_attendance_qr)),
                    ),
            )
            .service(
                web::scope("/analytics")
                    .wrap(build_limiter(config.rate_read_per_min))
                    .service(web::resource("/stats").route(web::get().to(analytics::stats)))
                    .service(
                        web::resource("/attendance-trend")
                            .route(web::get().to(analytics::attendance_trend)),
                    )
                    .service(
                        web::resource("/recent-activity")
                            .route(web::get().to(analytics::recent_activity)),
                    )
                    .service(
                        web::resource("/department-stats")
                            .route(web::get().to(analytics::department_stats)),
                    )
                    .service(
                        web::resource("/team-performance")
                            .route(web::get().to(analytics::team_performance)),
                    ),
            )
            .service(
                web::scope("/employees")
                    .wrap(build_limiter(config.rate_read_per_min))
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::register_employee))
                            .route(web::get().to(employee::list_employees)),
                    ),
            )
            .service(
                web::scope("/team")
                    .wrap(build_limiter(config.rate_read_per_min))
                    .service(
                        web::resource("/teams")
                            .route(web::get().to(team::list_teams))
                            .route(web::post().to(team::create_team)),
                    ),
            ),
    );
}
