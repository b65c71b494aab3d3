use std::env;
use std::time::Duration;

use dotenvy::dotenv;

use crate::validation::geofence::Region;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    /// Absent means the in-memory backend; set for MySQL.
    pub database_url: Option<String>,
    /// Permitted check-in region. All three GEOFENCE_* variables must be set
    /// for a region to apply; otherwise every well-formed location passes.
    pub geofence: Option<Region>,
    pub store_timeout_ms: u64,

    // Rate limiting
    pub rate_submit_per_min: u32,
    pub rate_read_per_min: u32,

    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
            database_url: env::var("DATABASE_URL").ok(),
            geofence: geofence_from_env(),
            store_timeout_ms: env::var("STORE_TIMEOUT_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .expect("STORE_TIMEOUT_MS must be an integer"),

            rate_submit_per_min: env::var("RATE_SUBMIT_PER_MIN")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .expect("RATE_SUBMIT_PER_MIN must be an integer"),
            rate_read_per_min: env::var("RATE_READ_PER_MIN")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .expect("RATE_READ_PER_MIN must be an integer"),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

fn geofence_from_env() -> Option<Region> {
    let latitude = env::var("GEOFENCE_CENTER_LAT").ok()?;
    let longitude = env::var("GEOFENCE_CENTER_LON").ok()?;
    let radius = env::var("GEOFENCE_RADIUS_M").ok()?;

    Some(Region {
        center_latitude: latitude
            .parse()
            .expect("GEOFENCE_CENTER_LAT must be a number"),
        center_longitude: longitude
            .parse()
            .expect("GEOFENCE_CENTER_LON must be a number"),
        radius_m: radius.parse().expect("GEOFENCE_RADIUS_M must be a number"),
    })
}
