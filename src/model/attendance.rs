use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    CheckIn,
    CheckOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CaptureMethod {
    Face,
    Qr,
}

/// `Pending` is reserved for asynchronous confirmation flows; no validated
/// path currently produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventStatus {
    Valid,
    Invalid,
    Pending,
}

/// Geographic coordinate pair, kept in (longitude, latitude) order to stay
/// compatible with geospatial index conventions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    #[schema(example = 90.4125)]
    pub longitude: f64,
    #[schema(example = 23.8103)]
    pub latitude: f64,
}

/// One attendance event. Immutable once stored; the status is fixed at
/// insertion time.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceEvent {
    pub id: Uuid,
    pub employee_id: Uuid,
    #[schema(value_type = String, format = "date-time")]
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub location: GeoPoint,
    pub method: CaptureMethod,
    pub device_info: Option<String>,
    pub status: EventStatus,
}
