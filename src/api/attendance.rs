use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::model::attendance::{AttendanceEvent, CaptureMethod, EventStatus, EventType, GeoPoint};
use crate::recorder::{Recorder, Submission};

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct LocationDto {
    #[schema(example = 23.8103)]
    pub latitude: f64,
    #[schema(example = 90.4125)]
    pub longitude: f64,
}

impl From<LocationDto> for GeoPoint {
    fn from(loc: LocationDto) -> Self {
        GeoPoint {
            longitude: loc.longitude,
            latitude: loc.latitude,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct FaceSubmission {
    #[schema(example = "EMP-001")]
    pub employee_id: String,
    /// Raw capture payload. Only its presence is validated; biometric
    /// matching happens elsewhere.
    pub face_image: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub location: Option<LocationDto>,
    pub device_info: Option<String>,
    /// Event time. Defaults to server receipt time.
    #[schema(value_type = Option<String>, format = "date-time")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize, ToSchema)]
pub struct QrSubmission {
    #[schema(example = "EMP-001")]
    pub employee_id: String,
    /// Raw QR payload. Only its presence is validated.
    pub qr_data: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub location: Option<LocationDto>,
    pub device_info: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub timestamp: Option<DateTime<Utc>>,
}

fn require_location(location: Option<LocationDto>) -> Result<GeoPoint, AppError> {
    location
        .map(GeoPoint::from)
        .ok_or_else(|| AppError::Validation("location is required".to_string()))
}

fn require_payload(payload: &str, what: &str) -> Result<(), AppError> {
    if payload.trim().is_empty() {
        return Err(AppError::Validation(format!("{what} is required")));
    }
    Ok(())
}

fn recorded_response(event: &AttendanceEvent) -> HttpResponse {
    let message = match event.status {
        EventStatus::Valid => "Attendance marked successfully",
        _ => "Attendance recorded as invalid",
    };
    HttpResponse::Ok().json(json!({
        "message": message,
        "status": event.status,
        "timestamp": event.timestamp,
    }))
}

/// Face capture check-in/check-out
#[utoipa::path(
    post,
    path = "/api/attendance/face",
    request_body = FaceSubmission,
    responses(
        (status = 200, description = "Event recorded; status reflects validation outcome", body = Object, example = json!({
            "message": "Attendance marked successfully",
            "status": "valid",
            "timestamp": "2026-08-29T09:00:00Z"
        })),
        (status = 400, description = "Malformed submission"),
        (status = 404, description = "Unknown or inactive employee"),
        (status = 500, description = "Storage failure"),
        (status = 504, description = "Storage deadline exceeded")
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance_face(
    recorder: web::Data<Recorder>,
    payload: web::Json<FaceSubmission>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();
    require_payload(&payload.face_image, "face image payload")?;
    let location = require_location(payload.location)?;

    let event = recorder
        .submit(Submission {
            employee_code: payload.employee_id,
            timestamp: payload.timestamp,
            event_type: payload.event_type,
            location,
            method: CaptureMethod::Face,
            device_info: payload.device_info,
        })
        .await?;
    Ok(recorded_response(&event))
}

/// QR code check-in/check-out
#[utoipa::path(
    post,
    path = "/api/attendance/qr",
    request_body = QrSubmission,
    responses(
        (status = 200, description = "Event recorded; status reflects validation outcome", body = Object, example = json!({
            "message": "Attendance marked successfully",
            "status": "valid",
            "timestamp": "2026-08-29T09:00:00Z"
        })),
        (status = 400, description = "Malformed submission"),
        (status = 404, description = "Unknown or inactive employee"),
        (status = 500, description = "Storage failure"),
        (status = 504, description = "Storage deadline exceeded")
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance_qr(
    recorder: web::Data<Recorder>,
    payload: web::Json<QrSubmission>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();
    require_payload(&payload.qr_data, "qr payload")?;
    let location = require_location(payload.location)?;

    let event = recorder
        .submit(Submission {
            employee_code: payload.employee_id,
            timestamp: payload.timestamp,
            event_type: payload.event_type,
            location,
            method: CaptureMethod::Qr,
            device_info: payload.device_info,
        })
        .await?;
    Ok(recorded_response(&event))
}
