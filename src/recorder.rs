use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{AppError, with_deadline};
use crate::model::attendance::{
    AttendanceEvent, CaptureMethod, EventStatus, EventType, GeoPoint,
};
use crate::model::employee::EmployeeStatus;
use crate::store::{EventStore, Roster};
use crate::validation::geofence::{self, GeofenceStatus, Region};
use crate::validation::sequencing::SequenceState;

/// One submitted check-in/check-out attempt.
#[derive(Debug, Clone)]
pub struct Submission {
    pub employee_code: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub event_type: EventType,
    pub location: GeoPoint,
    pub method: CaptureMethod,
    pub device_info: Option<String>,
}

/// Single entry point for attendance writes. Runs geofence and sequencing
/// checks under a per-employee lock, then persists the event unconditionally
/// so rejected attempts stay observable.
#[derive(Clone)]
pub struct Recorder {
    events: Arc<dyn EventStore>,
    roster: Arc<dyn Roster>,
    region: Option<Region>,
    deadline: Duration,
    // Per-employee serialization of the read-validate-write sequence. Two
    // concurrent submits for one employee must not both observe the same
    // sequencing state. Idle entries age out; an in-flight submit keeps its
    // entry fresh.
    locks: Cache<Uuid, Arc<Mutex<()>>>,
}

impl Recorder {
    pub fn new(
        events: Arc<dyn EventStore>,
        roster: Arc<dyn Roster>,
        region: Option<Region>,
        deadline: Duration,
    ) -> Self {
        Self {
            events,
            roster,
            region,
            deadline,
            locks: Cache::builder()
                .max_capacity(100_000)
                .time_to_idle(Duration::from_secs(600))
                .build(),
        }
    }

    pub async fn submit(&self, submission: Submission) -> Result<AttendanceEvent, AppError> {
        let employee = with_deadline(
            self.deadline,
            self.roster.find_by_code(&submission.employee_code),
        )
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "unknown employee {}",
                submission.employee_code
            ))
        })?;
        if employee.status == EmployeeStatus::Inactive {
            return Err(AppError::NotFound(format!(
                "employee {} is inactive",
                submission.employee_code
            )));
        }

        let lock = self
            .locks
            .get_with(employee.id, async { Arc::new(Mutex::new(())) })
            .await;
        let _guard = lock.lock().await;

        let geofence_ok =
            geofence::check(self.region.as_ref(), submission.location) == GeofenceStatus::Valid;

        let timestamp = submission.timestamp.unwrap_or_else(Utc::now);
        let latest = with_deadline(self.deadline, self.events.latest_valid_event(employee.id))
            .await?;
        let state = SequenceState::from_latest(latest.as_ref().map(|e| e.event_type));
        // A client-supplied timestamp must land strictly after the latest
        // valid event, otherwise the valid sequence would no longer alternate
        // when read back in timestamp order.
        let sequence_ok = state.admits(submission.event_type)
            && latest.is_none_or(|e| timestamp > e.timestamp);

        let status = if geofence_ok && sequence_ok {
            EventStatus::Valid
        } else {
            EventStatus::Invalid
        };

        let event = AttendanceEvent {
            id: Uuid::new_v4(),
            employee_id: employee.id,
            timestamp,
            event_type: submission.event_type,
            location: submission.location,
            method: submission.method,
            device_info: submission.device_info,
            status,
        };
        with_deadline(self.deadline, self.events.insert_event(event.clone())).await?;

        match status {
            EventStatus::Valid => info!(
                employee = %submission.employee_code,
                event_type = %event.event_type,
                method = %event.method,
                "Attendance recorded"
            ),
            _ => warn!(
                employee = %submission.employee_code,
                event_type = %event.event_type,
                geofence_ok,
                sequence_ok,
                "Attendance recorded as invalid"
            ),
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::{Employee, Role};
    use crate::store::memory::MemoryStore;

    const OFFICE_LAT: f64 = 23.8103;
    const OFFICE_LON: f64 = 90.4125;

    fn office() -> GeoPoint {
        GeoPoint {
            longitude: OFFICE_LON,
            latitude: OFFICE_LAT,
        }
    }

    fn submission(code: &str, event_type: EventType, location: GeoPoint) -> Submission {
        Submission {
            employee_code: code.to_string(),
            timestamp: None,
            event_type,
            location,
            method: CaptureMethod::Face,
            device_info: Some("test-device".to_string()),
        }
    }

    async fn recorder_with(
        region: Option<Region>,
        statuses: &[(&str, EmployeeStatus)],
    ) -> (Recorder, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        for (code, status) in statuses {
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
                    status: *status,
                })
                .await
                .unwrap();
        }
        let recorder = Recorder::new(
            store.clone(),
            store.clone(),
            region,
            Duration::from_secs(5),
        );
        (recorder, store)
    }

    #[actix_web::test]
    async fn double_check_in_yields_one_valid_one_invalid_both_persisted() {
        let (recorder, store) =
            recorder_with(None, &[("EMP-001", EmployeeStatus::Active)]).await;

        let first = recorder
            .submit(submission("EMP-001", EventType::CheckIn, office()))
            .await
            .unwrap();
        let second = recorder
            .submit(submission("EMP-001", EventType::CheckIn, office()))
            .await
            .unwrap();

        assert_eq!(first.status, EventStatus::Valid);
        assert_eq!(second.status, EventStatus::Invalid);
        assert_eq!(store.recent_events(10).await.unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn check_out_without_prior_check_in_is_invalid() {
        let (recorder, _) = recorder_with(None, &[("EMP-001", EmployeeStatus::Active)]).await;
        let event = recorder
            .submit(submission("EMP-001", EventType::CheckOut, office()))
            .await
            .unwrap();
        assert_eq!(event.status, EventStatus::Invalid);
    }

    #[actix_web::test]
    async fn valid_events_strictly_alternate() {
        let (recorder, _) = recorder_with(None, &[("EMP-001", EmployeeStatus::Active)]).await;
        for expected in [EventType::CheckIn, EventType::CheckOut, EventType::CheckIn] {
            let event = recorder
                .submit(submission("EMP-001", expected, office()))
                .await
                .unwrap();
            assert_eq!(event.status, EventStatus::Valid);
        }
        // Fourth check-in breaks the alternation.
        let event = recorder
            .submit(submission("EMP-001", EventType::CheckIn, office()))
            .await
            .unwrap();
        assert_eq!(event.status, EventStatus::Invalid);
    }

    #[actix_web::test]
    async fn backdated_check_out_cannot_precede_a_valid_check_in() {
        let (recorder, store) =
            recorder_with(None, &[("EMP-001", EmployeeStatus::Active)]).await;

        let check_in = recorder
            .submit(submission("EMP-001", EventType::CheckIn, office()))
            .await
            .unwrap();

        let mut backdated = submission("EMP-001", EventType::CheckOut, office());
        backdated.timestamp = Some(check_in.timestamp - chrono::Duration::hours(1));
        let event = recorder.submit(backdated).await.unwrap();
        assert_eq!(event.status, EventStatus::Invalid);

        // Valid events read back in timestamp order still alternate.
        let mut valid: Vec<_> = store
            .recent_events(10)
            .await
            .unwrap()
            .into_iter()
            .filter(|e| e.status == EventStatus::Valid)
            .collect();
        valid.sort_by_key(|e| e.timestamp);
        assert_eq!(
            valid.iter().map(|e| e.event_type).collect::<Vec<_>>(),
            vec![EventType::CheckIn]
        );

        // A current check-out still closes the open interval.
        let event = recorder
            .submit(submission("EMP-001", EventType::CheckOut, office()))
            .await
            .unwrap();
        assert_eq!(event.status, EventStatus::Valid);
    }

    #[actix_web::test]
    async fn unknown_and_inactive_employees_are_not_found() {
        let (recorder, store) =
            recorder_with(None, &[("EMP-002", EmployeeStatus::Inactive)]).await;

        let err = recorder
            .submit(submission("NOBODY", EventType::CheckIn, office()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = recorder
            .submit(submission("EMP-002", EventType::CheckIn, office()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // Neither attempt was persisted.
        assert!(store.recent_events(10).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn on_leave_employee_can_still_record() {
        let (recorder, _) = recorder_with(None, &[("EMP-003", EmployeeStatus::OnLeave)]).await;
        let event = recorder
            .submit(submission("EMP-003", EventType::CheckIn, office()))
            .await
            .unwrap();
        assert_eq!(event.status, EventStatus::Valid);
    }

    #[actix_web::test]
    async fn geofence_rejection_is_persisted_as_invalid() {
        let region = Region {
            center_latitude: OFFICE_LAT,
            center_longitude: OFFICE_LON,
            radius_m: 100.0,
        };
        let (recorder, store) =
            recorder_with(Some(region), &[("EMP-001", EmployeeStatus::Active)]).await;

        let far_away = GeoPoint {
            longitude: OFFICE_LON + 1.0,
            latitude: OFFICE_LAT,
        };
        let event = recorder
            .submit(submission("EMP-001", EventType::CheckIn, far_away))
            .await
            .unwrap();
        assert_eq!(event.status, EventStatus::Invalid);
        assert_eq!(store.recent_events(10).await.unwrap().len(), 1);

        // The invalid attempt did not advance the state machine.
        let event = recorder
            .submit(submission("EMP-001", EventType::CheckIn, office()))
            .await
            .unwrap();
        assert_eq!(event.status, EventStatus::Valid);
    }

    #[actix_web::test]
    async fn concurrent_check_ins_are_serialized_per_employee() {
        let (recorder, store) =
            recorder_with(None, &[("EMP-001", EmployeeStatus::Active)]).await;

        let (a, b) = tokio::join!(
            recorder.submit(submission("EMP-001", EventType::CheckIn, office())),
            recorder.submit(submission("EMP-001", EventType::CheckIn, office())),
        );
        let statuses = [a.unwrap().status, b.unwrap().status];
        assert_eq!(
            statuses.iter().filter(|s| **s == EventStatus::Valid).count(),
            1
        );
        assert_eq!(store.recent_events(10).await.unwrap().len(), 2);
    }
}
