use std::future::Future;
use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use derive_more::Display;

use crate::store::StoreError;

/// Structural failures that propagate out of the core to the HTTP layer.
/// Sequencing and geofence outcomes never appear here: they become the stored
/// event's status instead.
#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "{}", _0)]
    Validation(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "storage failure: {}", _0)]
    Storage(String),
    #[display(fmt = "{}", _0)]
    Timeout(&'static str),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(msg) => AppError::Validation(msg),
            StoreError::Backend(msg) => AppError::Storage(msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.to_string() }))
    }
}

/// Bounds a storage call so a stuck backend surfaces as `Timeout` instead of
/// hanging the request.
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => Err(AppError::Timeout("storage call exceeded its deadline")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_distinct_status_codes() {
        assert_eq!(
            AppError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("gone".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Storage("down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Timeout("slow").status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[actix_web::test]
    async fn deadline_converts_slow_calls_to_timeout() {
        let result: Result<(), AppError> = with_deadline(Duration::from_millis(5), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(AppError::Timeout(_))));
    }

    #[actix_web::test]
    async fn deadline_passes_fast_results_through() {
        let result = with_deadline(Duration::from_millis(50), async { Ok(7u64) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
