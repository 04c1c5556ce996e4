// Route exports
pub mod manage;
pub mod matches;
pub mod surveys;

use actix_web::{http::StatusCode, web, HttpResponse};
use std::sync::Arc;
use crate::config::{MatchingSettings, NotificationSettings};
use crate::core::Matcher;
use crate::models::ErrorResponse;
use crate::services::{CacheManager, PostgresClient, PostgresError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub cache: Arc<CacheManager>,
    pub matcher: Matcher,
    pub matching: MatchingSettings,
    pub notifications: NotificationSettings,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matches::configure)
            .configure(manage::configure)
            .configure(surveys::configure),
    );
}

pub(crate) fn error_response(status: StatusCode, error: &str, message: impl ToString) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
        status_code: status.as_u16(),
    })
}

/// Map a store failure onto the matching HTTP status
pub(crate) fn store_error(error: &str, e: PostgresError) -> HttpResponse {
    let status = match &e {
        PostgresError::NotFound(_) => StatusCode::NOT_FOUND,
        PostgresError::Conflict(_) => StatusCode::CONFLICT,
        PostgresError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        PostgresError::SqlxError(_) | PostgresError::MigrateError(_) => {
            tracing::error!("{}: {}", error, e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    error_response(status, error, e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_status() {
        let not_found = store_error("Failed", PostgresError::NotFound("x".into()));
        let conflict = store_error("Failed", PostgresError::Conflict("x".into()));
        let invalid = store_error("Failed", PostgresError::InvalidInput("x".into()));

        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }
}
