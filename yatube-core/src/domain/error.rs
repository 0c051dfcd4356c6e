use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::domain::form::FieldErrors;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),
    #[error("group not found: {0}")]
    GroupNotFound(String),
    #[error("post not found: {0}")]
    PostNotFound(i64),
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::UserNotFound(_)
                | DomainError::GroupNotFound(_)
                | DomainError::PostNotFound(_)
        )
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::UserNotFound(_)
            | DomainError::GroupNotFound(_)
            | DomainError::PostNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::UserAlreadyExists(_) => StatusCode::CONFLICT,
            DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        let details = match self {
            DomainError::UserNotFound(resource) | DomainError::GroupNotFound(resource) => {
                Some(json!({ "resource": resource }))
            }
            DomainError::PostNotFound(id) => Some(json!({ "resource": id })),
            DomainError::Validation(errors) => Some(json!({ "fields": errors })),
            // storage failures are logged where they happen, not echoed back
            _ => None,
        };
        let body = ErrorBody {
            error: match self {
                DomainError::Internal(_) => "internal error",
                _ => message.as_str(),
            },
            details,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_map_to_404() {
        for err in [
            DomainError::UserNotFound("leo".into()),
            DomainError::GroupNotFound("cats".into()),
            DomainError::PostNotFound(7),
        ] {
            assert!(err.is_not_found());
            assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn validation_and_permission_statuses() {
        let mut errors = FieldErrors::default();
        errors.add("slug", "This field is required.");
        assert_eq!(
            DomainError::Validation(errors).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            DomainError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert!(!DomainError::Unauthorized.is_not_found());
    }

    #[test]
    fn internal_error_response_hides_cause() {
        let res = DomainError::Internal("connection refused".into()).error_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
