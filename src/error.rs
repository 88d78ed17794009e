use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("password is not a readable attribute")]
    PasswordNotReadable,

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Database error: {0}")]
    Database(DbErr),

    #[error("Password hash error: {0}")]
    Password(String),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DbErr> for ServerError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => ServerError::Conflict(detail),
            _ => ServerError::Database(err),
        }
    }
}

impl From<argon2::password_hash::Error> for ServerError {
    fn from(err: argon2::password_hash::Error) -> Self {
        ServerError::Password(err.to_string())
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::PermissionDenied => StatusCode::FORBIDDEN,
            ServerError::PasswordNotReadable => StatusCode::FORBIDDEN,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Database(_)
            | ServerError::Password(_)
            | ServerError::Template(_)
            | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the user can fix this by changing their input.
    pub fn is_user_error(&self) -> bool {
        matches!(self, ServerError::Conflict(_) | ServerError::InvalidRequest(_))
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!("{}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, message).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ServerError::NotFound("question 1".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ServerError::PasswordNotReadable.status(), StatusCode::FORBIDDEN);
        assert_eq!(ServerError::Conflict("email".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            ServerError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unique_violation_is_user_error() {
        assert!(ServerError::Conflict("users.email".into()).is_user_error());
        assert!(ServerError::InvalidRequest("empty title".into()).is_user_error());
        assert!(!ServerError::PermissionDenied.is_user_error());
    }

    #[test]
    fn test_server_errors_hide_details() {
        let response = ServerError::Internal("secret detail".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
