//! Transition and sweep errors
//!
//! The engine turns these into a reply: `PermissionDenied` and `NotFound`
//! get their own message, everything else the generic failure text with
//! the session left untouched.

use funnel_common::AppError;
use funnel_core::DomainError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Domain rule violation or storage failure
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Receipt storage, configuration and other infrastructure
    #[error(transparent)]
    App(#[from] AppError),

    /// A referenced row vanished, usually behind a stale button
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Caller is not on the admin allow-list
    #[error("admin access required: {action}")]
    PermissionDenied { action: String },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn permission_denied(action: impl Into<String>) -> Self {
        Self::PermissionDenied {
            action: action.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Storage hiccups; the user may simply try again
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Domain(e) => e.is_retryable(),
            Self::App(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Stable code for logs
    pub fn error_code(&self) -> &str {
        match self {
            Self::Domain(e) => e.code(),
            Self::App(e) => e.error_code(),
            Self::NotFound { .. } => "NOT_FOUND",
            Self::PermissionDenied { .. } => "ADMIN_ONLY",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Startup wiring reports context-building failures as `AppError`
impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => AppError::Domain(e),
            ServiceError::App(e) => e,
            ServiceError::NotFound { resource, id } => AppError::not_found(format!("{resource} {id}")),
            ServiceError::PermissionDenied { action } => {
                AppError::Validation(format!("admin only: {action}"))
            }
            ServiceError::Validation(msg) => AppError::Validation(msg),
            ServiceError::Internal(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
