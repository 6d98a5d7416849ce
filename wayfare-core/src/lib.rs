pub mod ids;
pub mod identity;
pub mod catalog;
pub mod booking;
pub mod payment;
pub mod invoice;
pub mod activity;
pub mod notification;
pub mod repository;
pub mod assistant;
pub mod places;
pub mod mailer;

pub use ids::*;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("External service error: {0}")]
    ExternalService(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl CoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_state(why: impl Into<String>) -> Self {
        Self::InvalidState(why.into())
    }

    pub fn validation(why: impl Into<String>) -> Self {
        Self::Validation(why.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
