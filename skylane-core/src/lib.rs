pub mod booking;
pub mod cache;
pub mod flight;
pub mod iata;
pub mod offer;
pub mod payment;
pub mod provider;
pub mod repository;
pub mod search;
pub mod user;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Permission denied: {0}")]
    Permission(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Upstream service error: {0}")]
    Upstream(String),
    #[error("Internal service error: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
