pub mod error;
pub mod navigation;
pub mod repository;

pub use error::StoreError;
pub use navigation::{Navigator, TRANSIT_ROUTE};
pub use repository::{DistanceService, RequestStore};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
