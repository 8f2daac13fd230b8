pub mod booking;
pub mod facet;
pub mod filters;
pub mod principal;
pub mod repository;
pub mod status;
pub mod time;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid date bound: {0}")]
    InvalidDate(String),
    #[error("Unknown booking status: {0}")]
    UnknownStatus(String),
    #[error("Unknown scheduling type: {0}")]
    UnknownSchedulingType(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
