use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Goal is zero; callers display 0%.
    #[error("goal is zero, progress is undefined")]
    DivisionUndefined,
    /// Prior window averages to zero; callers display "+0%".
    #[error("baseline average is zero, change is undefined")]
    BaselineUndefined,
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),
}

pub type MetricsResult<T> = Result<T, MetricsError>;
