use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("years must not be empty")]
    NoYears,
    #[error("months must not be empty")]
    NoMonths,
    #[error("month should be in 1..=12, got {0}")]
    Month(u32),
    #[error("year should be positive, got {0}")]
    Year(i32),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}
