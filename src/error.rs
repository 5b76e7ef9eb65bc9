use chrono::NaiveDate;

/// Rejected user input. Only mutating store operations produce these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Start date is required")]
    MissingStart,
    #[error("Invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("Start date {0} is in the future")]
    StartInFuture(NaiveDate),
    #[error("End date {0} is in the future")]
    EndInFuture(NaiveDate),
    #[error("End date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("A period starting on {0} is already logged")]
    DuplicateStart(NaiveDate),
    #[error("Period {start}..{end} overlaps an existing entry")]
    Overlap { start: NaiveDate, end: NaiveDate },
    #[error("Pain scale must be between 1 and 10, got {0}")]
    PainScaleOutOfRange(i64),
    #[error("{0} must be a positive number of days")]
    NonPositiveLength(&'static str),
    #[error("{0} cannot exceed {1} days")]
    LengthTooLong(&'static str, u32),
    #[error("Mood log date {0} is in the future")]
    MoodInFuture(NaiveDate),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
