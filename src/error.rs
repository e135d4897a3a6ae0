use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV is missing required columns (task name, start date, end date); found {found:?}")]
    MissingColumns { found: Vec<String> },

    #[error("No valid tasks found in CSV ({skipped} rows skipped)")]
    EmptyImport { skipped: usize },

    #[error("No configuration directory available")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, Error>;
