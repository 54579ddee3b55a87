use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobFlatError {
    #[error("Store error: {0}")]
    Store(#[from] mongodb::error::Error),

    #[error("Collection not found: {name}")]
    MissingCollection { name: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, JobFlatError>;
