use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to fetch dataset: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed dataset: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("report request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("report endpoint answered {0}")]
    Rejected(reqwest::StatusCode),

    #[error("issue text is empty")]
    EmptyIssue,
}
