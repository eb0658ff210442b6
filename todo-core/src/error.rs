#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("Todo not found")]
    NotFound(i64),

    #[error("database error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not find a directory for the database")]
    NoDataDir,
}

pub type Result<T> = std::result::Result<T, Error>;
