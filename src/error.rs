use thiserror::Error;

#[derive(Error, Debug)]
pub enum CgramapError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Capability error: {0}")]
    Capability(String),

    #[error("Application graph error: {0}")]
    Application(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CgramapError>;
