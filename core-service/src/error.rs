use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Payload error: {0}")]
    Graph(#[from] core_graph::GraphError),

    #[error("Progress error: {0}")]
    Progress(#[from] core_progress::ProgressError),

    /// The resource lacks what the operation needs, usually an id
    #[error("Invalid resource: {0}")]
    InvalidResource(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
