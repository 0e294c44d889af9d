use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    /// A payload named a resource type outside the supported set.
    #[error("Unsupported resource kind: {kind}")]
    UnsupportedKind { kind: String },

    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GraphError>;
