use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProgressError {
    /// Persisting progress on the device failed
    #[error("Local progress store failed: {0}")]
    Storage(#[source] BridgeError),
}

pub type Result<T> = std::result::Result<T, ProgressError>;
