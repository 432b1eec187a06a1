//! Error types for the surfmap library

use thiserror::Error;

/// Main error type for the library
#[derive(Debug, Error)]
pub enum Error {
    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("mesh data error: {0}")]
    MeshData(String),

    #[error("perception access denied: {0}")]
    AccessDenied(String),

    #[error("ingest error: {0}")]
    Ingest(String),
}
