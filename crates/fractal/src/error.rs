use thiserror::Error;

#[derive(Error, Debug)]
pub enum FractalError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("pixel buffer holds {actual} texels but the frame needs {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("backend not available: {0}")]
    Backend(String),
    #[error("failed to read configuration")]
    Io(#[from] std::io::Error),
    #[error("malformed configuration json")]
    Json(#[from] serde_json::Error),
}
