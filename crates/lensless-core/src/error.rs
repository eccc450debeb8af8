use thiserror::Error;

#[derive(Error, Debug)]
pub enum LenslessError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Remote execution failed: {0}")]
    RemoteExecution(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Compute backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, LenslessError>;
