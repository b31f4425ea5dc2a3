use std::path::PathBuf;

/// The renderer's error taxonomy. The hot path (intersection, photon
/// tracing, the radiance estimator) never produces one of these — a miss
/// is `+inf`/black, not an `Err`. Errors only arise from the boundary:
/// CLI argument validation, scene file parsing, and file I/O.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("scene error in {}: {message}", path.display())]
    Scene { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode PNG: {0}")]
    Png(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, RenderError>;
