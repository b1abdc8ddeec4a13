use std::path::PathBuf;

use thiserror::Error;

/// Failures of the media resources a theme points at.
///
/// None of these reach the user: the renderer logs them and keeps whatever was
/// already on screen.
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Failed to load image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Image {} has no pixels", .0.display())]
    EmptyImage(PathBuf),

    #[error("Media backend could not open {}: {reason}", path.display())]
    Media { path: PathBuf, reason: String },
}

pub type ResourceResult<T> = Result<T, ResourceError>;
