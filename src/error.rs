use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why an asset could not be used. Never fatal: the game falls back to
/// procedural visuals or silence.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{} is not a usable asset: {reason}", path.display())]
    Format { path: PathBuf, reason: String },
    #[error("loader stopped before {name} was reported")]
    Abandoned { name: &'static str },
}
