use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which side of a comparison a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "Left"),
            Side::Right => write!(f, "Right"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{side} path does not exist: {}", path.display())]
    PathNotFound { side: Side, path: PathBuf },

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("{side} path is a directory, expected a file: {}", path.display())]
    IsADirectory { side: Side, path: PathBuf },

    #[error(
        "Cannot compare a file with a directory. Left ({left_kind}): {}, Right ({right_kind}): {}",
        left.display(),
        right.display()
    )]
    MixedPathTypes {
        left: PathBuf,
        left_kind: &'static str,
        right: PathBuf,
        right_kind: &'static str,
    },

    #[error("Invalid {encoding} byte sequence in {}", path.display())]
    Decode { path: PathBuf, encoding: String },

    #[error("Invalid pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("Unsupported configuration: {0}")]
    Unsupported(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DiffError>;
