//! Crate-level error type.

use std::path::PathBuf;

use thiserror::Error;

use crate::check::LookupError;
use crate::name::{InvalidName, PackageName};

/// Errors that stop a scaffolding run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The requested name could not be sanitized.
    #[error("invalid package name: {0}")]
    InvalidName(#[from] InvalidName),

    /// The registry already has a project with this name.
    #[error("`{0}` is already taken on the package index")]
    Taken(PackageName),

    /// The registry could not answer and the caller asked for certainty.
    #[error("could not determine whether `{name}` is available: {source}")]
    Unknown {
        /// Name that was checked.
        name: PackageName,
        /// Why the lookup failed.
        #[source]
        source: LookupError,
    },

    /// Filesystem operation failed.
    #[error("{}: {source}", .path.display())]
    Io {
        /// Path being created or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Refusing to scaffold into a directory that already has content.
    #[error("directory `{}` already exists and is not empty", .0.display())]
    DirectoryNotEmpty(PathBuf),

    /// A git invocation could not be spawned or exited non-zero.
    #[error("git {command} failed: {detail}")]
    Git {
        /// Subcommand, e.g. `init`.
        command: String,
        /// Stderr or spawn error.
        detail: String,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
