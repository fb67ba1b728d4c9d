//! File-level errors.
//!
//! None of these end the editing session. The controller reports them on
//! the status line and keeps the document as it was; only a load failure
//! at startup is turned into a fatal exit by the binary.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    /// The file exists but could not be read.
    #[error("can't open {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing or renaming the temporary file failed.
    #[error("can't save {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Save was requested for a document that has no file name.
    #[error("no file name")]
    NoPath,
}

pub type Result<T> = std::result::Result<T, FileError>;
