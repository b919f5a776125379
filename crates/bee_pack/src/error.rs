//! Error types for packing operations.
//!
//! Only conditions that must abort packing are errors here. A missing asset,
//! a missing original sound manifest or a missing generated file are logged
//! and skipped by the caller instead.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PackError>;

#[derive(Error, Debug)]
pub enum PackError {
    /// Filesystem I/O failed (writing generated files, reading the file list).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The map could not be read or rewritten.
    #[error("BSP error: {0}")]
    Bsp(#[from] bee_bsp::BspError),

    /// The embedded archive is corrupt or could not be written.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// A resource was found on disk but could not be read into the archive.
    #[error("Failed to read resource {path}: {source}")]
    ReadResource {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}
