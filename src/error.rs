use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("{path} is {bytes} bytes, limit is {limit}")]
    TooLarge { path: PathBuf, bytes: u64, limit: u64 },
    #[error("duplicate student name {0:?}")]
    DuplicateName(String),
    #[error("failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("out of memory while loading {0}")]
    OutOfMemory(PathBuf),
}

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid snapshot: {0}")]
    Parse(String),
    #[error("failed to encode snapshot: {0}")]
    Serialize(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("there are no students to export")]
    NothingToExport,
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to create PDF: {0}")]
    Pdf(String),
    #[error("failed to render map: {0}")]
    Raster(String),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
