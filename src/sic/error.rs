use std::path::PathBuf;
use thiserror::Error;

use crate::masked::ShapeMismatch;
use crate::projection::ProjectionError;
use crate::readers::ReadError;

#[derive(Error, Debug)]
pub enum SicError {
    #[error("invalid input: {0}")]
    InputValidation(String),

    #[error(
        "should be a single file matching {prefix} in {}, found {count} matching files: {files:?}",
        .directory.display()
    )]
    AmbiguousOrMissingFile {
        prefix: String,
        directory: PathBuf,
        count: usize,
        files: Vec<String>,
    },

    #[error("invalid averaging window: {0}")]
    InvalidAveragingWindow(String),

    #[error("failed to list {}: {source}", .directory.display())]
    ListDirectory {
        directory: PathBuf,
        source: walkdir::Error,
    },

    #[error("monthly rasters differ in shape: {0}")]
    ShapeMismatch(#[from] ShapeMismatch),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),
}
