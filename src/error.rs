// src/error.rs - Error types for the editing core

use std::path::PathBuf;
use thiserror::Error;

/// Structural failures of chain splices and redo records.
///
/// These "should not occur" for edits built through the public API; they are
/// reported instead of panicking so the session can reposition and continue.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Line is not in the file")]
    NotInChain,
    #[error("Line is already in the file")]
    AlreadyLinked,
    #[error("Protected")]
    Protected,
    #[error("Read-only file")]
    ReadOnly,
    #[error("Invalid line range")]
    InvalidRange,
    #[error("Empty edit")]
    EmptyEdit,
    #[error("Chain inconsistent: {0}")]
    Inconsistent(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarkError {
    #[error("No mark")]
    NoMark,
    #[error("No copy/cut")]
    NoClip,
    #[error("Protected")]
    Protected,
    #[error("Mark offscreen")]
    Offscreen,
    #[error("Mark is in another file")]
    OtherFile,
    #[error("Mark edit failed: {0}")]
    Edit(#[from] EditError),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Read-only file")]
    ReadOnly,
    #[error("Damaged file")]
    Damaged,
    #[error("Write failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("Rename failure, changes kept in {}: {source}", artifact.display())]
    Rename {
        artifact: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Invalid config format: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}
