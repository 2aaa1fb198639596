//! # Error Module
//!
//! Error types for the duplicate finder.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Per-file errors stay local** - only cache and report I/O end a run

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error returned by a run
#[derive(Error, Debug)]
pub enum DedupError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Run was cancelled")]
    Cancelled,
}

/// Errors that occur while enumerating candidate files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while fingerprinting one image
///
/// Logged and counted per file; a run never fails because of one.
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to decode image {path}: {reason}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Failed to read image file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the hash cache
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Invalid fingerprint '{value}': {reason}")]
    InvalidFingerprint { value: String, reason: String },

    #[error("Failed to write hash cache {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to replace hash cache {path}: {reason}. The previous cache was left untouched.")]
    Persist { path: PathBuf, reason: String },

    #[error("Cache store lock poisoned")]
    Poisoned,
}

/// Errors raised while writing the duplicate report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Serialize(String),
}

/// Errors for a single move, copy or delete
///
/// These are recorded in a `DispositionResult`, never propagated out of a batch.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("File no longer exists: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{operation} failed for {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Copy verification failed for {path}: source {expected} bytes, destination {actual} bytes")]
    VerificationFailed {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, DedupError>;
