//! # Scanner Module
//!
//! Discovers candidate image files in directories.
//!
//! The engine itself takes a ready-made candidate list; this module is how
//! the command line builds one.
//!
//! ## Supported Formats
//! - JPEG (.jpg, .jpeg)
//! - PNG (.png)
//! - GIF (.gif)
//! - BMP (.bmp)
//! - TIFF (.tiff)
//! - WebP (.webp)
//!
//! ## Example
//! ```rust,ignore
//! use image_dedup::core::scanner::{ImageScanner, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let result = scanner.scan(&["/Users/photos".into()])?;
//! ```

mod filter;
mod walker;

pub use filter::ImageFilter;
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use std::path::PathBuf;

/// Extensions treated as images, lowercase and without the dot
pub const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp"];

/// Result of a scan operation
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Image files found, sorted by path
    pub files: Vec<PathBuf>,
    /// Entries that could not be read (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Trait for candidate scanners
///
/// Implement this trait to create custom scanners (e.g., for testing).
pub trait ImageScanner: Send + Sync {
    /// Scan directories and return the image files found.
    ///
    /// A root that does not exist or is not a directory is an error;
    /// unreadable entries below a root are collected in `errors`.
    fn scan(&self, roots: &[PathBuf]) -> Result<ScanResult, ScanError>;
}
