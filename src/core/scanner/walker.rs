//! Directory walking implementation using walkdir.

use super::{filter::ImageFilter, ImageScanner, ScanResult};
use crate::error::ScanError;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
    /// Directories never descended into, e.g. the action directory
    pub exclude: Vec<PathBuf>,
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: ImageFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = ImageFilter::new().with_hidden(config.include_hidden);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions.clone());
        }

        Self { config, filter }
    }

    /// Whether walkdir should descend into / yield this entry
    fn keep_entry(&self, entry: &DirEntry) -> bool {
        // The root itself is always walked, even if its name starts with '.'
        if entry.depth() == 0 {
            return true;
        }
        if entry.file_type().is_dir() {
            return !self.filter.rejects_hidden(entry.path())
                && !self.config.exclude.iter().any(|excluded| entry.path() == excluded);
        }
        true
    }

    /// Scan a single directory
    fn scan_directory(&self, root: &Path, result: &mut ScanResult) -> Result<(), ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        for entry_result in walker.into_iter().filter_entry(|entry| self.keep_entry(entry)) {
            match entry_result {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.filter.should_include(entry.path()) {
                        result.files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                    let error = ScanError::ReadEntry {
                        path,
                        source: e.into(),
                    };
                    tracing::warn!(error = %error, "Skipping unreadable entry");
                    result.errors.push(error);
                }
            }
        }

        Ok(())
    }
}

impl ImageScanner for WalkDirScanner {
    fn scan(&self, roots: &[PathBuf]) -> Result<ScanResult, ScanError> {
        let mut result = ScanResult::default();

        for root in roots {
            self.scan_directory(root, &mut result)?;
        }

        result.files.sort();
        result.files.dedup();

        tracing::info!(
            roots = roots.len(),
            images = result.files.len(),
            errors = result.errors.len(),
            "Scan complete"
        );
        Ok(result)
    }
}
