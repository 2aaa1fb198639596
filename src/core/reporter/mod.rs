//! # Reporter Module
//!
//! Writes detected duplicate pairs to a human-readable report.
//!
//! ## Text Format
//! ```text
//! Duplicate and Near-Duplicate Image Report (Threshold: 8, Type: dhash):
//!
//! - /photos/a.jpg
//! - /photos/a-copy.jpg
//!
//! ```
//! A run without duplicates writes the single line
//! `No duplicate or near-duplicate images found.`
//!
//! Machine-readable JSON and CSV exports live in [`export`].

pub mod export;

pub use export::{export, ExportFormat};

use crate::core::comparator::DuplicatePair;
use crate::core::hasher::HashAlgorithmKind;
use crate::error::ReportError;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Line written when a run finds nothing
pub const NO_DUPLICATES_LINE: &str = "No duplicate or near-duplicate images found.";

/// Renders duplicate pairs as the plain-text report
#[derive(Debug, Clone, Copy)]
pub struct ReportWriter {
    threshold: u32,
    algorithm: HashAlgorithmKind,
}

impl ReportWriter {
    /// Reporter for a run with the given settings, named in the header
    pub fn new(threshold: u32, algorithm: HashAlgorithmKind) -> Self {
        Self {
            threshold,
            algorithm,
        }
    }

    /// Write the report to any writer
    pub fn render<W: Write>(&self, pairs: &[DuplicatePair], mut writer: W) -> std::io::Result<()> {
        if pairs.is_empty() {
            writeln!(writer, "{}", NO_DUPLICATES_LINE)?;
            return Ok(());
        }

        writeln!(
            writer,
            "Duplicate and Near-Duplicate Image Report (Threshold: {}, Type: {}):",
            self.threshold,
            self.algorithm.config_name()
        )?;
        writeln!(writer)?;

        for pair in pairs {
            writeln!(writer, "- {}", pair.original.display())?;
            writeln!(writer, "- {}", pair.duplicate.display())?;
            writeln!(writer)?;
        }

        Ok(())
    }

    /// Render the report to a string
    pub fn render_to_string(&self, pairs: &[DuplicatePair]) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.render(pairs, &mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Write the report file, creating its directory.
    ///
    /// The file is replaced atomically, so a failed write leaves any
    /// previous report in place.
    pub fn write_report(&self, pairs: &[DuplicatePair], path: &Path) -> Result<(), ReportError> {
        write_atomically(path, |writer| self.render(pairs, writer))?;

        tracing::info!(path = %path.display(), pairs = pairs.len(), "Duplicate report written");
        Ok(())
    }
}

/// Write `path` through a temp file in the same directory, then rename it into place
pub(crate) fn write_atomically<F>(path: &Path, fill: F) -> Result<(), ReportError>
where
    F: FnOnce(&mut BufWriter<&fs::File>) -> std::io::Result<()>,
{
    let write_error = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(write_error)?;

    let temp = NamedTempFile::new_in(&dir).map_err(write_error)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        fill(&mut writer).map_err(write_error)?;
        writer.flush().map_err(write_error)?;
    }

    temp.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}
