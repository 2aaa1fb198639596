//! Export functionality for duplicate pairs.
//!
//! Supports JSON and CSV for scripts and spreadsheets.

use super::write_atomically;
use crate::core::comparator::DuplicatePair;
use crate::error::ReportError;
use std::io::Write;
use std::path::Path;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Pick a format from a file extension (`.json` or `.csv`)
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }
}

/// Export pairs as a pretty-printed JSON array
pub fn export_json<W: Write>(pairs: &[DuplicatePair], writer: W) -> std::io::Result<()> {
    serde_json::to_writer_pretty(writer, pairs).map_err(std::io::Error::from)
}

/// Export pairs to CSV format
///
/// CSV columns: Original, Duplicate, Distance, Match Type
pub fn export_csv<W: Write>(pairs: &[DuplicatePair], mut writer: W) -> std::io::Result<()> {
    writeln!(writer, "Original,Duplicate,Distance,Match Type")?;

    for pair in pairs {
        writeln!(
            writer,
            "{},{},{},{}",
            csv_field(&pair.original.to_string_lossy()),
            csv_field(&pair.duplicate.to_string_lossy()),
            pair.distance,
            pair.match_type()
        )?;
    }

    Ok(())
}

/// Write `pairs` to `path` in the given format
pub fn export(pairs: &[DuplicatePair], format: ExportFormat, path: &Path) -> Result<(), ReportError> {
    write_atomically(path, |writer| match format {
        ExportFormat::Csv => export_csv(pairs, writer),
        ExportFormat::Json => export_json(pairs, writer),
    })?;

    tracing::info!(path = %path.display(), ?format, "Exported duplicate pairs");
    Ok(())
}

/// Quote a field when it contains a separator, quote or newline
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn pairs() -> Vec<DuplicatePair> {
        vec![DuplicatePair {
            original: PathBuf::from("/photos/a,1.jpg"),
            duplicate: PathBuf::from("/photos/b.jpg"),
            distance: 3,
        }]
    }

    #[test]
    fn csv_quotes_paths_with_commas() {
        let mut buffer = Vec::new();
        export_csv(&pairs(), &mut buffer).unwrap();

        let csv = String::from_utf8(buffer).unwrap();
        assert_eq!(
            csv,
            "Original,Duplicate,Distance,Match Type\n\"/photos/a,1.jpg\",/photos/b.jpg,3,Near-Exact Match\n"
        );
    }

    #[test]
    fn json_is_an_array_of_pairs() {
        let mut buffer = Vec::new();
        export_json(&pairs(), &mut buffer).unwrap();

        let parsed: Vec<DuplicatePair> = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed, pairs());
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("out.JSON")), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_path(Path::new("out.csv")), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_path(Path::new("out.txt")), None);
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pairs.csv");

        export(&pairs(), ExportFormat::Csv, &path).unwrap();

        assert!(std::fs::read_to_string(&path).unwrap().starts_with("Original,"));
    }

    #[test]
    fn json_export_matches_export_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pairs.json");

        export(&pairs(), ExportFormat::Json, &path).unwrap();

        let mut expected = Vec::new();
        export_json(&pairs(), &mut expected).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), expected);
    }
}
