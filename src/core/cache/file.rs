//! Plain-text cache backend.
//!
//! One record per line, `<path>,<hex fingerprint>`, no header. Lines are
//! written sorted by path so unchanged collections produce byte-identical
//! files.

use super::{CacheStore, HashCache};
use crate::core::hasher::Fingerprint;
use crate::error::CacheError;
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Text file backed cache store
#[derive(Debug, Clone)]
pub struct TextFileStore {
    path: PathBuf,
}

impl TextFileStore {
    /// Create a store for the cache file at `path` (it need not exist yet)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse one cache line (without its line ending).
    ///
    /// Splits at the last comma; hex never contains one, so paths may. The
    /// path part is taken verbatim, including any surrounding whitespace.
    fn parse_line(line: &[u8]) -> Result<(PathBuf, Fingerprint), String> {
        let comma = line
            .iter()
            .rposition(|&byte| byte == b',')
            .ok_or_else(|| "expected '<path>,<fingerprint>'".to_string())?;
        let (path, hex) = (&line[..comma], &line[comma + 1..]);

        if path.is_empty() {
            return Err("empty path".to_string());
        }

        let hex = std::str::from_utf8(hex).map_err(|_| "fingerprint is not valid UTF-8".to_string())?;
        let fingerprint = Fingerprint::from_hex(hex.trim()).map_err(|e| e.to_string())?;
        let path = path_from_bytes(path).ok_or_else(|| "path is not valid UTF-8".to_string())?;
        Ok((path, fingerprint))
    }

    fn read_entries(&self) -> std::io::Result<HashCache> {
        let reader = BufReader::new(fs::File::open(&self.path)?);
        let mut cache = HashCache::new();
        let mut skipped = 0usize;

        for (index, line) in reader.split(b'\n').enumerate() {
            let mut line = line?;
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match Self::parse_line(&line) {
                Ok(record) => cache.update([record]),
                Err(reason) => {
                    skipped += 1;
                    tracing::warn!(
                        line = index + 1,
                        content = %String::from_utf8_lossy(&line),
                        %reason,
                        "Skipping invalid hash cache line"
                    );
                }
            }
        }

        tracing::info!(
            path = %self.path.display(),
            loaded = cache.len(),
            skipped,
            "Loaded hashes from cache"
        );
        Ok(cache)
    }

    fn write_temp(&self, cache: &HashCache, dir: &Path) -> Result<NamedTempFile, CacheError> {
        let write_error = |source| CacheError::Write {
            path: self.path.clone(),
            source,
        };

        let temp = NamedTempFile::new_in(dir).map_err(write_error)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            for (path, fingerprint) in cache.iter() {
                let Some(bytes) = path_to_bytes(path).filter(|bytes| !bytes.contains(&b'\n')) else {
                    tracing::warn!(path = %path.display(), "Path cannot be stored in the hash cache, skipping");
                    continue;
                };
                writer.write_all(bytes).map_err(write_error)?;
                writeln!(writer, ",{}", fingerprint).map_err(write_error)?;
            }
            writer.flush().map_err(write_error)?;
        }
        temp.as_file().sync_all().map_err(write_error)?;

        Ok(temp)
    }
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
    use std::os::unix::ffi::OsStrExt;
    Some(PathBuf::from(std::ffi::OsStr::from_bytes(bytes)))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
    std::str::from_utf8(bytes).ok().map(PathBuf::from)
}

// Unix paths are stored as raw bytes so names that are not UTF-8 keep their cache entry
#[cfg(unix)]
fn path_to_bytes(path: &Path) -> Option<&[u8]> {
    use std::os::unix::ffi::OsStrExt;
    Some(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn path_to_bytes(path: &Path) -> Option<&[u8]> {
    path.to_str().map(str::as_bytes)
}

impl CacheStore for TextFileStore {
    fn load(&self, rebuild: bool) -> HashCache {
        if rebuild {
            tracing::info!("Rebuild requested, starting with an empty hash cache");
            return HashCache::new();
        }

        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "No hash cache found, starting empty");
            return HashCache::new();
        }

        match self.read_entries() {
            Ok(cache) => cache,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to read hash cache, starting empty"
                );
                HashCache::new()
            }
        }
    }

    fn save(&self, cache: &HashCache) -> Result<(), CacheError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        fs::create_dir_all(&dir).map_err(|source| CacheError::Write {
            path: self.path.clone(),
            source,
        })?;

        // The temp file lives next to the target so the rename stays on one filesystem
        let temp = self.write_temp(cache, &dir)?;
        temp.persist(&self.path).map_err(|e| CacheError::Persist {
            path: self.path.clone(),
            reason: e.error.to_string(),
        })?;

        tracing::info!(
            path = %self.path.display(),
            entries = cache.len(),
            "Saved hash cache"
        );
        Ok(())
    }
}
