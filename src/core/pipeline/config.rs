//! Engine configuration.
//!
//! [`EngineSettings`] holds the raw values a configuration source provides
//! (strings, integers, flags). [`EngineConfig`] is the validated, typed form
//! the engine is constructed with; it is never modified afterwards.

use crate::core::actions::ActionKind;
use crate::core::hasher::{HashAlgorithmKind, DEFAULT_HASH_SIZE, MAX_HASH_SIZE};
use crate::error::{DedupError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default Hamming distance threshold for 64-bit fingerprints
pub const DEFAULT_THRESHOLD: u32 = 8;

/// Raw settings as read from a configuration file or command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub input_directory: PathBuf,
    pub hash_type: String,
    pub hash_threshold: i64,
    pub hash_size: u32,
    pub rebuild_hash_cache: bool,
    pub duplicate_action_type: String,
    pub enable_duplicate_actions: bool,
    pub duplicate_action_directory: PathBuf,
    pub image_hashes_cache_file: PathBuf,
    pub duplicate_report_file: PathBuf,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            input_directory: PathBuf::from("./input_images"),
            hash_type: HashAlgorithmKind::Difference.config_name().to_string(),
            hash_threshold: i64::from(DEFAULT_THRESHOLD),
            hash_size: DEFAULT_HASH_SIZE,
            rebuild_hash_cache: false,
            duplicate_action_type: ActionKind::None.name().to_string(),
            enable_duplicate_actions: false,
            duplicate_action_directory: PathBuf::from("./duplicate_actions_archive"),
            image_hashes_cache_file: PathBuf::from("./image_cache/hashes.txt"),
            duplicate_report_file: PathBuf::from("./scan_reports/duplicate_images.txt"),
        }
    }
}

impl EngineSettings {
    /// Load settings from a JSON file; missing keys keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DedupError::Config(format!("cannot read settings file {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&contents)
            .map_err(|e| DedupError::Config(format!("invalid settings file {}: {}", path.display(), e)))
    }
}

/// Immutable configuration for one engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Root used to compute relative paths when moving or copying
    pub input_dir: PathBuf,
    /// Fingerprint algorithm
    pub algorithm: HashAlgorithmKind,
    /// Fingerprint grid size (8 gives 64 bits)
    pub hash_size: u32,
    /// Maximum Hamming distance for a pair to count as duplicate
    pub threshold: u32,
    /// Ignore the stored cache and hash everything again
    pub rebuild: bool,
    /// What `dispose` does with duplicates
    pub action_kind: ActionKind,
    /// Master switch for `dispose`
    pub enable_actions: bool,
    /// Where moved or copied duplicates go
    pub action_dir: PathBuf,
    /// Hash cache file
    pub cache_path: PathBuf,
    /// Text report file
    pub report_path: PathBuf,
}

impl EngineConfig {
    /// Start building a configuration from the defaults
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Validate raw settings.
    ///
    /// Unknown hash or action names fall back to `dhash` and `none` with a
    /// warning. A negative threshold or a hash size outside 2..=64 is
    /// rejected.
    pub fn from_settings(settings: &EngineSettings) -> Result<Self> {
        let threshold = u32::try_from(settings.hash_threshold).map_err(|_| {
            DedupError::Config(format!(
                "hash threshold must be a non-negative integer, got {}",
                settings.hash_threshold
            ))
        })?;

        if !(2..=MAX_HASH_SIZE).contains(&settings.hash_size) {
            return Err(DedupError::Config(format!(
                "hash size must be between 2 and {}, got {}",
                MAX_HASH_SIZE, settings.hash_size
            )));
        }

        Ok(Self {
            input_dir: settings.input_directory.clone(),
            algorithm: HashAlgorithmKind::from_name_or_default(&settings.hash_type),
            hash_size: settings.hash_size,
            threshold,
            rebuild: settings.rebuild_hash_cache,
            action_kind: ActionKind::from_name_or_default(&settings.duplicate_action_type),
            enable_actions: settings.enable_duplicate_actions,
            action_dir: settings.duplicate_action_directory.clone(),
            cache_path: settings.image_hashes_cache_file.clone(),
            report_path: settings.duplicate_report_file.clone(),
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let defaults = EngineSettings::default();
        Self {
            input_dir: defaults.input_directory,
            algorithm: HashAlgorithmKind::Difference,
            hash_size: DEFAULT_HASH_SIZE,
            threshold: DEFAULT_THRESHOLD,
            rebuild: false,
            action_kind: ActionKind::None,
            enable_actions: false,
            action_dir: defaults.duplicate_action_directory,
            cache_path: defaults.image_hashes_cache_file,
            report_path: defaults.duplicate_report_file,
        }
    }
}

/// Builder for [`EngineConfig`]
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the input directory
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    /// Set the hash algorithm
    pub fn algorithm(mut self, algorithm: HashAlgorithmKind) -> Self {
        self.config.algorithm = algorithm;
        self
    }

    /// Set the hash size
    pub fn hash_size(mut self, size: u32) -> Self {
        self.config.hash_size = size.clamp(2, MAX_HASH_SIZE);
        self
    }

    /// Set the comparison threshold (lower = stricter)
    pub fn threshold(mut self, threshold: u32) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Rehash every file instead of trusting the cache
    pub fn rebuild(mut self, rebuild: bool) -> Self {
        self.config.rebuild = rebuild;
        self
    }

    /// Set the disposition kind and enable it
    pub fn action(mut self, kind: ActionKind) -> Self {
        self.config.action_kind = kind;
        self.config.enable_actions = kind != ActionKind::None;
        self
    }

    /// Turn dispositions on or off without changing the kind
    pub fn enable_actions(mut self, enable: bool) -> Self {
        self.config.enable_actions = enable;
        self
    }

    /// Set the action directory
    pub fn action_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.action_dir = dir.into();
        self
    }

    /// Set the cache file
    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cache_path = path.into();
        self
    }

    /// Set the report file
    pub fn report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.report_path = path.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> EngineConfig {
        self.config
    }
}
