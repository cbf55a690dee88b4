//! Store configuration module.
//!
//! Handles loading, validating, and merging the store's TOML config file.
//! Stock defaults are overridden by whatever the user file specifies.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! root = "store"            # Storage root; one subdirectory per profile
//!
//! [output]
//! quality = 90              # JPEG/AVIF quality (1-100)
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//!
//! [[profiles]]
//! name = "original"
//! filters = []              # empty chain = store as-is
//! ```
//!
//! ## Profiles and Filters
//!
//! Profiles are an ordered array of tables. Each has a `name` (its directory
//! under `root`) and a `filters` chain applied in order:
//!
//! ```toml
//! [[profiles]]
//! name = "thumbnail"
//! filters = [
//!   { type = "crop", ratio = 1.0 },
//!   { type = "shrink", max_width = 256, max_height = 256 },
//! ]
//! ```
//!
//! Filter types: `identity`, `crop` (`ratio`), `resize` (`width`, `height`),
//! `shrink` (`max_width`, `max_height`, each optional).
//!
//! ## Merging
//!
//! Tables merge key by key; arrays replace. Defining any `[[profiles]]` in the
//! user file therefore replaces the stock profile list entirely.
//!
//! Unknown keys are rejected to catch typos early.

use crate::filter::{Filter, FilterError, Transform};
use crate::imaging::{Quality, RustBackend};
use crate::store::{ImageStore, StoreError, validate_component};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Profile '{profile}': {source}")]
    Filter {
        profile: String,
        #[source]
        source: FilterError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Store configuration loaded from a TOML file.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Storage root directory.
    pub root: PathBuf,
    /// Encoder settings.
    pub output: OutputConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Storage profiles, in processing order.
    pub profiles: Vec<ProfileConfig>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("store"),
            output: OutputConfig::default(),
            processing: ProcessingConfig::default(),
            profiles: vec![ProfileConfig {
                name: "original".to_string(),
                filters: Vec::new(),
            }],
        }
    }
}

impl StoreConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.quality == 0 || self.output.quality > 100 {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if self.profiles.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[profiles]] entry is required".into(),
            ));
        }
        let mut seen = HashSet::new();
        for profile in &self.profiles {
            validate_component("profile name", &profile.name)
                .map_err(|e| ConfigError::Validation(e.to_string()))?;
            if !seen.insert(profile.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate profile name '{}'",
                    profile.name
                )));
            }
            profile.chain()?;
        }
        Ok(())
    }

    /// Build a store with the configured backend quality and profiles.
    pub fn build_store(&self) -> Result<ImageStore<RustBackend>, ConfigError> {
        let backend = RustBackend::with_quality(Quality::new(self.output.quality));
        let mut store = ImageStore::with_backend(&self.root, backend);
        for profile in &self.profiles {
            store.add_profile(&profile.name, profile.chain()?)?;
        }
        Ok(store)
    }
}

/// One named storage profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    /// Directory name under the store root.
    pub name: String,
    /// Filters applied in order. Empty means store untransformed.
    #[serde(default)]
    pub filters: Vec<Transform>,
}

impl ProfileConfig {
    /// Build this profile's filter chain.
    pub fn chain(&self) -> Result<Filter, ConfigError> {
        Filter::chain(self.filters.iter().cloned()).map_err(|source| ConfigError::Filter {
            profile: self.name.clone(),
            source,
        })
    }
}

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// JPEG/AVIF encoding quality (1-100).
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default().value(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up), at least 1
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(StoreConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<StoreConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: StoreConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Parse and resolve config from a TOML string.
pub fn parse_config(content: &str) -> Result<StoreConfig, ConfigError> {
    let value: toml::Value = toml::from_str(content)?;
    resolve_config(Some(value))
}

/// Load config from `path`, falling back to stock defaults if the file does not exist.
pub fn load_config(path: &Path) -> Result<StoreConfig, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgstorage configuration
# ========================
# All settings are optional. Values shown below are the defaults unless noted.
# Unknown keys will cause an error.

# Storage root. Each profile stores its files in <root>/<profile name>/.
root = "store"

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[output]
# JPEG/AVIF encoding quality (1 = worst, 100 = best).
# PNG, WebP and TIFF are written lossless. The format follows the extension
# of the stored filename.
quality = 90

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers (profiles of one image are processed in parallel).
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Profiles
# ---------------------------------------------------------------------------
# Each profile is one output variant of every pushed image. Filters run in
# order; an empty list stores the image as-is (after EXIF rotation).
#
# Filter types:
#   { type = "identity" }
#   { type = "crop", ratio = 1.5 }                      # centered, width / height
#   { type = "resize", width = 1600, height = 1200 }    # exact, ignores aspect
#   { type = "shrink", max_width = 2000, max_height = 2000 }
#                                                       # fit inside, never upscales
#
# Defining any [[profiles]] here replaces the default list below.

[[profiles]]
name = "original"
filters = []

# [[profiles]]
# name = "full"
# filters = [{ type = "shrink", max_width = 2000, max_height = 2000 }]

# [[profiles]]
# name = "thumbnail"
# filters = [
#   { type = "crop", ratio = 1.0 },
#   { type = "shrink", max_width = 256, max_height = 256 },
# ]
"##
}
