//! Image options configuration.
//!
//! Handles loading, validating, and merging `image.toml`. User files are
//! sparse: stock defaults are the base layer and the file only overrides the
//! keys it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! provider = "auto"         # Provider name, or "auto" to detect / fall back to ipx
//! base_url = "/"            # Base path the application is served under
//! dir = "public"            # Directory the self-hosted resizer serves from
//! domains = []              # Remote hosts the self-hosted resizer may proxy
//! densities = [1, 2]        # Pixel densities for density-descriptor srcsets
//! format = ["webp"]         # Default <picture> source formats
//! # quality = 80            # Default quality when a request sets none
//!
//! [screens]                 # Breakpoint label → viewport width in px
//! xs = 320
//! sm = 640
//! md = 768
//! lg = 1024
//! xl = 1280
//! xxl = 1536
//! "2xl" = 1536
//!
//! [alias]                   # Source path prefix → replacement
//! "/unsplash" = "https://images.unsplash.com"
//!
//! [presets.avatar]          # Named modifier bundles
//! format = "jpg"
//! width = 50
//!
//! [providers.cloudimage]    # Per-provider options
//! options = { token = "demo", base_url = "origin.example.com" }
//! ```
//!
//! Unknown keys are rejected to catch typos early, except inside a provider's
//! `options` table, which carries provider-specific settings.

use crate::modifiers::{ModifierValue, Modifiers};
use crate::providers::ProviderOptions;
use crate::urls::{normalize_domain, with_leading_slash};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILE: &str = "image.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Breakpoint label → viewport width in pixels.
pub type Screens = BTreeMap<String, u32>;

/// Tailwind's breakpoints.
pub fn default_screens() -> Screens {
    [
        ("xs", 320),
        ("sm", 640),
        ("md", 768),
        ("lg", 1024),
        ("xl", 1280),
        ("xxl", 1536),
        ("2xl", 1536),
    ]
    .into_iter()
    .map(|(label, width)| (label.to_string(), width))
    .collect()
}

/// Image options loaded from `image.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageConfig {
    /// Provider name; `"auto"` defers to detection and the ipx fallback.
    pub provider: String,
    /// Base path the application is served under.
    pub base_url: String,
    /// Directory the self-hosted resizer reads local sources from.
    pub dir: String,
    /// Breakpoints used for `sizes` keys and platform size lists.
    pub screens: Screens,
    /// Named modifier bundles.
    pub presets: BTreeMap<String, Modifiers>,
    /// Remote hosts the self-hosted resizer is allowed to proxy.
    pub domains: Vec<String>,
    /// Source path prefix → replacement path or URL.
    pub alias: BTreeMap<String, String>,
    /// Pixel densities for density-descriptor srcsets.
    pub densities: Vec<f64>,
    /// Default `<picture>` source formats.
    pub format: Vec<String>,
    /// Quality applied when a request sets none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<ModifierValue>,
    /// Per-provider configuration, keyed by the name requests refer to.
    pub providers: BTreeMap<String, ProviderConfig>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            provider: "auto".to_string(),
            base_url: "/".to_string(),
            dir: "public".to_string(),
            screens: default_screens(),
            presets: BTreeMap::new(),
            domains: Vec::new(),
            alias: BTreeMap::new(),
            densities: vec![1.0, 2.0],
            format: vec!["webp".to_string()],
            quality: None,
            providers: BTreeMap::new(),
        }
    }
}

/// One `[providers.<name>]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Implementation to use. Defaults to the entry's own name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Default options handed to the provider on every request.
    pub options: ProviderOptions,
}

impl ImageConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.trim().is_empty() {
            return Err(ConfigError::Validation(
                "provider must not be empty (use \"auto\")".into(),
            ));
        }
        if let Some((label, _)) = self.screens.iter().find(|(_, w)| **w == 0) {
            return Err(ConfigError::Validation(format!(
                "screens.{label} must be a positive width"
            )));
        }
        if self.densities.is_empty() {
            return Err(ConfigError::Validation(
                "densities must list at least one density".into(),
            ));
        }
        if self.densities.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(ConfigError::Validation(
                "densities must be positive numbers".into(),
            ));
        }
        if self.format.iter().any(|f| f.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "format entries must not be empty".into(),
            ));
        }
        match &self.quality {
            Some(ModifierValue::Int(q)) if !(0..=100).contains(q) => {
                return Err(ConfigError::Validation("quality must be 0-100".into()));
            }
            Some(ModifierValue::Float(q)) if !(0.0..=100.0).contains(q) => {
                return Err(ConfigError::Validation("quality must be 0-100".into()));
            }
            _ => {}
        }
        if self.alias.keys().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "alias prefixes must not be empty".into(),
            ));
        }
        for (name, entry) in &self.providers {
            if entry.provider.as_deref().is_some_and(|p| p.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "providers.{name}.provider must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// Canonical form used at runtime: domains reduced to hosts, alias
    /// prefixes with a leading slash. Unparseable domains are dropped.
    pub fn normalized(mut self) -> Self {
        self.domains = self
            .domains
            .iter()
            .filter_map(|d| {
                let host = normalize_domain(d);
                if host.is_none() {
                    log::warn!("ignoring domain {d:?}: not a valid host");
                }
                host
            })
            .collect();
        self.alias = self
            .alias
            .into_iter()
            .map(|(prefix, target)| (with_leading_slash(&prefix), target))
            .collect();
        self
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ImageConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key by key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                let merged = match table.remove(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => value,
                };
                table.insert(key, merged);
            }
            toml::Value::Table(table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `image.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` when the directory has no `image.toml`.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    Ok(Some(toml::from_str(&content)?))
}

/// Merge an optional overlay onto `base`, deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ImageConfig, ConfigError> {
    let merged = match overlay {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: ImageConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `image.toml` from `dir` on top of the stock defaults.
pub fn load_config(dir: &Path) -> Result<ImageConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// A fully commented stock `image.toml`, printed by `imgsrc gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# imgsrc configuration
# ====================
# All settings are optional. Values shown below are the defaults.
# Unknown keys cause an error, except inside [providers.<name>.options].

# Provider used when a request names none.
# "auto" picks IMGSRC_PROVIDER, then the hosting platform's optimizer
# (Vercel, AWS Amplify), then falls back to the self-hosted ipx route.
provider = "auto"

# Base path the application is served under.
base_url = "/"

# Directory the self-hosted resizer reads local sources from.
dir = "public"

# Remote hosts the self-hosted resizer may proxy. Absolute sources on
# other hosts are used as-is.
domains = []

# Pixel densities for srcsets of images without a `sizes` spec.
densities = [1, 2]

# Default <picture> source formats (the legacy fallback is added last).
format = ["webp"]

# Quality applied when a request sets none.
# quality = 80

# ---------------------------------------------------------------------------
# Breakpoints: label -> viewport width in px
# ---------------------------------------------------------------------------
[screens]
xs = 320
sm = 640
md = 768
lg = 1024
xl = 1280
xxl = 1536
"2xl" = 1536

# ---------------------------------------------------------------------------
# Source path aliases: prefix -> replacement
# ---------------------------------------------------------------------------
[alias]
# "/unsplash" = "https://images.unsplash.com"

# ---------------------------------------------------------------------------
# Presets: named modifier bundles
# ---------------------------------------------------------------------------
[presets]
# [presets.avatar]
# format = "jpg"
# width = 50
# height = 50

# ---------------------------------------------------------------------------
# Providers
# ---------------------------------------------------------------------------
[providers]
# [providers.cloudimage.options]
# token = "demo"
# base_url = "origin.example.com"
# api_version = "v7"
#
# A second entry backed by the same implementation:
# [providers.thumbs]
# provider = "imgix"
# options = { base_url = "https://thumbs.imgix.net" }
"##
}
