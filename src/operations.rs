//! Encoding modifier sets into provider operation strings.
//!
//! Every provider speaks its own dialect (`w_300&f_webp`, `func=crop&q=80`,
//! `w_300,format_webp`, …) but the mechanics are always the same: rename keys,
//! translate a few enumerated values, format each pair, join. Providers differ
//! only by the [`OperationsConfig`] they hand to [`make_generator`], so a new
//! provider never needs changes here.
//!
//! ```
//! use imgsrc::modifiers::Modifiers;
//! use imgsrc::operations::{OperationsConfig, key_equals_value, make_generator};
//!
//! let generator = make_generator(
//!     OperationsConfig::new()
//!         .key("fit", "func")
//!         .value("fit", "cover", "crop")
//!         .join_with("&")
//!         .formatter(key_equals_value),
//! );
//! let modifiers: Modifiers = [("fit", "cover")].into_iter().collect();
//! assert_eq!(generator.generate(&modifiers), "func=crop");
//! ```

use crate::modifiers::Modifiers;
use std::collections::HashMap;

/// Turns a (renamed key, translated value) pair into one operation token.
pub type Formatter = fn(&str, &str) -> String;

/// `key=value`
pub fn key_equals_value(key: &str, value: &str) -> String {
    format!("{key}={value}")
}

/// `key_value`
pub fn key_underscore_value(key: &str, value: &str) -> String {
    format!("{key}_{value}")
}

/// Provider-specific encoding rules.
#[derive(Debug, Clone)]
pub struct OperationsConfig {
    /// Canonical key → provider key. Missing keys keep their canonical name.
    pub key_map: HashMap<String, String>,
    /// Canonical key → (canonical value → provider value).
    pub value_map: HashMap<String, HashMap<String, String>>,
    pub join_with: String,
    pub formatter: Formatter,
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self {
            key_map: HashMap::new(),
            value_map: HashMap::new(),
            join_with: "/".to_string(),
            formatter: key_equals_value,
        }
    }
}

impl OperationsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, canonical: &str, provider: &str) -> Self {
        self.key_map
            .insert(canonical.to_string(), provider.to_string());
        self
    }

    pub fn value(mut self, key: &str, canonical: &str, provider: &str) -> Self {
        self.value_map
            .entry(key.to_string())
            .or_default()
            .insert(canonical.to_string(), provider.to_string());
        self
    }

    pub fn join_with(mut self, separator: &str) -> Self {
        self.join_with = separator.to_string();
        self
    }

    pub fn formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }
}

/// A compiled [`OperationsConfig`]. Stateless; safe to share across threads.
#[derive(Debug, Clone)]
pub struct OperationsGenerator {
    config: OperationsConfig,
}

/// Build the generator for one provider.
pub fn make_generator(config: OperationsConfig) -> OperationsGenerator {
    OperationsGenerator { config }
}

impl OperationsGenerator {
    /// Encode `modifiers` in insertion order.
    ///
    /// Returns an empty string when no modifier carries a value; callers must
    /// then omit their `?` or path separator.
    pub fn generate(&self, modifiers: &Modifiers) -> String {
        let OperationsConfig {
            key_map,
            value_map,
            join_with,
            formatter,
        } = &self.config;

        modifiers
            .iter()
            .filter_map(|(key, value)| value.map(|v| (key, v.to_string())))
            .map(|(key, raw)| {
                let value = value_map
                    .get(key)
                    .and_then(|values| values.get(&raw))
                    .map_or(raw.as_str(), String::as_str);
                let key = key_map.get(key).map_or(key, String::as_str);
                formatter(key, value)
            })
            .collect::<Vec<_>>()
            .join(join_with)
    }
}

impl From<OperationsConfig> for OperationsGenerator {
    fn from(config: OperationsConfig) -> Self {
        make_generator(config)
    }
}
