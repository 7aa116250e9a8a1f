//! Shared test utilities.
//!
//! Builds engines against a throwaway [`HostConfig`] and assembles modifier
//! sets from literal pairs.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let engine = engine("ipx");
//! let m = modifiers(&[("width", 300.into())]);
//! assert_eq!(engine.url("/a.jpg", &m, &Default::default()).unwrap(), "/_ipx/w_300/a.jpg");
//! ```

use crate::config::{ImageConfig, Screens};
use crate::image::ImageEngine;
use crate::modifiers::{ModifierValue, Modifiers};
use crate::setup::{HostConfig, Setup};

/// Engine for `provider` with otherwise default configuration.
pub fn engine(provider: &str) -> ImageEngine {
    engine_with(ImageConfig {
        provider: provider.to_string(),
        ..Default::default()
    })
}

/// Engine for a full configuration, in development mode.
pub fn engine_with(config: ImageConfig) -> ImageEngine {
    Setup::new(config)
        .install(&mut HostConfig::default())
        .expect("test config should install")
}

/// Ordered modifier set from `(key, value)` pairs.
pub fn modifiers(pairs: &[(&str, ModifierValue)]) -> Modifiers {
    pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
}

/// Screens table from `(label, width)` pairs.
pub fn screens(pairs: &[(&str, u32)]) -> Screens {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

/// Split a srcset into `(url, descriptor)` pairs.
pub fn srcset_entries(srcset: &str) -> Vec<(String, String)> {
    srcset
        .split(", ")
        .filter_map(|entry| entry.rsplit_once(' '))
        .map(|(url, descriptor)| (url.to_string(), descriptor.to_string()))
        .collect()
}
