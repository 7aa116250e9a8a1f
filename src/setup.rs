//! Startup: resolving providers and wiring them into the host.
//!
//! [`Setup::install`] runs once, before any URL is built. It validates the
//! configuration, resolves every configured provider to an implementation,
//! runs provider setup routines against the host's [`HostConfig`], applies the
//! self-hosted fallback and returns the immutable [`ImageEngine`].
//!
//! ```text
//! ImageConfig ──► validate ──► detect_provider ──► resolve implementations
//!                                                        │
//!      HostConfig ◄── setup routines ◄── check options ◄─┘
//!          │
//!          └──► self-hosted fallback (ipx, once) ──► ImageEngine
//! ```
//!
//! Every failure here is a configuration error and is returned as-is; nothing
//! is retried.

use crate::config::{ConfigError, ImageConfig};
use crate::image::ImageEngine;
use crate::providers::{BuiltinProvider, ImageProvider, ProviderOptions, warn_missing};
use crate::resolver::{ENV_PROVIDER, Platform, detect_provider};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unknown provider `{name}`: not a built-in provider and not registered")]
    UnknownProvider { name: String },
    #[error("provider `{provider}` is missing required options: {}", .missing.join(", "))]
    MissingOptions {
        provider: String,
        missing: Vec<&'static str>,
    },
}

/// How strictly missing provider options are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Warn at startup; requests degrade to placeholder URLs.
    #[default]
    Development,
    /// Missing mandatory options fail setup.
    Production,
}

/// A server route mounted by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteHandler {
    pub route: String,
    pub handler: String,
}

/// Runtime options of the self-hosted resizer route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelfHostedOptions {
    pub base_url: String,
    pub dir: String,
    pub alias: BTreeMap<String, String>,
    pub domains: Vec<String>,
}

/// Image optimization settings a hosting platform needs at deploy time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformImageConfig {
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    pub sizes: Vec<u32>,
    pub domains: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub formats: Vec<String>,
    pub minimum_cache_ttl: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
}

/// The slice of host application configuration providers may touch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HostConfig {
    pub handlers: Vec<RouteHandler>,
    pub dev_handlers: Vec<RouteHandler>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_images: Option<PlatformImageConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_hosted: Option<SelfHostedOptions>,
}

impl HostConfig {
    /// True when a regular or dev handler is mounted under `base`.
    pub fn has_handler_under(&self, base: &str) -> bool {
        self.handlers
            .iter()
            .chain(&self.dev_handlers)
            .any(|h| h.route.starts_with(base))
    }
}

/// Implementation behind a provider name.
#[derive(Clone)]
pub enum ProviderImpl {
    Builtin(BuiltinProvider),
    Custom(Arc<dyn ImageProvider>),
}

impl ProviderImpl {
    pub fn get(&self) -> &dyn ImageProvider {
        match self {
            Self::Builtin(builtin) => builtin.provider(),
            Self::Custom(custom) => custom.as_ref(),
        }
    }

    pub fn is_self_hosted(&self) -> bool {
        matches!(self, Self::Builtin(b) if b.is_self_hosted())
    }
}

impl fmt::Debug for ProviderImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(builtin) => write!(f, "Builtin({})", builtin.name()),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A provider name bound to its implementation and default options.
#[derive(Debug, Clone)]
pub struct ResolvedProvider {
    pub name: String,
    pub implementation: ProviderImpl,
    pub defaults: ProviderOptions,
}

/// Startup builder.
pub struct Setup {
    config: ImageConfig,
    platform: Platform,
    env_override: Option<String>,
    mode: Mode,
    custom: BTreeMap<String, Arc<dyn ImageProvider>>,
}

impl Setup {
    pub fn new(config: ImageConfig) -> Self {
        Self {
            config,
            platform: Platform::Unknown,
            env_override: None,
            mode: Mode::Development,
            custom: BTreeMap::new(),
        }
    }

    /// [`Setup::new`] with platform and provider override read from the
    /// process environment.
    pub fn from_env(config: ImageConfig) -> Self {
        Self::new(config)
            .platform(Platform::from_env())
            .env_override(std::env::var(ENV_PROVIDER).ok())
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn env_override(mut self, provider: Option<String>) -> Self {
        self.env_override = provider;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Make a user-supplied provider available under `name`.
    pub fn register(mut self, name: &str, provider: Arc<dyn ImageProvider>) -> Self {
        self.custom.insert(name.to_string(), provider);
        self
    }

    /// Registered providers shadow built-ins of the same name.
    fn resolve_implementation(&self, name: &str) -> Result<ProviderImpl, SetupError> {
        if let Some(custom) = self.custom.get(name) {
            return Ok(ProviderImpl::Custom(Arc::clone(custom)));
        }
        BuiltinProvider::from_name(name)
            .map(ProviderImpl::Builtin)
            .ok_or_else(|| SetupError::UnknownProvider {
                name: name.to_string(),
            })
    }

    /// Resolve providers, run setup routines against `host` and build the engine.
    pub fn install(self, host: &mut HostConfig) -> Result<ImageEngine, SetupError> {
        self.config.validate()?;
        let config = self.config.clone().normalized();

        let selected = detect_provider(
            Some(&config.provider),
            self.env_override.as_deref(),
            self.platform,
        );
        log::debug!("selected provider: {selected:?} (platform {})", self.platform);

        let mut providers: BTreeMap<String, ResolvedProvider> = BTreeMap::new();
        for (name, entry) in &config.providers {
            let implementation =
                self.resolve_implementation(entry.provider.as_deref().unwrap_or(name))?;
            providers.insert(
                name.clone(),
                ResolvedProvider {
                    name: name.clone(),
                    implementation,
                    defaults: entry.options.clone(),
                },
            );
        }
        let registered = self.custom.keys().map(String::as_str);
        for name in selected.as_deref().into_iter().chain(registered) {
            if providers.contains_key(name) {
                continue;
            }
            let implementation = self.resolve_implementation(name)?;
            providers.insert(
                name.to_string(),
                ResolvedProvider {
                    name: name.to_string(),
                    implementation,
                    defaults: ProviderOptions::default(),
                },
            );
        }

        for provider in providers.values() {
            let missing = provider.implementation.get().missing_options(&provider.defaults);
            if missing.is_empty() {
                continue;
            }
            match self.mode {
                Mode::Production => {
                    return Err(SetupError::MissingOptions {
                        provider: provider.name.clone(),
                        missing,
                    });
                }
                Mode::Development => warn_missing(&provider.name, &missing),
            }
        }

        for provider in providers.values() {
            if !provider.implementation.is_self_hosted() {
                provider
                    .implementation
                    .get()
                    .setup(&provider.defaults, &config, host);
            }
        }

        let needs_fallback = selected.as_deref().is_none_or(|name| {
            providers
                .get(name)
                .is_some_and(|p| p.implementation.is_self_hosted())
        });
        let active = if needs_fallback {
            let name = BuiltinProvider::Ipx.name();
            let fallback = providers
                .entry(name.to_string())
                .or_insert_with(|| ResolvedProvider {
                    name: name.to_string(),
                    implementation: ProviderImpl::Builtin(BuiltinProvider::Ipx),
                    defaults: ProviderOptions::default(),
                });
            fallback
                .implementation
                .get()
                .setup(&fallback.defaults, &config, host);
            name.to_string()
        } else {
            selected.unwrap_or_default()
        };
        log::info!("image provider: {active}");

        Ok(ImageEngine::new(config, active, providers))
    }
}
