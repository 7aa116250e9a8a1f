//! The engine: source + modifiers → final URL.
//!
//! [`ImageEngine`] is built once by [`Setup::install`](crate::setup::Setup::install)
//! and is read-only afterwards, so it can be shared freely across threads.
//!
//! Resolving one image:
//!
//! 1. empty sources are rejected, `data:` URIs pass through untouched;
//! 2. relative sources get a leading slash;
//! 3. aliases are rewritten, unless the provider resolves them itself;
//! 4. for domain-validating providers, absolute sources on hosts outside
//!    `domains` pass through untouched;
//! 5. modifiers are layered (explicit, request, preset, provider defaults,
//!    configured quality) and width/height coerced to pixels;
//! 6. the provider builds the URL.

use crate::config::ImageConfig;
use crate::modifiers::{FORMAT, Modifiers, QUALITY, normalize};
use crate::providers::{ImageContext, ProviderOptions, ResolvedImage};
use crate::setup::ResolvedProvider;
use crate::urls::{has_protocol, host_of, join_url, with_leading_slash};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("image source must be a non-empty string")]
    EmptySource,
    #[error("unknown provider `{0}`")]
    UnknownProvider(String),
    #[error("unknown preset `{0}`")]
    UnknownPreset(String),
}

/// Per-request choices beyond the modifiers themselves.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Provider to use instead of the default one.
    pub provider: Option<String>,
    /// Preset merged under the explicit modifiers.
    pub preset: Option<String>,
    /// Options overriding the provider's configured defaults.
    pub provider_options: ProviderOptions,
}

impl RequestOptions {
    pub fn provider(mut self, name: impl Into<String>) -> Self {
        self.provider = Some(name.into());
        self
    }

    pub fn preset(mut self, name: impl Into<String>) -> Self {
        self.preset = Some(name.into());
        self
    }
}

#[derive(Debug)]
pub struct ImageEngine {
    config: ImageConfig,
    provider: String,
    providers: BTreeMap<String, ResolvedProvider>,
}

impl ImageEngine {
    pub(crate) fn new(
        config: ImageConfig,
        provider: String,
        providers: BTreeMap<String, ResolvedProvider>,
    ) -> Self {
        Self {
            config,
            provider,
            providers,
        }
    }

    /// Normalized configuration the engine was installed with.
    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    /// Name of the provider used when a request names none.
    pub fn default_provider(&self) -> &str {
        &self.provider
    }

    /// All resolved providers, by name.
    pub fn providers(&self) -> impl Iterator<Item = &ResolvedProvider> {
        self.providers.values()
    }

    /// Resolve `src` to a provider URL plus the format it will be served in.
    pub fn get_image(
        &self,
        src: &str,
        modifiers: &Modifiers,
        options: &RequestOptions,
    ) -> Result<ResolvedImage, ImageError> {
        let src = src.trim();
        if src.is_empty() {
            return Err(ImageError::EmptySource);
        }
        if src.starts_with("data:") {
            return Ok(ResolvedImage::new(src));
        }

        let name = options.provider.as_deref().unwrap_or(&self.provider);
        let resolved = self
            .providers
            .get(name)
            .ok_or_else(|| ImageError::UnknownProvider(name.to_string()))?;
        let preset = options
            .preset
            .as_deref()
            .map(|p| {
                self.config
                    .presets
                    .get(p)
                    .ok_or_else(|| ImageError::UnknownPreset(p.to_string()))
            })
            .transpose()?;
        let provider = resolved.implementation.get();

        let mut input = if has_protocol(src) {
            src.to_string()
        } else {
            with_leading_slash(src)
        };
        if !provider.supports_alias() {
            input = self.apply_alias(&input);
        }
        if provider.validates_domains() && has_protocol(&input) {
            let allowed = host_of(&input).is_some_and(|host| self.config.domains.contains(&host));
            if !allowed {
                log::debug!("{input} is not on an allowed domain, passing through");
                return Ok(ResolvedImage::new(input));
            }
        }

        let mut layered = match preset {
            Some(preset) => preset.with_defaults(&resolved.defaults.modifiers),
            None => resolved.defaults.modifiers.clone(),
        };
        layered = options.provider_options.modifiers.with_defaults(&layered);
        if let Some(quality) = &self.config.quality
            && !layered.contains(QUALITY)
        {
            layered.set(QUALITY, quality.clone());
        }

        let mut provider_options = options.provider_options.with_defaults(&resolved.defaults);
        provider_options.modifiers = normalize(modifiers, None, None, Some(&layered));

        let ctx = ImageContext {
            screens: &self.config.screens,
            base_url: &self.config.base_url,
        };
        let mut image = provider.get_image(&input, &provider_options, &ctx);
        if image.format.is_none() {
            image.format = provider_options
                .modifiers
                .get(FORMAT)
                .map(ToString::to_string);
        }
        Ok(image)
    }

    /// [`ImageEngine::get_image`], URL only.
    pub fn url(
        &self,
        src: &str,
        modifiers: &Modifiers,
        options: &RequestOptions,
    ) -> Result<String, ImageError> {
        self.get_image(src, modifiers, options).map(|image| image.url)
    }

    /// Rewrite the longest matching alias prefix.
    fn apply_alias(&self, input: &str) -> String {
        self.config
            .alias
            .iter()
            .filter(|(prefix, _)| input.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map_or_else(
                || input.to_string(),
                |(prefix, target)| join_url(&[target, &input[prefix.len()..]]),
            )
    }
}
