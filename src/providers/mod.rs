//! Image providers: the backends that turn a source path plus modifiers into
//! a final URL.
//!
//! The engine only ever talks to a provider through [`ImageProvider`]. Built-in
//! providers form a closed registry ([`BuiltinProvider`]); anything else is
//! supplied by the application as an `Arc<dyn ImageProvider>` at setup time
//! (see [`Setup::register`](crate::setup::Setup::register)).
//!
//! | Provider | Module | Kind |
//! |---|---|---|
//! | `ipx`, `ipxStatic` | [`ipx`] | self-hosted resizer route |
//! | `none` | [`none`] | passthrough |
//! | `cloudimage` | [`cloudimage`] | CDN, query operations |
//! | `imgix` | [`imgix`] | CDN, query operations |
//! | `netlify` | [`netlify`] | CDN, query operations |
//! | `prepr` | [`prepr`] | CDN, path operations |
//! | `vercel`, `awsAmplify` | [`platform`] | hosting platform optimizer |
//! | `weserv` | [`weserv`] | image proxy |

pub mod cloudimage;
pub mod imgix;
pub mod ipx;
pub mod netlify;
pub mod none;
pub mod platform;
pub mod prepr;
pub mod weserv;

use crate::config::{ImageConfig, Screens};
use crate::modifiers::Modifiers;
use crate::setup::HostConfig;
use serde::{Deserialize, Serialize};

/// Options handed to a provider for one image.
///
/// The named fields are the ones most providers share; provider-specific
/// settings (`project_name`, `cdn_url`, `api_version`, …) live in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderOptions {
    /// Default modifiers of the provider, or the merged modifiers of a request.
    #[serde(skip_serializing_if = "Modifiers::is_empty")]
    pub modifiers: Modifiers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl ProviderOptions {
    /// Non-blank string value of a provider-specific option.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .and_then(toml::Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Non-blank `base_url`.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref().filter(|s| !s.is_empty())
    }

    /// Non-blank `token`.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|s| !s.is_empty())
    }

    /// Overlay `self` on `defaults`: set fields win, extra keys are merged
    /// key by key, modifiers are merged with [`Modifiers::with_defaults`].
    pub fn with_defaults(&self, defaults: &ProviderOptions) -> ProviderOptions {
        let mut extra = defaults.extra.clone();
        for (key, value) in &self.extra {
            extra.insert(key.clone(), value.clone());
        }
        ProviderOptions {
            modifiers: self.modifiers.with_defaults(&defaults.modifiers),
            base_url: self.base_url.clone().or_else(|| defaults.base_url.clone()),
            token: self.token.clone().or_else(|| defaults.token.clone()),
            extra,
        }
    }
}

/// Read-only engine state a provider may consult.
#[derive(Debug, Clone, Copy)]
pub struct ImageContext<'a> {
    pub screens: &'a Screens,
    /// Base path the application is served under.
    pub base_url: &'a str,
}

/// Output of a provider for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedImage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl ResolvedImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: None,
        }
    }
}

/// The single capability every backend implements.
///
/// `get_image` must be total: on missing configuration it logs a diagnostic
/// and returns a visibly broken placeholder URL instead of failing.
pub trait ImageProvider: Send + Sync {
    fn get_image(&self, src: &str, options: &ProviderOptions, ctx: &ImageContext<'_>)
    -> ResolvedImage;

    /// Markers of mandatory options missing from `options`, e.g. `"<token>"`.
    fn missing_options(&self, _options: &ProviderOptions) -> Vec<&'static str> {
        Vec::new()
    }

    /// Absolute sources outside the configured domains are passed through
    /// untouched instead of being handed to the provider.
    fn validates_domains(&self) -> bool {
        false
    }

    /// The provider resolves path aliases itself, so the engine must not.
    fn supports_alias(&self) -> bool {
        false
    }

    /// Startup hook contributing host configuration.
    fn setup(&self, _options: &ProviderOptions, _config: &ImageConfig, _host: &mut HostConfig) {}
}

/// Closed registry of providers shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinProvider {
    Ipx,
    IpxStatic,
    None,
    Cloudimage,
    Imgix,
    Netlify,
    Prepr,
    Vercel,
    AwsAmplify,
    Weserv,
}

impl BuiltinProvider {
    pub const ALL: [BuiltinProvider; 10] = [
        Self::Ipx,
        Self::IpxStatic,
        Self::None,
        Self::Cloudimage,
        Self::Imgix,
        Self::Netlify,
        Self::Prepr,
        Self::Vercel,
        Self::AwsAmplify,
        Self::Weserv,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Ipx => "ipx",
            Self::IpxStatic => "ipxStatic",
            Self::None => "none",
            Self::Cloudimage => "cloudimage",
            Self::Imgix => "imgix",
            Self::Netlify => "netlify",
            Self::Prepr => "prepr",
            Self::Vercel => "vercel",
            Self::AwsAmplify => "awsAmplify",
            Self::Weserv => "weserv",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// The self-hosted resizer installed as the fallback.
    pub fn is_self_hosted(self) -> bool {
        matches!(self, Self::Ipx | Self::IpxStatic)
    }

    pub fn provider(self) -> &'static dyn ImageProvider {
        match self {
            Self::Ipx | Self::IpxStatic => &ipx::Ipx,
            Self::None => &none::Passthrough,
            Self::Cloudimage => &cloudimage::Cloudimage,
            Self::Imgix => &imgix::Imgix,
            Self::Netlify => &netlify::Netlify,
            Self::Prepr => &prepr::Prepr,
            Self::Vercel => &platform::VERCEL,
            Self::AwsAmplify => &platform::AWS_AMPLIFY,
            Self::Weserv => &weserv::Weserv,
        }
    }
}

/// Log the standard "missing option" diagnostic.
pub(crate) fn warn_missing(provider: &str, missing: &[&str]) {
    log::warn!(
        "[{provider}] {} is required to build image URL",
        missing.join(", ")
    );
}

/// `?ops`, or nothing for an empty operation string.
pub(crate) fn query_suffix(operations: &str) -> String {
    if operations.is_empty() {
        String::new()
    } else {
        format!("?{operations}")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for provider in BuiltinProvider::ALL {
            assert_eq!(BuiltinProvider::from_name(provider.name()), Some(provider));
        }
        assert_eq!(BuiltinProvider::from_name("cloudinary"), None);
        assert_eq!(BuiltinProvider::from_name("IPX"), None);
    }

    #[test]
    fn only_ipx_variants_are_self_hosted() {
        let hosted: Vec<_> = BuiltinProvider::ALL
            .into_iter()
            .filter(|p| p.is_self_hosted())
            .map(BuiltinProvider::name)
            .collect();
        assert_eq!(hosted, vec!["ipx", "ipxStatic"]);
    }

    #[test]
    fn request_options_overlay_defaults() {
        let mut defaults = ProviderOptions {
            base_url: Some("https://cdn.example.com".into()),
            token: Some("abc".into()),
            ..Default::default()
        };
        defaults.extra.insert("api_version".into(), "v7".into());
        defaults.modifiers.set("quality", 70u32);

        let mut request = ProviderOptions {
            token: Some("xyz".into()),
            ..Default::default()
        };
        request.modifiers.set("width", 100u32);

        let merged = request.with_defaults(&defaults);
        assert_eq!(merged.base_url(), Some("https://cdn.example.com"));
        assert_eq!(merged.token(), Some("xyz"));
        assert_eq!(merged.extra_str("api_version"), Some("v7"));
        assert!(merged.modifiers.contains("quality"));
        assert!(merged.modifiers.contains("width"));
    }

    #[test]
    fn blank_options_count_as_missing() {
        let mut options = ProviderOptions {
            base_url: Some(String::new()),
            ..Default::default()
        };
        options.extra.insert("project_name".into(), "  ".into());
        assert_eq!(options.base_url(), None);
        assert_eq!(options.extra_str("project_name"), None);
    }

    #[test]
    fn provider_options_parse_from_toml() {
        let options: ProviderOptions = toml::from_str(
            r#"
base_url = "https://example.com"
project_name = "acme"

[modifiers]
format = "webp"
"#,
        )
        .unwrap();
        assert_eq!(options.base_url(), Some("https://example.com"));
        assert_eq!(options.extra_str("project_name"), Some("acme"));
        assert!(options.modifiers.contains("format"));
    }
}
