//! Hosting-platform image optimizers (Vercel, AWS Amplify).
//!
//! Both expose an endpoint taking `url`, `w` and `q` query parameters and only
//! serve widths they were told about at deploy time. Requested widths are
//! therefore snapped up to the nearest configured screen width, and setup
//! publishes the screen widths as the platform's allowed sizes.

use super::{ImageContext, ImageProvider, ProviderOptions, ResolvedImage};
use crate::config::ImageConfig;
use crate::modifiers::{QUALITY, WIDTH, parse_size};
use crate::setup::{HostConfig, PlatformImageConfig};
use crate::urls::stringify_query;

const MINIMUM_CACHE_TTL: u32 = 60 * 5;

pub struct PlatformOptimizer {
    pub name: &'static str,
    pub default_base_url: &'static str,
    /// Route the platform mounts its optimizer on, when it must be declared.
    pub route: Option<&'static str>,
    pub cache_control: Option<&'static str>,
    pub formats: &'static [&'static str],
}

pub static VERCEL: PlatformOptimizer = PlatformOptimizer {
    name: "vercel",
    default_base_url: "/_vercel/image",
    route: None,
    cache_control: None,
    formats: &[],
};

pub static AWS_AMPLIFY: PlatformOptimizer = PlatformOptimizer {
    name: "awsAmplify",
    default_base_url: "/_amplify/image",
    route: Some("/_amplify/image"),
    cache_control: Some("public, max-age=300, immutable"),
    formats: &["image/jpeg", "image/png", "image/webp", "image/avif"],
};

/// Screen widths ascending, without duplicates.
fn allowed_widths(screens: &crate::config::Screens) -> Vec<u32> {
    let mut widths: Vec<u32> = screens.values().copied().filter(|w| *w > 0).collect();
    widths.sort_unstable();
    widths.dedup();
    widths
}

impl PlatformOptimizer {
    /// Width actually requested from the platform for `requested`.
    pub fn snap_width(&self, requested: Option<u32>, allowed: &[u32], src: &str) -> Option<u32> {
        let largest = allowed.last().copied();
        match requested {
            None => {
                if let Some(largest) = largest {
                    log::warn!(
                        "[{}] a width should be provided, defaulting to {largest} for {src}",
                        self.name
                    );
                }
                largest
            }
            Some(w) if allowed.is_empty() || allowed.contains(&w) => Some(w),
            Some(w) => {
                log::debug!(
                    "[{}] width {w} is not a configured screen width, snapping up for {src}",
                    self.name
                );
                allowed.iter().copied().find(|a| *a > w).or(largest)
            }
        }
    }
}

impl ImageProvider for PlatformOptimizer {
    fn get_image(
        &self,
        src: &str,
        options: &ProviderOptions,
        ctx: &ImageContext<'_>,
    ) -> ResolvedImage {
        let allowed = allowed_widths(ctx.screens);
        let requested = options
            .modifiers
            .get(WIDTH)
            .and_then(parse_size)
            .filter(|w| *w > 0);
        let quality = options
            .modifiers
            .get(QUALITY)
            .map_or_else(|| "100".to_string(), ToString::to_string);

        let mut pairs = vec![("url", src.to_string())];
        if let Some(width) = self.snap_width(requested, &allowed, src) {
            pairs.push(("w", width.to_string()));
        }
        pairs.push(("q", quality));
        let pairs: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (*k, v.as_str())).collect();

        let base = options.base_url().unwrap_or(self.default_base_url);
        ResolvedImage::new(format!("{base}?{}", stringify_query(&pairs)))
    }

    fn setup(&self, _options: &ProviderOptions, config: &ImageConfig, host: &mut HostConfig) {
        host.platform_images = Some(PlatformImageConfig {
            platform: self.name.to_string(),
            route: self.route.map(str::to_string),
            sizes: allowed_widths(&config.screens),
            domains: config.domains.clone(),
            formats: self.formats.iter().map(|f| f.to_string()).collect(),
            minimum_cache_ttl: MINIMUM_CACHE_TTL,
            cache_control: self.cache_control.map(str::to_string),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Screens;

    fn screens() -> Screens {
        [("sm", 640), ("md", 768), ("lg", 1024), ("dup", 768)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    fn url(provider: &PlatformOptimizer, width: Option<u32>) -> String {
        let screens = screens();
        let ctx = ImageContext {
            screens: &screens,
            base_url: "/",
        };
        let mut options = ProviderOptions::default();
        if let Some(w) = width {
            options.modifiers.set("width", w);
        }
        provider.get_image("/a.jpg", &options, &ctx).url
    }

    #[test]
    fn exact_screen_width_is_kept() {
        assert_eq!(url(&VERCEL, Some(768)), "/_vercel/image?url=%2Fa.jpg&w=768&q=100");
    }

    #[test]
    fn width_snaps_up_to_next_screen() {
        assert_eq!(url(&VERCEL, Some(700)), "/_vercel/image?url=%2Fa.jpg&w=768&q=100");
    }

    #[test]
    fn oversized_and_missing_width_use_largest() {
        assert_eq!(url(&VERCEL, Some(5000)), "/_vercel/image?url=%2Fa.jpg&w=1024&q=100");
        assert_eq!(url(&VERCEL, None), "/_vercel/image?url=%2Fa.jpg&w=1024&q=100");
    }

    #[test]
    fn amplify_uses_its_own_endpoint() {
        assert_eq!(
            url(&AWS_AMPLIFY, Some(640)),
            "/_amplify/image?url=%2Fa.jpg&w=640&q=100"
        );
    }

    #[test]
    fn setup_publishes_unique_sorted_sizes() {
        let config = ImageConfig {
            screens: screens(),
            domains: vec!["example.com".into()],
            ..Default::default()
        };
        let mut host = HostConfig::default();
        AWS_AMPLIFY.setup(&ProviderOptions::default(), &config, &mut host);
        let platform = host.platform_images.unwrap();
        assert_eq!(platform.platform, "awsAmplify");
        assert_eq!(platform.sizes, vec![640, 768, 1024]);
        assert_eq!(platform.domains, vec!["example.com"]);
        assert_eq!(platform.minimum_cache_ttl, 300);
        assert_eq!(platform.formats.len(), 4);
    }
}
