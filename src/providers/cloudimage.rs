//! Cloudimage CDN.
//!
//! `https://<token>.cloudimg.io/<api_version>/<base_url>/<src>?<operations>`.
//! Either `token` or an explicit `cdn_url` is required, plus `base_url` (the
//! origin Cloudimage pulls from).

use super::{
    ImageContext, ImageProvider, ProviderOptions, ResolvedImage, query_suffix, warn_missing,
};
use crate::operations::{OperationsConfig, OperationsGenerator, key_equals_value, make_generator};
use crate::urls::{has_protocol, join_url};
use std::sync::LazyLock;

static OPERATIONS: LazyLock<OperationsGenerator> = LazyLock::new(|| {
    make_generator(
        OperationsConfig::new()
            .key("fit", "func")
            .key("quality", "q")
            .key("format", "force_format")
            .value("fit", "cover", "crop")
            .value("fit", "contain", "fit")
            .value("fit", "fill", "cover")
            .value("fit", "inside", "bound")
            .value("fit", "outside", "boundmin")
            .join_with("&")
            .formatter(key_equals_value),
    )
});

pub struct Cloudimage;

impl ImageProvider for Cloudimage {
    fn get_image(
        &self,
        src: &str,
        options: &ProviderOptions,
        _ctx: &ImageContext<'_>,
    ) -> ResolvedImage {
        let query = query_suffix(&OPERATIONS.generate(&options.modifiers));

        let missing = self.missing_options(options);
        if !missing.is_empty() {
            warn_missing("cloudimage", &missing);
            return ResolvedImage::new(join_url(&["<token>", "<baseURL>", src]) + &query);
        }

        if has_protocol(src) {
            return ResolvedImage::new(join_url(&[src]) + &query);
        }

        let cdn_url = match options.extra_str("cdn_url") {
            Some(cdn) => cdn.to_string(),
            None => format!(
                "https://{}.cloudimg.io/{}",
                options.token().unwrap_or_default(),
                options.extra_str("api_version").unwrap_or_default()
            ),
        };
        let base_url = options.base_url().unwrap_or_default();
        ResolvedImage::new(join_url(&[&cdn_url, base_url, src]) + &query)
    }

    fn missing_options(&self, options: &ProviderOptions) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if options.base_url().is_none() {
            missing.push("<baseURL>");
        }
        if options.token().is_none() && options.extra_str("cdn_url").is_none() {
            missing.push("<token> or <cdnURL>");
        }
        missing
    }
}
