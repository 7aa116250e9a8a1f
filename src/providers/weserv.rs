//! images.weserv.nl proxy.
//!
//! The proxy fetches the original itself, so relative sources must be made
//! absolute against `base_url` (the public origin of the site).

use super::{ImageContext, ImageProvider, ProviderOptions, ResolvedImage, warn_missing};
use crate::operations::{OperationsConfig, OperationsGenerator, key_equals_value, make_generator};
use crate::urls::{encode_param, has_protocol, join_url, stringify_query};
use std::sync::LazyLock;

const DEFAULT_WESERV_URL: &str = "https://wsrv.nl";

fn formatter(key: &str, value: &str) -> String {
    key_equals_value(key, &encode_param(value))
}

static OPERATIONS: LazyLock<OperationsGenerator> = LazyLock::new(|| {
    make_generator(
        OperationsConfig::new()
            .key("format", "output")
            .key("quality", "q")
            .key("background", "bg")
            .key("width", "w")
            .key("height", "h")
            .join_with("&")
            .formatter(formatter),
    )
});

pub struct Weserv;

impl ImageProvider for Weserv {
    fn get_image(
        &self,
        src: &str,
        options: &ProviderOptions,
        _ctx: &ImageContext<'_>,
    ) -> ResolvedImage {
        let source = if has_protocol(src) {
            src.to_string()
        } else {
            match options.base_url() {
                Some(base) => join_url(&[base, src]),
                None => {
                    warn_missing("weserv", &["<baseURL>"]);
                    join_url(&["<baseURL>", src])
                }
            }
        };

        let weserv_url = options.extra_str("weserv_url").unwrap_or(DEFAULT_WESERV_URL);
        let mut query = stringify_query(&[("url", source.as_str())]);
        let operations = OPERATIONS.generate(&options.modifiers);
        if !operations.is_empty() {
            query.push('&');
            query.push_str(&operations);
        }
        ResolvedImage::new(format!("{}/?{query}", weserv_url.trim_end_matches('/')))
    }

    fn missing_options(&self, options: &ProviderOptions) -> Vec<&'static str> {
        if options.base_url().is_some() {
            Vec::new()
        } else {
            vec!["<baseURL>"]
        }
    }
}
