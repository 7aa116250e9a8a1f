//! Netlify Large Media transforms.
//!
//! Netlify cannot convert formats, so a `format` modifier is dropped with a
//! warning rather than producing a URL Netlify would reject.

use super::{ImageContext, ImageProvider, ProviderOptions, ResolvedImage, query_suffix};
use crate::modifiers::FORMAT;
use crate::operations::{OperationsConfig, OperationsGenerator, key_equals_value, make_generator};
use crate::urls::{has_protocol, join_url};
use std::sync::LazyLock;

static OPERATIONS: LazyLock<OperationsGenerator> = LazyLock::new(|| {
    make_generator(
        OperationsConfig::new()
            .key("height", "h")
            .key("fit", "nf_resize")
            .key("width", "w")
            .value("fit", "fill", "smartcrop")
            .value("fit", "contain", "fit")
            .join_with("&")
            .formatter(key_equals_value),
    )
});

pub struct Netlify;

impl ImageProvider for Netlify {
    fn get_image(
        &self,
        src: &str,
        options: &ProviderOptions,
        _ctx: &ImageContext<'_>,
    ) -> ResolvedImage {
        let mut modifiers = options.modifiers.clone();
        if let Some(format) = modifiers.remove(FORMAT) {
            log::warn!("[netlify] format conversion is not supported, ignoring format {format}");
        }
        let query = query_suffix(&OPERATIONS.generate(&modifiers));
        let path = if has_protocol(src) {
            src.to_string()
        } else {
            join_url(&[options.base_url().unwrap_or_default(), src])
        };
        ResolvedImage::new(path + &query)
    }
}
