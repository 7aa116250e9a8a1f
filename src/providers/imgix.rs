//! imgix: `<base_url>/<src>?<operations>`.

use super::{ImageContext, ImageProvider, ProviderOptions, ResolvedImage, query_suffix};
use crate::operations::{OperationsConfig, OperationsGenerator, key_equals_value, make_generator};
use crate::urls::{has_protocol, join_url};
use std::sync::LazyLock;

static OPERATIONS: LazyLock<OperationsGenerator> = LazyLock::new(|| {
    make_generator(
        OperationsConfig::new()
            .key("width", "w")
            .key("height", "h")
            .key("format", "fm")
            .key("quality", "q")
            .key("background", "bg")
            .key("rotate", "rot")
            .value("fit", "fill", "scale")
            .value("fit", "inside", "max")
            .value("fit", "outside", "min")
            .value("fit", "cover", "crop")
            .value("fit", "contain", "fill")
            .join_with("&")
            .formatter(key_equals_value),
    )
});

pub struct Imgix;

impl ImageProvider for Imgix {
    fn get_image(
        &self,
        src: &str,
        options: &ProviderOptions,
        _ctx: &ImageContext<'_>,
    ) -> ResolvedImage {
        let query = query_suffix(&OPERATIONS.generate(&options.modifiers));
        let path = if has_protocol(src) {
            src.to_string()
        } else {
            join_url(&[options.base_url().unwrap_or("/"), src])
        };
        ResolvedImage::new(path + &query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_screens;

    #[test]
    fn encodes_fit_and_dimensions() {
        let screens = default_screens();
        let ctx = ImageContext {
            screens: &screens,
            base_url: "/",
        };
        let mut options = ProviderOptions {
            base_url: Some("https://assets.imgix.net".into()),
            ..Default::default()
        };
        options.modifiers.set("width", 640u32);
        options.modifiers.set("fit", "inside");
        options.modifiers.set("format", "avif");
        assert_eq!(
            Imgix.get_image("/blog/a.jpg", &options, &ctx).url,
            "https://assets.imgix.net/blog/a.jpg?w=640&fit=max&fm=avif"
        );
        assert_eq!(
            Imgix
                .get_image("https://x.example.com/a.jpg", &options, &ctx)
                .url,
            "https://x.example.com/a.jpg?w=640&fit=max&fm=avif"
        );
    }
}
