//! `none`: serve the source as-is, ignoring every modifier.

use super::{ImageContext, ImageProvider, ProviderOptions, ResolvedImage};

pub struct Passthrough;

impl ImageProvider for Passthrough {
    fn get_image(
        &self,
        src: &str,
        _options: &ProviderOptions,
        _ctx: &ImageContext<'_>,
    ) -> ResolvedImage {
        ResolvedImage::new(src)
    }
}
