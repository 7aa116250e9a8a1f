//! HTML rendering of resolved images with maud.
//!
//! Attribute values are escaped by maud; optional attributes are omitted
//! entirely rather than rendered empty.

use crate::picture::PictureSource;
use crate::sizes::ImageSizes;
use maud::{Markup, html};

/// Extra `<img>` attributes that pass through unchanged.
#[derive(Debug, Clone, Default)]
pub struct ImgAttrs<'a> {
    pub alt: Option<&'a str>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// `lazy` or `eager`.
    pub loading: Option<&'a str>,
    /// Shown as `src` instead of the image; `sizes` and `srcset` are left
    /// out while it is set.
    pub placeholder: Option<&'a str>,
}

/// `<img>` for a single responsive image.
pub fn render_img(image: &ImageSizes, attrs: &ImgAttrs<'_>) -> Markup {
    let responsive = attrs.placeholder.is_none();
    html! {
        img src=(attrs.placeholder.unwrap_or(image.src.as_str()))
            sizes=[image.sizes.as_deref().filter(|_| responsive)]
            srcset=[image.srcset.as_deref().filter(|_| responsive)]
            width=[attrs.width]
            height=[attrs.height]
            loading=[attrs.loading]
            alt=[attrs.alt];
    }
}

/// `<picture>` with one `<source>` per planned format.
///
/// The last planned source becomes the fallback `<img>`. Renders nothing for
/// an empty plan. Placeholders apply to plain `<img>` only.
pub fn render_picture(sources: &[PictureSource], attrs: &ImgAttrs<'_>) -> Markup {
    let Some((fallback, rest)) = sources.split_last() else {
        return html! {};
    };
    let attrs = ImgAttrs {
        placeholder: None,
        ..attrs.clone()
    };
    let fallback = ImageSizes {
        src: fallback.src.clone(),
        sizes: fallback.sizes.clone(),
        srcset: fallback.srcset.clone(),
    };
    html! {
        picture {
            @for source in rest {
                source type=[source.mime_type.as_deref()]
                    sizes=[source.sizes.as_deref()]
                    srcset=[source.srcset.as_deref()];
            }
            (render_img(&fallback, &attrs))
        }
    }
}
