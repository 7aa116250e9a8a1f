//! `<picture>` source planning: one responsive source per output format,
//! with a widely supported legacy format last for the fallback `<img>`.

use crate::image::{ImageEngine, ImageError};
use crate::modifiers::FORMAT;
use crate::sizes::{Sizes, SizesRequest};
use crate::urls::file_extension;
use serde::Serialize;

/// Source formats that may carry transparency; their legacy fallback is PNG.
const TRANSPARENT_FORMATS: [&str; 4] = ["png", "webp", "gif", "svg"];

#[derive(Debug, Clone, Default)]
pub struct PictureRequest {
    pub image: SizesRequest,
    /// Comma-separated formats, e.g. `"avif,webp"`. Defaults to the config.
    pub format: Option<String>,
    /// Format of the final source. Defaults to `png` for formats that may be
    /// transparent and `jpeg` otherwise.
    pub legacy_format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PictureSource {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srcset: Option<String>,
}

impl ImageEngine {
    /// Plan the sources of a `<picture>`; the last entry feeds the `<img>`.
    ///
    /// SVG sources are never rasterized and come back as a single source
    /// without `type`, `sizes` or `srcset`.
    pub fn picture_sources(
        &self,
        src: &str,
        request: &PictureRequest,
    ) -> Result<Vec<PictureSource>, ImageError> {
        let original = file_extension(src);
        let is_svg = original.as_deref() == Some("svg");

        let mut formats: Vec<String> = match request.format.as_deref() {
            Some(list) if !list.trim().is_empty() => list
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect(),
            _ if is_svg => vec!["svg".to_string()],
            _ if !self.config().format.is_empty() => self.config().format.clone(),
            _ => vec!["webp".to_string()],
        };

        if formats.first().map(String::as_str) == Some("svg") {
            if src.trim().is_empty() {
                return Err(ImageError::EmptySource);
            }
            return Ok(vec![PictureSource {
                mime_type: None,
                src: src.to_string(),
                sizes: None,
                srcset: None,
            }]);
        }

        let legacy = request.legacy_format.clone().unwrap_or_else(|| {
            let transparent = original
                .as_deref()
                .is_some_and(|ext| TRANSPARENT_FORMATS.contains(&ext));
            let fallback = if transparent { "png" } else { "jpeg" };
            fallback.to_string()
        });
        formats.retain(|f| *f != legacy);
        formats.push(legacy);

        let sizes = request
            .image
            .sizes
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Sizes::from_screens(&self.config().screens));

        formats
            .into_iter()
            .map(|format| {
                let mut image = request.image.clone();
                image.sizes = Some(sizes.clone());
                image.modifiers.set(FORMAT, format.as_str());
                let resolved = self.get_sizes(src, &image)?;
                Ok(PictureSource {
                    mime_type: Some(format!("image/{format}")),
                    src: resolved.src,
                    sizes: resolved.sizes,
                    srcset: resolved.srcset,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageConfig;
    use crate::test_helpers::{engine_with, screens};

    fn engine() -> ImageEngine {
        engine_with(ImageConfig {
            provider: "ipx".into(),
            screens: screens(&[("sm", 640), ("md", 768)]),
            ..Default::default()
        })
    }

    fn types(sources: &[PictureSource]) -> Vec<&str> {
        sources
            .iter()
            .map(|s| s.mime_type.as_deref().unwrap_or("-"))
            .collect()
    }

    #[test]
    fn default_formats_end_with_legacy_jpeg() {
        let sources = engine()
            .picture_sources("/a.jpg", &PictureRequest::default())
            .unwrap();
        assert_eq!(types(&sources), vec!["image/webp", "image/jpeg"]);
        assert_eq!(sources[1].src, "/_ipx/f_jpeg&w_640/a.jpg");
    }

    #[test]
    fn transparent_source_falls_back_to_png() {
        let request = PictureRequest {
            format: Some("avif, webp".into()),
            ..Default::default()
        };
        let sources = engine().picture_sources("/logo.png", &request).unwrap();
        assert_eq!(types(&sources), vec!["image/avif", "image/webp", "image/png"]);
    }

    #[test]
    fn legacy_format_listed_once_and_last() {
        let request = PictureRequest {
            format: Some("jpeg,webp".into()),
            ..Default::default()
        };
        let sources = engine().picture_sources("/a.jpg", &request).unwrap();
        assert_eq!(types(&sources), vec!["image/webp", "image/jpeg"]);
    }

    #[test]
    fn svg_source_is_not_rasterized() {
        let sources = engine()
            .picture_sources("/icon.svg", &PictureRequest::default())
            .unwrap();
        assert_eq!(
            sources,
            vec![PictureSource {
                mime_type: None,
                src: "/icon.svg".into(),
                sizes: None,
                srcset: None,
            }]
        );
    }

    #[test]
    fn explicit_sizes_are_shared_by_all_sources() {
        let mut request = PictureRequest::default();
        request.image.sizes = Some(Sizes::parse("sm:300 md:600"));
        let sources = engine().picture_sources("/a.jpg", &request).unwrap();
        for source in &sources {
            assert_eq!(source.sizes.as_deref(), Some("(max-width: 768px) 300px, 600px"));
        }
        assert_eq!(
            sources[0].srcset.as_deref(),
            Some("/_ipx/f_webp&w_300/a.jpg 300w, /_ipx/f_webp&w_600/a.jpg 600w")
        );
    }
}
