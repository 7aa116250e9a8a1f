//! Low-quality placeholder URLs shown in place of an image until it loads.
//!
//! A placeholder is either a ready-made URL or a tiny, blurred rendition of
//! the same source built through the active provider.

use crate::image::{ImageEngine, ImageError, RequestOptions};
use crate::modifiers::{HEIGHT, Modifiers, QUALITY, WIDTH};
use std::convert::Infallible;
use std::str::FromStr;

pub const BLUR: &str = "blur";

const DEFAULT_SIZE: u32 = 10;
const DEFAULT_QUALITY: u32 = 50;
const DEFAULT_BLUR: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    /// Used as the placeholder URL unchanged.
    Url(String),
    /// Rendition of the source. Zero or missing quality and blur fall back to
    /// 50 and 3.
    Size {
        width: u32,
        height: u32,
        quality: Option<u32>,
        blur: Option<u32>,
    },
}

impl Default for Placeholder {
    fn default() -> Self {
        Self::square(DEFAULT_SIZE)
    }
}

impl Placeholder {
    pub fn square(px: u32) -> Self {
        Self::Size {
            width: px,
            height: px,
            quality: None,
            blur: None,
        }
    }

    /// Parse the command-line form.
    ///
    /// Empty or `true` is the default 10x10 rendition, `N` a square of `N`
    /// pixels and `W,H[,Q[,B]]` spells out every value. Anything else is
    /// taken as a literal URL.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() || input == "true" {
            return Self::default();
        }
        let numbers: Option<Vec<u32>> = input
            .split(',')
            .map(|part| part.trim().parse::<u32>().ok())
            .collect();
        match numbers.as_deref() {
            Some([px]) => Self::square(*px),
            Some([width, height, rest @ ..]) if rest.len() <= 2 => Self::Size {
                width: *width,
                height: *height,
                quality: rest.first().copied(),
                blur: rest.get(1).copied(),
            },
            _ => Self::Url(input.to_string()),
        }
    }
}

impl FromStr for Placeholder {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl ImageEngine {
    /// Placeholder URL for `src`. Renditions keep the request's modifiers and
    /// override size, quality and blur.
    pub fn placeholder(
        &self,
        src: &str,
        placeholder: &Placeholder,
        modifiers: &Modifiers,
        options: &RequestOptions,
    ) -> Result<String, ImageError> {
        let (width, height, quality, blur) = match placeholder {
            Placeholder::Url(url) => return Ok(url.clone()),
            Placeholder::Size {
                width,
                height,
                quality,
                blur,
            } => (*width, *height, *quality, *blur),
        };

        let mut modifiers = modifiers.clone();
        modifiers.set(WIDTH, width);
        modifiers.set(HEIGHT, height);
        modifiers.set(
            QUALITY,
            quality.filter(|q| *q > 0).unwrap_or(DEFAULT_QUALITY),
        );
        modifiers.set(BLUR, blur.filter(|b| *b > 0).unwrap_or(DEFAULT_BLUR));
        self.url(src, &modifiers, options)
    }
}
