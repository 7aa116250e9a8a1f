//! Responsive image attributes: `src`, `sizes` and `srcset`.
//!
//! Two modes, picked by whether a `sizes` description yields any variant:
//!
//! * **sizes mode**: one variant per breakpoint entry, width descriptors
//!   (`/img.jpg 300w`) in ascending breakpoint order and a `sizes` attribute
//!   of media conditions. `src` is the smallest breakpoint's variant;
//! * **density mode**: the base width/height scaled by each pixel density,
//!   density descriptors (`/img.jpg 2x`) and no `sizes` attribute.
//!
//! A sizes entry is `<key>:<size>`. The key is a screen label from the config
//! or a raw pixel width (`"1px"` for unconditional entries); the size is
//! `300`, `300px`, `50vw` or `2x` (twice the base width).

use crate::config::Screens;
use crate::image::{ImageEngine, ImageError, RequestOptions};
use crate::modifiers::{HEIGHT, Modifiers, WIDTH, parse_size};
use serde::{Deserialize, Serialize};

/// Key used for entries without a breakpoint.
const UNCONDITIONAL: &str = "1px";

/// Ordered `breakpoint → size` description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SizesInput", into = "Vec<(String, String)>")]
pub struct Sizes {
    entries: Vec<(String, String)>,
}

/// Accepted serialized forms: the shorthand string, a breakpoint-keyed table
/// (`{ sm = "100vw", md = 400 }`) or a list of `[key, size]` pairs.
#[derive(Deserialize)]
#[serde(untagged)]
enum SizesInput {
    Shorthand(String),
    Table(toml::Table),
    Pairs(Vec<(String, toml::Value)>),
}

/// Size specs may be written as strings or bare pixel widths.
fn size_spec(key: &str, value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(n) => Some(n.to_string()),
        other => {
            log::debug!("ignoring sizes entry {key}: {other} is not a size");
            None
        }
    }
}

impl From<SizesInput> for Sizes {
    fn from(input: SizesInput) -> Self {
        match input {
            SizesInput::Shorthand(s) => Sizes::parse(&s),
            SizesInput::Table(table) => table
                .iter()
                .filter_map(|(key, value)| Some((key.as_str(), size_spec(key, value)?)))
                .collect(),
            SizesInput::Pairs(pairs) => pairs
                .iter()
                .filter_map(|(key, value)| Some((key.as_str(), size_spec(key, value)?)))
                .collect(),
        }
    }
}

impl From<Sizes> for Vec<(String, String)> {
    fn from(sizes: Sizes) -> Self {
        sizes.entries
    }
}

impl Sizes {
    /// Parse the shorthand form, e.g. `"100vw sm:50vw md:400px"`.
    ///
    /// Tokens are separated by whitespace or commas. A token without a
    /// `key:` prefix applies unconditionally. A repeated key replaces the
    /// earlier value in place.
    pub fn parse(input: &str) -> Self {
        input
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
            .map(|token| match token.split_once(':') {
                Some((key, spec)) if !spec.contains(':') => (key, spec),
                _ => (UNCONDITIONAL, token),
            })
            .collect()
    }

    /// Every configured screen at its own width.
    pub fn from_screens(screens: &Screens) -> Self {
        screens
            .iter()
            .map(|(label, width)| (label.as_str(), width.to_string()))
            .collect()
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, key: &str, spec: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = spec.to_string(),
            None => self.entries.push((key.to_string(), spec.to_string())),
        }
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for Sizes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut sizes = Sizes::default();
        for (key, spec) in iter {
            sizes.insert(key.as_ref(), spec.as_ref());
        }
        sizes
    }
}

/// Everything [`ImageEngine::get_sizes`] needs besides the source.
#[derive(Debug, Clone, Default)]
pub struct SizesRequest {
    pub sizes: Option<Sizes>,
    /// Density list such as `"x1 x2"` or `"1x, 2x"`; the config default
    /// applies when unset.
    pub densities: Option<String>,
    pub modifiers: Modifiers,
    pub options: RequestOptions,
}

/// Attributes for an `<img>` or `<source>` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSizes {
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srcset: Option<String>,
}

/// Parse a density list. Accepts `x2`, `2x` and `2`; invalid tokens are
/// skipped. The result is sorted and deduplicated.
pub fn parse_densities(input: &str) -> Vec<f64> {
    let parsed: Vec<f64> = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            let number = token
                .strip_prefix('x')
                .or_else(|| token.strip_suffix('x'))
                .unwrap_or(token);
            let density = number.parse::<f64>().ok().filter(|d| d.is_finite() && *d > 0.0);
            if density.is_none() {
                log::debug!("ignoring density {token:?}");
            }
            density
        })
        .collect();
    normalize_densities(&parsed)
}

fn normalize_densities(densities: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = densities
        .iter()
        .copied()
        .filter(|d| d.is_finite() && *d > 0.0)
        .collect();
    out.sort_by(f64::total_cmp);
    out.dedup();
    out
}

fn scale(px: u32, factor: f64) -> u32 {
    (f64::from(px) * factor).round() as u32
}

/// `parseInt`-style leading integer of a breakpoint key such as `"640px"`.
fn leading_int(key: &str) -> Option<u32> {
    let digits: String = key
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

fn positive(number: &str) -> Option<f64> {
    number
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n > 0.0)
}

struct BaseSize {
    width: Option<u32>,
    height: Option<u32>,
    hw_ratio: Option<f64>,
}

#[derive(Debug)]
struct SizeVariant {
    screen: u32,
    size: String,
    width: u32,
    height: Option<u32>,
}

fn absolute_width(key: &str, spec: &str, digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        log::debug!("ignoring sizes entry {key}:{spec}: unsupported size");
        return None;
    }
    digits.parse().ok()
}

fn size_variant(key: &str, spec: &str, base: &BaseSize, screens: &Screens) -> Option<SizeVariant> {
    let screen = screens
        .get(key)
        .copied()
        .or_else(|| leading_int(key))
        .filter(|s| *s > 0);
    let Some(screen) = screen else {
        log::debug!("ignoring sizes entry {key}:{spec}: unknown breakpoint");
        return None;
    };

    let spec = spec.trim();
    let width = if let Some(percent) = spec.strip_suffix("vw") {
        scale(screen, positive(percent)? / 100.0)
    } else if let Some(digits) = spec.strip_suffix("px") {
        absolute_width(key, spec, digits)?
    } else if let Some(factor) = spec.strip_suffix('x') {
        scale(base.width?, positive(factor)?)
    } else {
        absolute_width(key, spec, spec)?
    };
    let size = if spec.ends_with("vw") {
        spec.to_string()
    } else {
        format!("{width}px")
    };
    if width == 0 {
        return None;
    }

    let height = match base.hw_ratio {
        Some(ratio) => Some(scale(width, ratio)),
        None => base.height,
    };
    Some(SizeVariant {
        screen,
        size,
        width,
        height,
    })
}

impl ImageEngine {
    /// Compute `src`, `sizes` and `srcset` for `src`.
    pub fn get_sizes(&self, src: &str, request: &SizesRequest) -> Result<ImageSizes, ImageError> {
        let width = request
            .modifiers
            .get(WIDTH)
            .and_then(parse_size)
            .filter(|w| *w > 0);
        let height = request
            .modifiers
            .get(HEIGHT)
            .and_then(parse_size)
            .filter(|h| *h > 0);
        let base = BaseSize {
            width,
            height,
            hw_ratio: match (width, height) {
                (Some(w), Some(h)) => Some(f64::from(h) / f64::from(w)),
                _ => None,
            },
        };
        let requested = request
            .densities
            .as_deref()
            .map(parse_densities)
            .filter(|d| !d.is_empty());

        let mut variants: Vec<SizeVariant> = request
            .sizes
            .iter()
            .flat_map(Sizes::entries)
            .filter_map(|(key, spec)| size_variant(key, spec, &base, &self.config().screens))
            .collect();

        if variants.is_empty() {
            let densities =
                requested.unwrap_or_else(|| normalize_densities(&self.config().densities));
            return self.density_sizes(src, request, &base, &densities);
        }

        variants.sort_by_key(|v| v.screen);
        let densities = requested.unwrap_or_else(|| vec![1.0]);

        let mut conditions: Vec<&SizeVariant> = Vec::with_capacity(variants.len());
        for variant in &variants {
            if conditions.last().is_some_and(|last| last.screen == variant.screen) {
                conditions.pop();
            }
            conditions.push(variant);
        }
        let sizes = conditions
            .iter()
            .enumerate()
            .map(|(i, variant)| match conditions.get(i + 1) {
                Some(next) => format!("(max-width: {}px) {}", next.screen, variant.size),
                None => variant.size.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");

        let mut candidates: Vec<(u32, String)> = Vec::new();
        for variant in &variants {
            for &density in &densities {
                let width = scale(variant.width, density);
                if width == 0 || candidates.iter().any(|(w, _)| *w == width) {
                    continue;
                }
                let height = variant.height.map(|h| scale(h, density));
                candidates.push((width, self.variant_url(src, request, Some(width), height)?));
            }
        }

        let src = match candidates.first() {
            Some((_, url)) => url.clone(),
            None => self.url(src, &request.modifiers, &request.options)?,
        };
        let srcset = candidates
            .iter()
            .map(|(w, url)| format!("{url} {w}w"))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(ImageSizes {
            src,
            sizes: Some(sizes),
            srcset: Some(srcset).filter(|s| !s.is_empty()),
        })
    }

    fn density_sizes(
        &self,
        src: &str,
        request: &SizesRequest,
        base: &BaseSize,
        densities: &[f64],
    ) -> Result<ImageSizes, ImageError> {
        if base.width.is_none() || densities.is_empty() {
            return Ok(ImageSizes {
                src: self.url(src, &request.modifiers, &request.options)?,
                sizes: None,
                srcset: None,
            });
        }

        let mut candidates = Vec::with_capacity(densities.len());
        for &density in densities {
            let url = self.variant_url(
                src,
                request,
                base.width.map(|w| scale(w, density)),
                base.height.map(|h| scale(h, density)),
            )?;
            candidates.push((density, url));
        }

        let primary = candidates
            .iter()
            .find(|(d, _)| (d - 1.0).abs() < f64::EPSILON)
            .or(candidates.first())
            .map(|(_, url)| url.clone())
            .unwrap_or_default();
        let srcset = candidates
            .iter()
            .map(|(density, url)| format!("{url} {density}x"))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(ImageSizes {
            src: primary,
            sizes: None,
            srcset: Some(srcset),
        })
    }

    fn variant_url(
        &self,
        src: &str,
        request: &SizesRequest,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<String, ImageError> {
        let mut modifiers = request.modifiers.clone();
        modifiers.set_opt(WIDTH, width.map(Into::into));
        modifiers.set_opt(HEIGHT, height.map(Into::into));
        self.url(src, &modifiers, &request.options)
    }
}
