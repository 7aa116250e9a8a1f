//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Url
//!
//! ```text
//! /_ipx/w_300&f_webp/a.jpg
//!     Provider: ipx
//!     Format: webp
//! ```
//!
//! ## Sizes
//!
//! ```text
//! src     /_ipx/w_300/a.jpg
//! sizes   (max-width: 768px) 300px, 600px
//! srcset
//!     300w  /_ipx/w_300/a.jpg
//!     600w  /_ipx/w_600/a.jpg
//! placeholder /_ipx/q_50&blur_3&s_10x10/a.jpg
//! ```
//!
//! ## Providers
//!
//! ```text
//! * ipx (self-hosted)
//!   imgix → https://assets.imgix.net
//!
//! Routes
//!     /_ipx/** → ipx
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::image::ImageEngine;
use crate::picture::PictureSource;
use crate::providers::ResolvedImage;
use crate::setup::HostConfig;
use crate::sizes::ImageSizes;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// One line per srcset candidate, descriptor first.
fn srcset_lines(srcset: &str, depth: usize) -> Vec<String> {
    srcset
        .split(", ")
        .map(|entry| match entry.rsplit_once(' ') {
            Some((url, descriptor)) => format!("{}{:<5} {}", indent(depth), descriptor, url),
            None => format!("{}{}", indent(depth), entry),
        })
        .collect()
}

// ============================================================================
// url
// ============================================================================

pub fn format_url_output(image: &ResolvedImage, provider: &str) -> Vec<String> {
    let mut lines = vec![image.url.clone(), format!("{}Provider: {}", indent(1), provider)];
    if let Some(format) = &image.format {
        lines.push(format!("{}Format: {}", indent(1), format));
    }
    lines
}

pub fn print_url_output(image: &ResolvedImage, provider: &str) {
    for line in format_url_output(image, provider) {
        println!("{}", line);
    }
}

// ============================================================================
// sizes
// ============================================================================

pub fn format_sizes_output(sizes: &ImageSizes, placeholder: Option<&str>) -> Vec<String> {
    let mut lines = vec![format!("src     {}", sizes.src)];
    if let Some(attr) = &sizes.sizes {
        lines.push(format!("sizes   {}", attr));
    }
    if let Some(srcset) = &sizes.srcset {
        lines.push("srcset".to_string());
        lines.extend(srcset_lines(srcset, 1));
    }
    if let Some(url) = placeholder {
        lines.push(format!("placeholder {}", url));
    }
    lines
}

pub fn print_sizes_output(sizes: &ImageSizes, placeholder: Option<&str>) {
    for line in format_sizes_output(sizes, placeholder) {
        println!("{}", line);
    }
}

// ============================================================================
// picture
// ============================================================================

/// One block per source; the final block is marked as the `<img>` fallback.
pub fn format_picture_output(sources: &[PictureSource]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, source) in sources.iter().enumerate() {
        let label = source.mime_type.as_deref().unwrap_or("original");
        if i + 1 == sources.len() {
            lines.push(format!("{} (img)", label));
        } else {
            lines.push(label.to_string());
        }
        lines.push(format!("{}src: {}", indent(1), source.src));
        if let Some(sizes) = &source.sizes {
            lines.push(format!("{}sizes: {}", indent(1), sizes));
        }
        if let Some(srcset) = &source.srcset {
            lines.extend(srcset_lines(srcset, 2));
        }
    }
    lines
}

pub fn print_picture_output(sources: &[PictureSource]) {
    for line in format_picture_output(sources) {
        println!("{}", line);
    }
}

// ============================================================================
// providers
// ============================================================================

/// Resolved providers (default one starred) and the host routes setup mounted.
pub fn format_providers_output(engine: &ImageEngine, host: &HostConfig) -> Vec<String> {
    let mut lines = Vec::new();
    for provider in engine.providers() {
        let marker = if provider.name == engine.default_provider() {
            "*"
        } else {
            " "
        };
        let mut line = format!("{} {}", marker, provider.name);
        if provider.implementation.is_self_hosted() {
            line.push_str(" (self-hosted)");
        }
        if let Some(base) = provider.defaults.base_url() {
            line.push_str(&format!(" → {}", base));
        }
        lines.push(line);
    }

    let routes: Vec<_> = host.handlers.iter().chain(&host.dev_handlers).collect();
    if !routes.is_empty() {
        lines.push(String::new());
        lines.push("Routes".to_string());
        for route in routes {
            lines.push(format!("{}{} → {}", indent(1), route.route, route.handler));
        }
    }

    if let Some(platform) = &host.platform_images {
        lines.push(String::new());
        lines.push(format!("Platform images ({})", platform.platform));
        let sizes: Vec<String> = platform.sizes.iter().map(u32::to_string).collect();
        lines.push(format!("{}Sizes: {}", indent(1), sizes.join(", ")));
        if !platform.domains.is_empty() {
            lines.push(format!("{}Domains: {}", indent(1), platform.domains.join(", ")));
        }
    }
    lines
}

pub fn print_providers_output(engine: &ImageEngine, host: &HostConfig) {
    for line in format_providers_output(engine, host) {
        println!("{}", line);
    }
}
