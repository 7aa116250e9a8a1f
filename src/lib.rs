//! # imgsrc
//!
//! Provider-agnostic image URL generation. One call site describes an image
//! (a source plus modifiers such as width, format and quality) and the engine
//! turns it into the URL of whichever image CDN, platform optimizer or
//! self-hosted resizer is active, along with `srcset`/`sizes` attributes for
//! responsive markup.
//!
//! # Architecture
//!
//! ```text
//! image.toml ─► config ─► setup ──────────────► ImageEngine
//!                           │ resolver picks the provider
//!                           │ providers run their setup routines
//!                           └► HostConfig (routes, platform image settings)
//!
//! ImageEngine::url / get_image     src + modifiers ─► provider URL
//! ImageEngine::get_sizes           ─► src, sizes, srcset
//! ImageEngine::picture_sources     ─► one <source> per format
//! ImageEngine::placeholder         ─► tiny blurred stand-in URL
//! ```
//!
//! Setup happens once. The engine it returns is immutable and every request
//! after that is a pure function of the engine and the request.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `image.toml` loading, stock defaults, validation |
//! | [`resolver`] | Provider selection: env override, user choice, platform detection |
//! | [`setup`] | Startup: provider resolution, setup routines, ipx fallback |
//! | [`image`] | The engine: source normalization, aliasing, domain checks, modifier layering |
//! | [`sizes`] | Responsive `sizes`/`srcset` computation |
//! | [`picture`] | Multi-format `<picture>` source planning |
//! | [`placeholder`] | Blurred low-quality placeholder URLs |
//! | [`render`] | `<img>`/`<picture>` markup with Maud |
//! | [`providers`] | Built-in provider implementations and the [`ImageProvider`] trait |
//! | [`operations`] | Modifier → provider parameter encoding |
//! | [`modifiers`] | Ordered modifier sets and size coercion |
//! | [`urls`] | URL joining and escaping helpers |
//! | [`output`] | CLI output formatting |
//!
//! # Example
//!
//! ```
//! use imgsrc::config::ImageConfig;
//! use imgsrc::modifiers::Modifiers;
//! use imgsrc::setup::{HostConfig, Setup};
//!
//! let mut host = HostConfig::default();
//! let engine = Setup::new(ImageConfig::default()).install(&mut host).unwrap();
//!
//! let mut modifiers = Modifiers::new();
//! modifiers.set("width", 300u32);
//! let url = engine.url("/photos/a.jpg", &modifiers, &Default::default()).unwrap();
//! assert_eq!(url, "/_ipx/w_300/photos/a.jpg");
//! assert_eq!(host.handlers[0].route, "/_ipx/**");
//! ```

pub mod config;
pub mod image;
pub mod modifiers;
pub mod operations;
pub mod output;
pub mod picture;
pub mod placeholder;
pub mod providers;
pub mod render;
pub mod resolver;
pub mod setup;
pub mod sizes;
pub mod urls;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use image::{ImageEngine, ImageError, RequestOptions};
pub use placeholder::Placeholder;
pub use providers::ImageProvider;
pub use setup::{HostConfig, Setup, SetupError};
pub use sizes::{ImageSizes, Sizes, SizesRequest};
