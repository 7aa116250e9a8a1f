//! Self-hosted resizer (`ipx`).
//!
//! URLs have the shape `<base>/<operations>/<source>`, with `_` standing in
//! for "no operations". Width and height together fold into a single
//! `s_<w>x<h>` operation. This is the fallback provider: when nothing else is
//! configured, setup mounts its route at `/_ipx/**`.

use super::{ImageContext, ImageProvider, ProviderOptions, ResolvedImage};
use crate::config::ImageConfig;
use crate::modifiers::{HEIGHT, WIDTH};
use crate::operations::{OperationsConfig, OperationsGenerator, make_generator};
use crate::setup::{HostConfig, RouteHandler, SelfHostedOptions};
use crate::urls::{encode_param, encode_path, join_url};
use std::sync::LazyLock;

pub const DEFAULT_BASE_URL: &str = "/_ipx";

fn formatter(key: &str, value: &str) -> String {
    format!("{}_{}", encode_param(key), encode_param(value))
}

static OPERATIONS: LazyLock<OperationsGenerator> = LazyLock::new(|| {
    make_generator(
        OperationsConfig::new()
            .key("format", "f")
            .key("fit", "fit")
            .key("width", "w")
            .key("height", "h")
            .key("resize", "s")
            .key("quality", "q")
            .key("background", "b")
            .join_with("&")
            .formatter(formatter),
    )
});

pub struct Ipx;

impl Ipx {
    fn route_base(options: &ProviderOptions) -> String {
        options
            .base_url()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string()
    }
}

impl ImageProvider for Ipx {
    fn get_image(
        &self,
        src: &str,
        options: &ProviderOptions,
        ctx: &ImageContext<'_>,
    ) -> ResolvedImage {
        let mut modifiers = options.modifiers.clone();
        if let (Some(w), Some(h)) = (modifiers.get(WIDTH).cloned(), modifiers.get(HEIGHT).cloned())
        {
            modifiers.set("resize", format!("{w}x{h}"));
            modifiers.remove(WIDTH);
            modifiers.remove(HEIGHT);
        }

        let operations = OPERATIONS.generate(&modifiers);
        let operations = if operations.is_empty() {
            "_".to_string()
        } else {
            operations
        };

        let base = match options.base_url() {
            Some(base) => base.to_string(),
            None => join_url(&[ctx.base_url, DEFAULT_BASE_URL]),
        };
        ResolvedImage::new(join_url(&[&base, &operations, &encode_path(src)]))
    }

    fn validates_domains(&self) -> bool {
        true
    }

    fn supports_alias(&self) -> bool {
        true
    }

    fn setup(&self, options: &ProviderOptions, config: &ImageConfig, host: &mut HostConfig) {
        let base = Self::route_base(options);
        if host.has_handler_under(&base) {
            log::info!("a handler is already mounted under {base}, not installing ipx");
            return;
        }
        host.handlers.push(RouteHandler {
            route: format!("{base}/**"),
            handler: "ipx".to_string(),
        });
        host.self_hosted = Some(SelfHostedOptions {
            base_url: base,
            dir: config.dir.clone(),
            alias: config.alias.clone(),
            domains: config.domains.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_screens;
    use crate::modifiers::Modifiers;

    fn url_for(src: &str, modifiers: Modifiers) -> String {
        let screens = default_screens();
        let ctx = ImageContext {
            screens: &screens,
            base_url: "/",
        };
        let options = ProviderOptions {
            modifiers,
            ..Default::default()
        };
        Ipx.get_image(src, &options, &ctx).url
    }

    #[test]
    fn no_operations_uses_placeholder_segment() {
        assert_eq!(url_for("/a.jpg", Modifiers::new()), "/_ipx/_/a.jpg");
    }

    #[test]
    fn width_and_height_fold_into_resize() {
        let mut m = Modifiers::new();
        m.set("format", "webp");
        m.set("width", 300u32);
        m.set("height", 200u32);
        assert_eq!(url_for("/a.jpg", m), "/_ipx/f_webp&s_300x200/a.jpg");
    }

    #[test]
    fn single_dimension_stays_separate() {
        let m: Modifiers = [("width", 300u32)].into_iter().collect();
        assert_eq!(url_for("/a.jpg", m), "/_ipx/w_300/a.jpg");
    }

    #[test]
    fn source_path_is_encoded() {
        assert_eq!(url_for("/my pics/a.jpg", Modifiers::new()), "/_ipx/_/my%20pics/a.jpg");
    }

    #[test]
    fn app_base_url_prefixes_route() {
        let screens = default_screens();
        let ctx = ImageContext {
            screens: &screens,
            base_url: "/app/",
        };
        let url = Ipx.get_image("/a.jpg", &ProviderOptions::default(), &ctx).url;
        assert_eq!(url, "/app/_ipx/_/a.jpg");
    }

    #[test]
    fn setup_skips_when_route_taken() {
        let mut host = HostConfig::default();
        host.handlers.push(RouteHandler {
            route: "/_ipx/custom/**".into(),
            handler: "user".into(),
        });
        Ipx.setup(&ProviderOptions::default(), &ImageConfig::default(), &mut host);
        assert_eq!(host.handlers.len(), 1);
        assert!(host.self_hosted.is_none());
    }

    #[test]
    fn setup_mounts_route() {
        let mut host = HostConfig::default();
        Ipx.setup(&ProviderOptions::default(), &ImageConfig::default(), &mut host);
        assert_eq!(host.handlers.len(), 1);
        assert_eq!(host.handlers[0].route, "/_ipx/**");
        assert_eq!(host.self_hosted.as_ref().unwrap().base_url, "/_ipx");
    }
}
