//! Prepr asset CDN.
//!
//! Operations live in the path: `https://<project>.stream.prepr.io/w_300,format_webp/<src>`.
//! `project_name` is mandatory.

use super::{ImageContext, ImageProvider, ProviderOptions, ResolvedImage, warn_missing};
use crate::operations::{
    OperationsConfig, OperationsGenerator, key_underscore_value, make_generator,
};
use crate::urls::{has_protocol, join_url};
use std::sync::LazyLock;

const FILE_BUCKET: &str = "stream";
const PROJECT_NAME: &str = "project_name";

static OPERATIONS: LazyLock<OperationsGenerator> = LazyLock::new(|| {
    make_generator(
        OperationsConfig::new()
            .key("width", "w")
            .key("height", "h")
            .key("quality", "q")
            .key("crop", "c")
            .join_with(",")
            .formatter(key_underscore_value),
    )
});

pub struct Prepr;

impl ImageProvider for Prepr {
    fn get_image(
        &self,
        src: &str,
        options: &ProviderOptions,
        _ctx: &ImageContext<'_>,
    ) -> ResolvedImage {
        // Path operations cannot be grafted onto a foreign URL.
        if has_protocol(src) {
            return ResolvedImage::new(src);
        }

        let project = match options.extra_str(PROJECT_NAME) {
            Some(project) => project,
            None => {
                warn_missing("prepr", &self.missing_options(options));
                "<projectName>"
            }
        };
        let operations = OPERATIONS.generate(&options.modifiers);
        let project_url = format!("https://{project}.{FILE_BUCKET}.prepr.io");
        ResolvedImage::new(join_url(&[&project_url, &operations, src]))
    }

    fn missing_options(&self, options: &ProviderOptions) -> Vec<&'static str> {
        if options.extra_str(PROJECT_NAME).is_some() {
            Vec::new()
        } else {
            vec!["<projectName>"]
        }
    }
}
