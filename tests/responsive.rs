//! End-to-end: `image.toml` on disk → setup → URLs, srcsets and markup.

use imgsrc::config::load_config;
use imgsrc::modifiers::Modifiers;
use imgsrc::picture::PictureRequest;
use imgsrc::render::{ImgAttrs, render_picture};
use imgsrc::resolver::Platform;
use imgsrc::setup::{Mode, Setup};
use imgsrc::{HostConfig, ImageEngine, RequestOptions, SetupError, Sizes, SizesRequest};
use std::fs;
use tempfile::TempDir;

fn install(toml: &str) -> (ImageEngine, HostConfig) {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("image.toml"), toml).unwrap();
    let config = load_config(tmp.path()).unwrap();
    let mut host = HostConfig::default();
    let engine = Setup::new(config).install(&mut host).unwrap();
    (engine, host)
}

fn width(px: u32) -> Modifiers {
    let mut m = Modifiers::new();
    m.set("width", px);
    m
}

#[test]
fn missing_config_file_falls_back_to_ipx() {
    let tmp = TempDir::new().unwrap();
    let config = load_config(tmp.path()).unwrap();
    let mut host = HostConfig::default();
    let engine = Setup::new(config).install(&mut host).unwrap();

    assert_eq!(engine.default_provider(), "ipx");
    assert_eq!(host.handlers.len(), 1);
    assert_eq!(
        engine.url("/a.jpg", &width(300), &RequestOptions::default()).unwrap(),
        "/_ipx/w_300/a.jpg"
    );
}

#[test]
fn cloudimage_from_config() {
    let (engine, host) = install(
        r#"
provider = "cloudimage"

[providers.cloudimage.options]
token = "demo"
base_url = "sample.li"
api_version = "v7"
"#,
    );
    assert!(host.handlers.is_empty());
    let mut m = width(200);
    m.set("format", "webp");
    assert_eq!(
        engine.url("/bag.jpg", &m, &RequestOptions::default()).unwrap(),
        "https://demo.cloudimg.io/v7/sample.li/bag.jpg?width=200&force_format=webp"
    );
}

#[test]
fn preset_and_quality_from_config() {
    let (engine, _) = install(
        r#"
provider = "imgix"
quality = 70

[presets.thumb]
width = 64
height = 64
fit = "cover"

[providers.imgix.options]
base_url = "https://assets.imgix.net"
"#,
    );
    let url = engine
        .url("/a.jpg", &Modifiers::new(), &RequestOptions::default().preset("thumb"))
        .unwrap();
    assert_eq!(url, "https://assets.imgix.net/a.jpg?w=64&h=64&fit=crop&q=70");
}

#[test]
fn srcset_uses_configured_screens() {
    let (engine, _) = install(
        r#"
[screens]
sm = 640
md = 768
"#,
    );
    let request = SizesRequest {
        sizes: Some(Sizes::parse("sm:300 md:600")),
        ..Default::default()
    };
    let sizes = engine.get_sizes("/a.jpg", &request).unwrap();
    assert_eq!(sizes.sizes.as_deref(), Some("(max-width: 768px) 300px, 600px"));
    assert_eq!(
        sizes.srcset.as_deref(),
        Some("/_ipx/w_300/a.jpg 300w, /_ipx/w_600/a.jpg 600w")
    );
}

#[test]
fn configured_densities_drive_density_mode() {
    let (engine, _) = install("densities = [1, 1.5, 3]\n");
    let request = SizesRequest {
        modifiers: width(100),
        ..Default::default()
    };
    let sizes = engine.get_sizes("/a.jpg", &request).unwrap();
    assert_eq!(
        sizes.srcset.as_deref(),
        Some("/_ipx/w_100/a.jpg 1x, /_ipx/w_150/a.jpg 1.5x, /_ipx/w_300/a.jpg 3x")
    );
}

#[test]
fn picture_markup_end_to_end() {
    let (engine, _) = install(
        r#"
format = ["avif", "webp"]

[screens]
md = 768
"#,
    );
    let sources = engine
        .picture_sources("/a.jpg", &PictureRequest::default())
        .unwrap();
    let html = render_picture(
        &sources,
        &ImgAttrs {
            alt: Some("A"),
            ..Default::default()
        },
    )
    .into_string();
    assert!(html.starts_with(r#"<picture><source type="image/avif""#));
    assert!(html.contains(r#"<source type="image/webp""#));
    assert!(html.contains(r#"<img src="/_ipx/f_jpeg&amp;w_320/a.jpg""#));
    assert!(html.ends_with(r#"alt="A"></picture>"#));
}

#[test]
fn platform_detection_overrides_auto() {
    let tmp = TempDir::new().unwrap();
    let config = load_config(tmp.path()).unwrap();
    let mut host = HostConfig::default();
    let engine = Setup::new(config)
        .platform(Platform::AwsAmplify)
        .install(&mut host)
        .unwrap();
    assert_eq!(engine.default_provider(), "awsAmplify");
    assert_eq!(
        engine.url("/a.jpg", &width(640), &RequestOptions::default()).unwrap(),
        "/_amplify/image?url=%2Fa.jpg&w=640&q=100"
    );
    let platform = host.platform_images.unwrap();
    assert_eq!(platform.route.as_deref(), Some("/_amplify/image"));
}

#[test]
fn production_mode_requires_credentials() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("image.toml"), "provider = \"prepr\"\n").unwrap();
    let config = load_config(tmp.path()).unwrap();
    let result = Setup::new(config)
        .mode(Mode::Production)
        .install(&mut HostConfig::default());
    match result {
        Err(SetupError::MissingOptions { provider, .. }) => assert_eq!(provider, "prepr"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("setup should fail without project_name"),
    }
}
