use clap::{Parser, Subcommand};
use imgsrc::config;
use imgsrc::image::{ImageEngine, RequestOptions};
use imgsrc::modifiers::{BACKGROUND, FIT, FORMAT, HEIGHT, ModifierValue, Modifiers, QUALITY, WIDTH};
use imgsrc::output;
use imgsrc::picture::PictureRequest;
use imgsrc::placeholder::Placeholder;
use imgsrc::render::{self, ImgAttrs};
use imgsrc::resolver::Platform;
use imgsrc::setup::{HostConfig, Mode, Setup};
use imgsrc::sizes::{ImageSizes, Sizes, SizesRequest};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "imgsrc")]
#[command(about = "Build optimized image URLs and responsive attributes")]
#[command(long_about = "\
Build optimized image URLs and responsive attributes

Options are read from image.toml in the root directory, layered over the
stock defaults. The provider is picked in this order:

  1. IMGSRC_PROVIDER environment variable
  2. `provider` in image.toml, unless it is \"auto\"
  3. the hosting platform's optimizer (Vercel, AWS Amplify)
  4. the self-hosted ipx route at /_ipx

Run 'imgsrc gen-config' to generate a documented image.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing image.toml
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Hosting platform (vercel, aws_amplify); detected from the environment by default
    #[arg(long, global = true)]
    platform: Option<Platform>,

    /// Fail on missing provider options instead of warning
    #[arg(long, global = true)]
    production: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Modifier and request flags shared by the image commands.
#[derive(clap::Args, Clone)]
struct ImageArgs {
    /// Image source: path relative to the site or absolute URL
    src: String,

    #[arg(long)]
    width: Option<String>,

    #[arg(long)]
    height: Option<String>,

    #[arg(long)]
    format: Option<String>,

    #[arg(long)]
    quality: Option<String>,

    #[arg(long)]
    fit: Option<String>,

    #[arg(long)]
    background: Option<String>,

    /// Additional modifier, repeatable
    #[arg(short = 'm', long = "modifier", value_name = "KEY=VALUE", value_parser = parse_modifier)]
    modifiers: Vec<(String, ModifierValue)>,

    /// Named preset from image.toml
    #[arg(long)]
    preset: Option<String>,

    /// Provider to use instead of the default
    #[arg(long)]
    provider: Option<String>,
}

/// Responsive flags shared by `sizes` and `picture`.
#[derive(clap::Args, Clone)]
struct ResponsiveArgs {
    /// Breakpoint sizes, e.g. "100vw sm:50vw md:400px"
    #[arg(long)]
    sizes: Option<String>,

    /// Pixel densities, e.g. "x1 x2"
    #[arg(long)]
    densities: Option<String>,

    /// Print JSON instead of text
    #[arg(long, conflicts_with = "html")]
    json: bool,

    /// Print HTML markup instead of text
    #[arg(long)]
    html: bool,

    /// alt text for --html
    #[arg(long, default_value = "")]
    alt: String,
}

#[derive(Subcommand)]
enum Command {
    /// Print the provider URL for one image
    Url {
        #[command(flatten)]
        image: ImageArgs,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print src, sizes and srcset for a responsive <img>
    Sizes {
        #[command(flatten)]
        image: ImageArgs,
        #[command(flatten)]
        responsive: ResponsiveArgs,
        /// Blurred placeholder: N, W,H[,QUALITY[,BLUR]] or a literal URL (default 10x10)
        #[arg(long, value_name = "SPEC", num_args = 0..=1, default_missing_value = "true")]
        placeholder: Option<Placeholder>,
    },
    /// Print the <source> plan of a multi-format <picture>
    Picture {
        #[command(flatten)]
        image: ImageArgs,
        #[command(flatten)]
        responsive: ResponsiveArgs,
        /// Comma-separated source formats, e.g. "avif,webp"
        #[arg(long = "formats")]
        formats: Option<String>,
        /// Format of the fallback <img>
        #[arg(long)]
        legacy_format: Option<String>,
    },
    /// Show resolved providers and the host configuration setup produced
    Providers {
        /// Print the host configuration as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock image.toml with all options documented
    GenConfig,
}

fn parse_modifier(raw: &str) -> Result<(String, ModifierValue), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), ModifierValue::parse_lossy(value)))
        }
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}

impl ImageArgs {
    fn modifiers(&self) -> Modifiers {
        let mut modifiers = Modifiers::new();
        for (key, value) in [
            (WIDTH, &self.width),
            (HEIGHT, &self.height),
            (FORMAT, &self.format),
            (QUALITY, &self.quality),
            (FIT, &self.fit),
            (BACKGROUND, &self.background),
        ] {
            if let Some(value) = value {
                modifiers.set(key, ModifierValue::parse_lossy(value));
            }
        }
        for (key, value) in &self.modifiers {
            modifiers.set(key, value.clone());
        }
        modifiers
    }

    fn request_options(&self) -> RequestOptions {
        RequestOptions {
            provider: self.provider.clone(),
            preset: self.preset.clone(),
            ..Default::default()
        }
    }

    fn sizes_request(&self, responsive: &ResponsiveArgs) -> SizesRequest {
        SizesRequest {
            sizes: responsive.sizes.as_deref().map(Sizes::parse),
            densities: responsive.densities.clone(),
            modifiers: self.modifiers(),
            options: self.request_options(),
        }
    }
}

/// `sizes --json` payload.
#[derive(serde::Serialize)]
struct SizesJson<'a> {
    #[serde(flatten)]
    sizes: &'a ImageSizes,
    #[serde(skip_serializing_if = "Option::is_none")]
    placeholder: Option<&'a str>,
}

fn install(cli: &Cli, host: &mut HostConfig) -> Result<ImageEngine, Box<dyn std::error::Error>> {
    let config = config::load_config(&cli.root)?;
    let mode = if cli.production {
        Mode::Production
    } else {
        Mode::Development
    };
    let mut setup = Setup::from_env(config).mode(mode);
    if let Some(platform) = cli.platform {
        setup = setup.platform(platform);
    }
    Ok(setup.install(host)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .format_timestamp(None)
        .init();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut host = HostConfig::default();
    let engine = install(&cli, &mut host)?;

    match &cli.command {
        Command::Url { image, json } => {
            let resolved =
                engine.get_image(&image.src, &image.modifiers(), &image.request_options())?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&resolved)?);
            } else {
                let provider = image
                    .provider
                    .as_deref()
                    .unwrap_or(engine.default_provider());
                output::print_url_output(&resolved, provider);
            }
        }
        Command::Sizes {
            image,
            responsive,
            placeholder,
        } => {
            let sizes = engine.get_sizes(&image.src, &image.sizes_request(responsive))?;
            let placeholder = placeholder
                .as_ref()
                .map(|p| {
                    engine.placeholder(&image.src, p, &image.modifiers(), &image.request_options())
                })
                .transpose()?;
            if responsive.json {
                let json = SizesJson {
                    sizes: &sizes,
                    placeholder: placeholder.as_deref(),
                };
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else if responsive.html {
                let attrs = ImgAttrs {
                    alt: Some(responsive.alt.as_str()),
                    placeholder: placeholder.as_deref(),
                    ..Default::default()
                };
                println!("{}", render::render_img(&sizes, &attrs).into_string());
            } else {
                output::print_sizes_output(&sizes, placeholder.as_deref());
            }
        }
        Command::Picture {
            image,
            responsive,
            formats,
            legacy_format,
        } => {
            let request = PictureRequest {
                image: image.sizes_request(responsive),
                format: formats.clone().or_else(|| image.format.clone()),
                legacy_format: legacy_format.clone(),
            };
            let sources = engine.picture_sources(&image.src, &request)?;
            if responsive.json {
                println!("{}", serde_json::to_string_pretty(&sources)?);
            } else if responsive.html {
                let attrs = ImgAttrs {
                    alt: Some(responsive.alt.as_str()),
                    ..Default::default()
                };
                println!("{}", render::render_picture(&sources, &attrs).into_string());
            } else {
                output::print_picture_output(&sources);
            }
        }
        Command::Providers { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(&host)?);
            } else {
                output::print_providers_output(&engine, &host);
            }
        }
        Command::GenConfig => {}
    }

    Ok(())
}
