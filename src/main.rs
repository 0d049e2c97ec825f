use chrono::{DateTime, Local, NaiveTime};
use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};
use imagebot::card::{CardLayout, MessageMeta, ReplyCardRenderer};
use imagebot::config::{self, BotConfig};
use imagebot::fetch::HttpSource;
use imagebot::imaging::{ImagePipeline, OutputFormat};
use imagebot::output;
use std::path::{Path, PathBuf};

/// Longest text accepted by the overlay command.
const MAX_OVERLAY_CHARS: usize = 100;

#[derive(Parser)]
#[command(name = "imagebot")]
#[command(about = "Image commands of the chat bot, runnable from a terminal")]
#[command(long_about = "\
Image commands of the chat bot, runnable from a terminal

Every command takes an image URL (http/https) or a local path, fetches it,
transforms it in memory and writes one result file into --out-dir:

  thumbnail  → thumbnail_{w}x{h}.jpg   center-cropped JPEG
  filter     → filtered_{filter}.jpg   grayscale | sepia | vintage | blur | sharpen
  resize     → resized_{w}x{h}.jpg     cover | contain | fill | inside | outside
  text       → text_overlay.jpg        bitmap text at (x, y)
  collage    → collage.jpg             up to cols×rows images on a grid
  convert    → converted.{ext}         jpeg | png | webp
  concern    → concern.png             reply card quoting a message
  info       → printed, nothing written

Run 'imagebot gen-config' to generate a documented imagebot.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./imagebot.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory result files are written to
    #[arg(long, default_value = ".", global = true)]
    out_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a thumbnail of an image
    Thumbnail {
        /// URL of the image to process
        url: String,
        /// Thumbnail width (default: 200)
        #[arg(long, value_parser = clap::value_parser!(u32).range(50..=1000))]
        width: Option<u32>,
        /// Thumbnail height (default: 200)
        #[arg(long, value_parser = clap::value_parser!(u32).range(50..=1000))]
        height: Option<u32>,
    },
    /// Apply a filter to an image
    Filter {
        /// URL of the image to process
        url: String,
        /// Type of filter to apply
        #[arg(long, value_parser = PossibleValuesParser::new(["grayscale", "sepia", "vintage", "blur", "sharpen"]))]
        filter: String,
    },
    /// Resize an image
    Resize {
        /// URL of the image to process
        url: String,
        /// New width
        #[arg(long, value_parser = clap::value_parser!(u32).range(50..=4000))]
        width: u32,
        /// New height
        #[arg(long, value_parser = clap::value_parser!(u32).range(50..=4000))]
        height: u32,
        /// How to fit the image
        #[arg(long, default_value = "cover", value_parser = PossibleValuesParser::new(["cover", "contain", "fill", "inside", "outside"]))]
        fit: String,
    },
    /// Add text overlay to an image
    Text {
        /// URL of the image to process
        url: String,
        /// Text to overlay (max 100 characters)
        #[arg(long, value_parser = parse_overlay_text)]
        text: String,
        /// X position (default: 10)
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=1000))]
        x: Option<u32>,
        /// Y position (default: 10)
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=1000))]
        y: Option<u32>,
    },
    /// Tile several images into a grid
    Collage {
        /// URLs of the images, filled row by row
        #[arg(required = true)]
        urls: Vec<String>,
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=4))]
        cols: u32,
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=4))]
        rows: u32,
    },
    /// Convert image to different format
    Convert {
        /// URL of the image to process
        url: String,
        /// Target format
        #[arg(long, value_parser = PossibleValuesParser::new(["jpeg", "jpg", "png", "webp"]))]
        format: String,
    },
    /// Get information about an image
    Info {
        /// URL of the image to analyze
        url: String,
        /// Print JSON instead of the report
        #[arg(long)]
        json: bool,
    },
    /// Render a reply card quoting a message
    Concern {
        /// Display name of the quoted author
        #[arg(long)]
        name: String,
        /// Avatar image URL of the quoted author
        #[arg(long)]
        avatar: Option<String>,
        /// Quoted message text
        #[arg(long, default_value = "")]
        message: String,
        /// Time the message was sent, HH:MM (default: now)
        #[arg(long, value_parser = parse_time)]
        time: Option<NaiveTime>,
    },
    /// Print a stock imagebot.toml with all options documented
    GenConfig,
}

fn parse_overlay_text(s: &str) -> Result<String, String> {
    let count = s.chars().count();
    if count > MAX_OVERLAY_CHARS {
        return Err(format!(
            "text is {count} characters, at most {MAX_OVERLAY_CHARS} allowed"
        ));
    }
    Ok(s.to_string())
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| format!("expected HH:MM: {e}"))
}

/// Today's local date at `time`, or now.
fn sent_at(time: Option<NaiveTime>) -> DateTime<Local> {
    time.and_then(|t| {
        Local::now()
            .date_naive()
            .and_time(t)
            .and_local_timezone(Local)
            .earliest()
    })
    .unwrap_or_else(Local::now)
}

async fn save(out_dir: &Path, name: &str, result: Option<Vec<u8>>) -> std::io::Result<bool> {
    let Some(bytes) = result else {
        eprintln!("{}", output::FAILURE_MESSAGE);
        return Ok(false);
    };
    tokio::fs::create_dir_all(out_dir).await?;
    let path = out_dir.join(name);
    tokio::fs::write(&path, &bytes).await?;
    output::print_saved(&path, bytes.len());
    Ok(true)
}

async fn load_template(config: &BotConfig) -> Option<Vec<u8>> {
    match tokio::fs::read(&config.card.template).await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::warn!(
                "card template {} unreadable: {e}",
                config.card.template.display()
            );
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let bot_config = config::load_config(cli.config.as_deref())?;
    let source = HttpSource::new(&bot_config.fetch_settings())?;
    let out_dir = cli.out_dir.as_path();

    let succeeded = match cli.command {
        Command::Thumbnail { url, width, height } => {
            let width = width.unwrap_or(bot_config.thumbnail.width);
            let height = height.unwrap_or(bot_config.thumbnail.height);
            let pipeline = ImagePipeline::with_settings(source, bot_config.pipeline_settings());
            let result = pipeline.thumbnail(&url, width, height).await;
            save(out_dir, &format!("thumbnail_{width}x{height}.jpg"), result).await?
        }
        Command::Filter { url, filter } => {
            let pipeline = ImagePipeline::with_settings(source, bot_config.pipeline_settings());
            let result = pipeline.apply_filter(&url, &filter).await;
            save(out_dir, &format!("filtered_{filter}.jpg"), result).await?
        }
        Command::Resize {
            url,
            width,
            height,
            fit,
        } => {
            let pipeline = ImagePipeline::with_settings(source, bot_config.pipeline_settings());
            let result = pipeline.resize(&url, width, height, &fit).await;
            save(out_dir, &format!("resized_{width}x{height}.jpg"), result).await?
        }
        Command::Text { url, text, x, y } => {
            let x = x.unwrap_or(bot_config.text.x);
            let y = y.unwrap_or(bot_config.text.y);
            let pipeline = ImagePipeline::with_settings(source, bot_config.pipeline_settings());
            let result = pipeline.add_text(&url, &text, x.into(), y.into()).await;
            save(out_dir, "text_overlay.jpg", result).await?
        }
        Command::Collage { urls, cols, rows } => {
            let pipeline = ImagePipeline::with_settings(source, bot_config.pipeline_settings());
            let result = pipeline.collage(urls.as_slice(), cols, rows).await;
            save(out_dir, "collage.jpg", result).await?
        }
        Command::Convert { url, format } => {
            let extension = format.parse::<OutputFormat>()?.extension();
            let pipeline = ImagePipeline::with_settings(source, bot_config.pipeline_settings());
            let result = pipeline.convert(&url, &format).await;
            save(out_dir, &format!("converted.{extension}"), result).await?
        }
        Command::Info { url, json } => {
            let pipeline = ImagePipeline::with_settings(source, bot_config.pipeline_settings());
            match pipeline.image_info(&url).await {
                Some(info) if json => {
                    println!("{}", output::format_info_json(&info)?);
                    true
                }
                Some(info) => {
                    output::print_info(&info, &url);
                    true
                }
                None => {
                    eprintln!("Failed to get image information.");
                    false
                }
            }
        }
        Command::Concern {
            name,
            avatar,
            message,
            time,
        } => {
            let template = load_template(&bot_config).await;
            let renderer =
                ReplyCardRenderer::new(source, CardLayout::default()).with_template(template);
            let meta = MessageMeta {
                display_name: name,
                avatar_url: avatar,
                body: message,
                sent_at: sent_at(time),
            };
            let result = renderer.render(&meta).await;
            save(out_dir, "concern.png", result).await?
        }
        Command::GenConfig => true,
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
