use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "twibbon", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a photo under a campaign frame and write the export.
    Export(ExportArgs),
    /// List campaigns in a store, or print one as JSON.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Campaign store (JSON array of campaign records).
    #[arg(long)]
    campaigns: PathBuf,

    /// Campaign slug.
    #[arg(long)]
    slug: String,

    /// Photo to place under the frame.
    #[arg(long)]
    photo: PathBuf,

    /// Declared MIME type of the photo. Guessed from the extension when omitted.
    #[arg(long)]
    mime: Option<String>,

    /// On-screen container width in px. Defaults to the frame's pixel width.
    #[arg(long)]
    width: Option<f64>,

    /// Total photo scale, clamped to the configured bounds. Keeps the cover-fit size when omitted.
    #[arg(long)]
    scale: Option<f64>,

    /// Rotation in degrees.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    rotate: f64,

    /// Horizontal offset as a fraction of the viewport width.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    offset_x: f64,

    /// Vertical offset as a fraction of the viewport height.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    offset_y: f64,

    /// Export resolution multiplier. Defaults to the configured value.
    #[arg(long)]
    multiplier: Option<u32>,

    #[arg(long, value_enum)]
    format: Option<FormatChoice>,

    /// Lossy quality (1..=100).
    #[arg(long)]
    quality: Option<u8>,

    /// Output file or directory. Defaults to `<slug>-twibbon.<ext>` in the current directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Editor config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Campaign store (JSON array of campaign records).
    #[arg(long)]
    campaigns: PathBuf,

    /// Print this campaign only.
    #[arg(long)]
    slug: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Png,
    Jpeg,
    Webp,
}

impl From<FormatChoice> for twibbon::ExportFormat {
    fn from(c: FormatChoice) -> Self {
        match c {
            FormatChoice::Png => Self::Png,
            FormatChoice::Jpeg => Self::Jpeg,
            FormatChoice::Webp => Self::WebP,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Export(args) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("build tokio runtime")?;
            runtime.block_on(cmd_export(args))
        }
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<twibbon::EditorConfig> {
    let cfg = match path {
        Some(p) => twibbon::EditorConfig::from_path(p)?,
        None => twibbon::EditorConfig::default(),
    };
    let cfg = cfg.with_env_overrides();
    cfg.validate()?;
    Ok(cfg)
}

fn guess_mime(path: &Path) -> &'static str {
    image::ImageFormat::from_path(path)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream")
}

async fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let store = twibbon::JsonCampaignStore::open(&args.campaigns)?;
    let campaign = twibbon::CampaignSource::fetch_campaign(&store, &args.slug)?;
    let width = args.width.unwrap_or(f64::from(campaign.frame_width));

    let loader = twibbon::DefaultFrameLoader::new()?.with_base_dir(store.root());
    let mut session =
        twibbon::EditorSession::open(&store, &loader, &args.slug, width, config.clone()).await?;

    let bytes = std::fs::read(&args.photo)
        .with_context(|| format!("read photo '{}'", args.photo.display()))?;
    let mime = args
        .mime
        .clone()
        .unwrap_or_else(|| guess_mime(&args.photo).to_owned());
    session.upload(bytes, &mime).await?;

    if let Some(scale) = args.scale {
        session.set_scale(scale);
    }
    session.set_rotation(args.rotate);
    session.set_offset(args.offset_x, args.offset_y);

    let mut request = config.export;
    if let Some(m) = args.multiplier {
        request.multiplier = m;
    }
    if let Some(f) = args.format {
        request.format = f.into();
    }
    if let Some(q) = args.quality {
        request.quality = q;
    }

    let output = session.export(request).await?;
    session.close();

    let out_path = match &args.out {
        Some(p) if p.is_dir() => p.join(&output.filename),
        Some(p) => p.clone(),
        None => PathBuf::from(&output.filename),
    };
    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&out_path, &output.bytes)
        .with_context(|| format!("write export '{}'", out_path.display()))?;

    eprintln!(
        "wrote {} ({}x{})",
        out_path.display(),
        output.width,
        output.height
    );
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let store = twibbon::JsonCampaignStore::open(&args.campaigns)?;
    match &args.slug {
        Some(slug) => {
            let campaign = twibbon::CampaignSource::fetch_campaign(&store, slug)?;
            println!("{}", serde_json::to_string_pretty(&campaign)?);
        }
        None => {
            for slug in store.campaigns().slugs() {
                let c = twibbon::CampaignSource::fetch_campaign(&store, slug)?;
                println!(
                    "{slug}\t{}x{}\t{}",
                    c.frame_width, c.frame_height, c.campaign_name
                );
            }
        }
    }
    Ok(())
}
