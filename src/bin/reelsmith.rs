use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "reelsmith", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a request JSON to an MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input render request JSON.
    #[arg(long = "request")]
    request_path: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Override the target frame width.
    #[arg(long)]
    width: Option<u32>,

    /// Override the target frame height.
    #[arg(long)]
    height: Option<u32>,

    /// Override the minimum video duration in seconds.
    #[arg(long)]
    min_duration: Option<f64>,

    /// Override the maximum video duration in seconds.
    #[arg(long)]
    max_duration: Option<f64>,

    /// Override the encoder thread count.
    #[arg(long)]
    threads: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
    }
}

fn read_request_json(path: &Path) -> anyhow::Result<reelsmith::RenderRequest> {
    let file = File::open(path).with_context(|| format!("open request '{}'", path.display()))?;
    let reader = BufReader::new(file);
    let request: reelsmith::RenderRequest =
        serde_json::from_reader(reader).with_context(|| "parse request JSON")?;
    Ok(request)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let request = read_request_json(&args.request_path)?;

    let mut cfg = reelsmith::RenderConfig::default();
    if let Some(width) = args.width {
        cfg.target_width = width;
    }
    if let Some(height) = args.height {
        cfg.target_height = height;
    }
    if let Some(min) = args.min_duration {
        cfg.min_duration_sec = min;
    }
    if let Some(max) = args.max_duration {
        cfg.max_duration_sec = max;
    }
    if let Some(threads) = args.threads {
        cfg.encoder_threads = threads;
    }

    let outcome = reelsmith::render(&request, &args.out, &cfg)?;
    println!(
        "rendered {} ({:.2}s)",
        outcome.out_path.display(),
        outcome.duration_sec
    );
    Ok(())
}
