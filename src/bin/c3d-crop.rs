//! c3d-crop - Crop and inspect C3D motion-capture files
//!
//! # Commands
//!
//! - `c3d-crop crop <PATH> <START> <END>` - Keep the frames between two times (seconds)
//! - `c3d-crop inspect <PATH>` - Print rates, labels and parameter groups
//!
//! The cropped file is written next to the input as `<name>_cropped.c3d`
//! unless `--output` is given. Set `RUST_LOG=debug` for section-level logs.

use anyhow::{Context, Result, bail};
use c3d_crop::{Document, crop_file, cropped_path};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// c3d-crop - Crop and inspect C3D motion-capture files
#[derive(Parser)]
#[command(name = "c3d-crop")]
#[command(about = "Crop and inspect C3D motion-capture files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Keep the frames covering a time window
    Crop(CropArgs),

    /// Describe a file without modifying it
    Inspect(InspectArgs),
}

#[derive(Args)]
struct CropArgs {
    /// Input C3D file
    path: PathBuf,

    /// Start of the window, in seconds
    start: f64,

    /// End of the window, in seconds
    end: f64,

    /// Output file (defaults to <name>_cropped.<ext> next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct InspectArgs {
    /// Input C3D file
    path: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Crop(args) => run_crop(args),
        Commands::Inspect(args) => run_inspect(args),
    }
}

fn run_crop(args: CropArgs) -> Result<()> {
    if args.end < args.start {
        bail!("end time {} is before start time {}", args.end, args.start);
    }
    let output = args.output.unwrap_or_else(|| cropped_path(&args.path));
    crop_file(&args.path, &output, args.start, args.end)
        .with_context(|| format!("failed to crop {}", args.path.display()))?;
    println!("{}", output.display());
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let document = Document::from_file(&args.path)
        .with_context(|| format!("failed to read {}", args.path.display()))?;
    let summary = document.summary();
    if args.json {
        println!("{}", summary.to_json()?);
    } else {
        print!("{summary}");
    }
    Ok(())
}
