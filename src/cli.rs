use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "entity-locator",
    version,
    about = "Locate extracted entities in a document's text layout and build overlays"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Match an entity list against a layout and write the batch result.
    Match(MatchArgs),
    /// Turn a batch result into render-ready regions.
    Overlay(OverlayArgs),
    /// Summarize a layout file.
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct MatchArgs {
    #[arg(long)]
    pub entities: PathBuf,

    #[arg(long)]
    pub layout: PathBuf,

    #[arg(long)]
    pub out: PathBuf,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub fuzzy_threshold: Option<f64>,

    #[arg(long)]
    pub proximity_threshold: Option<f64>,

    #[arg(long, default_value_t = false)]
    pub parallel: bool,

    #[command(flatten)]
    pub dimensions: DimensionArgs,

    /// Also write an overlay for the matched records; requires --width and --height.
    #[arg(long)]
    pub overlay_out: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct OverlayArgs {
    #[arg(long)]
    pub report: PathBuf,

    #[arg(long)]
    pub out: PathBuf,

    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub dimensions: DimensionArgs,

    #[arg(long)]
    pub confidence_threshold: Option<f64>,

    #[arg(long)]
    pub overlap_threshold: Option<f64>,

    #[arg(long, default_value_t = false)]
    pub merge_overlaps: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DimensionArgs {
    /// Rendered page width in pixels.
    #[arg(long)]
    pub width: Option<f64>,

    /// Rendered page height in pixels.
    #[arg(long)]
    pub height: Option<f64>,

    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[arg(long)]
    pub layout: PathBuf,

    /// Also report where this text occurs.
    #[arg(long)]
    pub search: Option<String>,
}
