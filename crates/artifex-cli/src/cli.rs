use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "artifex",
    about = "Artifex: deduplicating image store with in-place annotation",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Image storage directory (overrides the config file)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Store local image files, skipping content already stored
    Ingest(IngestArgs),
    /// List stored images
    List(ListArgs),
    /// Draw a text annotation onto a stored image
    Annotate(AnnotateArgs),
    /// Draw an image layer onto a stored image
    Draw(DrawArgs),
    /// Print the effective configuration
    ShowConfig(ShowConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct IngestArgs {
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args)]
pub struct ListArgs {}

#[derive(Args)]
pub struct AnnotateArgs {
    pub id: String,
    pub text: String,
    /// Left edge of the text box
    #[arg(long, allow_negative_numbers = true)]
    pub x: i64,
    /// Bottom edge of the text box
    #[arg(long, allow_negative_numbers = true)]
    pub y: i64,
}

#[derive(Args)]
pub struct DrawArgs {
    pub id: String,
    /// Image file to draw on top
    pub overlay: PathBuf,
    #[arg(long, allow_negative_numbers = true)]
    pub x: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    pub y: Option<i64>,
}

#[derive(Args)]
pub struct ShowConfigArgs {}
