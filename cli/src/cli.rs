use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pastebox", about = "Paste, image and album store", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to config.toml. Relative data directories resolve against its parent.
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a text paste read from a file or stdin
    PutText(PutTextArgs),
    /// Store one image, or an album of several
    PutImages(PutImagesArgs),
    /// Print a stored item by identifier
    Get(GetArgs),
    /// Run a single reaper sweep
    Sweep,
    /// Run the reaper loop until interrupted
    Reap(ReapArgs),
    /// Write the effective configuration to the config path
    InitConfig,
}

#[derive(Args)]
pub struct PutTextArgs {
    /// File to read; stdin when omitted
    pub file: Option<PathBuf>,

    /// Highlighting hint; `plain` when omitted
    #[arg(long)]
    pub syntax: Option<String>,

    /// Requested lifetime in seconds, clamped to 1..=28 days. Defaults to 1 day.
    #[arg(long, allow_negative_numbers = true)]
    pub expire: Option<i64>,

    /// Address recorded as the submitter
    #[arg(long)]
    pub source: Option<String>,
}

#[derive(Args)]
pub struct PutImagesArgs {
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Requested lifetime in seconds, clamped to 1..=28 days. Defaults to 1 day.
    #[arg(long, allow_negative_numbers = true)]
    pub expire: Option<i64>,

    #[arg(long)]
    pub source: Option<String>,

    /// Store a single file as a one-image album
    #[arg(long)]
    pub album: bool,
}

#[derive(Args)]
pub struct GetArgs {
    pub id: String,

    /// Write image bytes here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ReapArgs {
    /// Override the configured sweep interval
    #[arg(long)]
    pub interval_secs: Option<u64>,
}
