use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::fixture::Platform;

#[derive(Parser)]
#[command(
    name = "invctl",
    about = "Inspect provider inventories collected from a fixture",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Inventory configuration (TOML).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the resource hierarchy
    Tree(TreeArgs),
    /// List resources of one kind
    List(ListArgs),
    /// Show the kinds collected for a platform
    Kinds(KindsArgs),
}

#[derive(Args)]
pub struct TreeArgs {
    /// JSON fixture of provider resources and watch events.
    #[arg(short, long)]
    pub fixture: PathBuf,
    /// Render these kinds in full.
    #[arg(long)]
    pub detail: Vec<String>,
    /// Render every kind in full.
    #[arg(long)]
    pub full: bool,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(short, long)]
    pub fixture: PathBuf,
    #[arg(short, long)]
    pub kind: String,
    /// Only resources whose parent is this id.
    #[arg(long)]
    pub parent: Option<String>,
    /// Field equality filters, `field=value`. Dotted fields are allowed.
    #[arg(long = "where")]
    pub filters: Vec<String>,
    #[arg(long)]
    pub full: bool,
    #[arg(long, default_value = "0")]
    pub offset: usize,
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct KindsArgs {
    pub platform: Platform,
}
