use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "stash",
    about = "stash: inspect and edit persistent storage areas",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (TOML). Defaults to ./stash.toml when present.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage file to use instead of the configured one.
    #[arg(short, long, global = true)]
    pub store: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the value stored under a key
    Get(GetArgs),
    /// Store a JSON value under a key
    Set(SetArgs),
    /// Add to a numeric value
    Incr(IncrArgs),
    /// List stored keys and values
    List,
    /// Remove a key
    Remove(RemoveArgs),
    /// Remove every key
    Clear,
    /// Show item count, bytes used and quota
    Usage,
}

#[derive(Args)]
pub struct GetArgs {
    pub key: String,
    /// JSON value to show when nothing usable is stored
    #[arg(long)]
    pub default: Option<String>,
}

#[derive(Args)]
pub struct SetArgs {
    pub key: String,
    /// JSON text, e.g. '"dark"', '42' or '{"a":1}'
    pub value: String,
}

#[derive(Args)]
pub struct IncrArgs {
    pub key: String,
    #[arg(long, default_value = "1", allow_hyphen_values = true)]
    pub by: i64,
}

#[derive(Args)]
pub struct RemoveArgs {
    pub key: String,
}
