use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lfst_types::Operation;

#[derive(Parser)]
#[command(
    name = "lfs-transfer",
    about = "Drive the LFS transfer backend for one repository",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

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
    /// Print the advertised protocol capabilities
    Capabilities,
    /// Report which objects are present for an operation
    Batch(BatchArgs),
    /// Write an object to stdout or a file
    Download(DownloadArgs),
    /// Send an object from stdin or a file
    Upload(UploadArgs),
    /// Confirm an uploaded object is stored
    Verify(VerifyArgs),
}

/// Options shared by every command that talks to a backend.
#[derive(Args)]
pub struct SessionArgs {
    /// Backend configuration file (TOML)
    #[arg(short, long)]
    pub config: PathBuf,
    /// Repository, as `owner/name.git`
    #[arg(short, long)]
    pub repo: String,
    /// Authorization header value for the internal API
    #[arg(long, default_value = "")]
    pub token: String,
    /// Extra command argument, as `key=value`
    #[arg(long = "arg", value_name = "KEY=VALUE")]
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct BatchArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    #[arg(value_parser = parse_operation)]
    pub operation: Operation,
    /// Objects, as `oid:size`
    #[arg(required = true)]
    pub objects: Vec<String>,
    #[arg(long = "ref")]
    pub reference: Option<String>,
    #[arg(long)]
    pub transfer: Option<String>,
}

#[derive(Args)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    pub oid: String,
    /// Object handle returned by batch
    #[arg(long)]
    pub id: Option<String>,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct UploadArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    pub oid: String,
    pub size: u64,
    #[arg(long)]
    pub id: Option<String>,
    /// Read the object from this file instead of stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

#[derive(Args)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub session: SessionArgs,
    pub oid: String,
    pub size: u64,
    #[arg(long)]
    pub id: Option<String>,
}

fn parse_operation(s: &str) -> Result<Operation, String> {
    s.parse().map_err(|e| format!("{e}"))
}
