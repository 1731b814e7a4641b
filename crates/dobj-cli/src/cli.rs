use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "dobj",
    about = "dobj: hierarchical data objects over a flat blob store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Service configuration file (TOML).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

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

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a new object
    Create(WriteArgs),
    /// Print an object's content
    Read(ReadArgs),
    /// Replace an existing object's content
    Update(WriteArgs),
    /// Delete an object, or a collection or container with --recursive
    Delete(DeleteArgs),
    /// Issue an expiring read link for an object
    Publish(PublishArgs),
    /// Check whether anything exists at a URI
    Exists(UriArgs),
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct UriArgs {
    pub uri: String,
}

#[derive(Debug, Args)]
pub struct WriteArgs {
    pub uri: String,
    #[command(flatten)]
    pub input: InputArgs,
}

/// Where the object's content comes from.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct InputArgs {
    /// Read content from a local file
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Use the given text as content
    #[arg(long)]
    pub content: Option<String>,
    /// Fetch content from a URL
    #[arg(long)]
    pub source: Option<String>,
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    pub uri: String,
    /// Write the content to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub uri: String,
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Debug, Args)]
pub struct PublishArgs {
    pub uri: String,
    /// Link lifetime in seconds
    #[arg(long)]
    pub ttl: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Override the configured bind address
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}
