use clap::{Args, Parser, Subcommand};

use crate::config::FailurePolicy;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Crawl every index page and accumulate decisions into the store.
    Run(RunArgs),
    /// Print the document links found on the index pages.
    Links(LinksArgs),
    /// Extract a single document page and print it as JSON.
    Extract(ExtractArgs),
    /// Print one stored decision by process number.
    Show(ShowArgs),
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// YAML file overriding the built-in crawl configuration.
    #[arg(long)]
    pub config: Option<String>,

    /// Directory for cached HTTP responses (created if missing).
    #[arg(long, default_value = "./cache")]
    pub cache_dir: String,

    /// Ignore cached responses and overwrite them.
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub fetch: FetchArgs,

    /// JSON store of extracted decisions.
    #[arg(long, default_value = "./docs.json")]
    pub store: String,

    /// What to do when a document yields no text.
    #[arg(long, value_enum, default_value_t = FailurePolicy::Halt)]
    pub on_failure: FailurePolicy,

    /// Hide the progress bar.
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Debug, Args)]
pub struct LinksArgs {
    #[command(flatten)]
    pub fetch: FetchArgs,

    /// Only this index page instead of the configured list.
    #[arg(long)]
    pub index: Option<String>,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub fetch: FetchArgs,

    /// Document URL (as printed by `links`).
    #[arg(long)]
    pub url: String,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// JSON store of extracted decisions.
    #[arg(long, default_value = "./docs.json")]
    pub store: String,

    /// Process number (store key).
    pub process: String,
}
