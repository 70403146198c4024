//! Command-line arguments

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "duel")]
#[command(author, version, about = "Duel - a mock interview between two LLM agents, scored by a third")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML config file with [simulation] and [provider] tables
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print the results table and outcome
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation on a topic
    Run(RunArgs),
    /// Print the prompts each agent receives, without calling a model
    Prompts {
        /// Interview topic
        #[arg(default_value = "Data Science")]
        topic: String,
    },
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Interview topic
    #[arg(default_value = "Data Science")]
    pub topic: String,

    /// Maximum number of rounds
    #[arg(long)]
    pub max_rounds: Option<u32>,

    /// Judge score (1-10) that ends the interview
    #[arg(long)]
    pub pass_threshold: Option<u8>,

    /// First round whose answer learns from the previous feedback
    #[arg(long)]
    pub coaching_starts_at: Option<u32>,

    /// Model id on the inference endpoint
    #[arg(short, long)]
    pub model: Option<String>,

    /// OpenAI-compatible base URL (defaults to the Hugging Face router)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Target a local server; no API token required
    #[arg(long)]
    pub local: bool,

    /// Use single blocking calls instead of streaming
    #[arg(long)]
    pub no_stream: bool,

    /// Completion token limit per call
    #[arg(long)]
    pub max_tokens: Option<usize>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Write the full report as JSON
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Write the chat transcript as Markdown
    #[arg(long, value_name = "PATH")]
    pub transcript: Option<PathBuf>,
}
