//! # Duel CLI
//!
//! Runs a mock interview: an interviewer and an interviewee agent talk
//! about a topic while a judge scores each answer, until one scores high
//! enough or the rounds run out.
//!
//! Usage:
//!   duel run [TOPIC]
//!   duel run "Rust ownership" --max-rounds 4 --json report.json
//!   duel run "SQL" --local --base-url http://localhost:11434/v1 -m llama3
//!   duel prompts [TOPIC]
//!
//! The Hugging Face token is read from HF_TOKEN or HUGGINGFACEHUB_API_TOKEN.

mod cli;
mod config;
mod display;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command, RunArgs};
use config::FileConfig;
use display::ConsolePrinter;
use duel_llm::{InferenceProvider, LlmProvider};
use duel_sim::{answer_prompt, judge_prompt, question_prompt, Simulation};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the transcript; logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(args: RunArgs, file: FileConfig, quiet: bool) -> anyhow::Result<()> {
    let sim_config = config::simulation_config(&file, &args);
    let provider_config = config::provider_config(&file, &args, |name| std::env::var(name).ok())?;
    let provider = InferenceProvider::new(provider_config)?;

    info!(provider = provider.name(), model = provider.default_model(), "provider ready");
    if !quiet {
        println!("Duel - {} interviews itself on \"{}\"\n", provider.default_model(), args.topic);
    }

    let mut printer = ConsolePrinter::new(std::io::stdout(), quiet);
    let report = Simulation::new(&provider, sim_config)
        .run_with(&args.topic, &mut printer)
        .await?;

    printer.print_report(&report).context("failed to print results")?;

    if let Some(path) = &args.json {
        report.write_json(path)?;
        if !quiet {
            println!("Report written to {}", path.display());
        }
    }

    if let Some(path) = &args.transcript {
        std::fs::write(path, printer.transcript().to_markdown())
            .with_context(|| format!("failed to write transcript to {}", path.display()))?;
        if !quiet {
            println!("Transcript written to {}", path.display());
        }
    }

    Ok(())
}

fn show_prompts(topic: &str) {
    println!("=== INTERVIEWER (first round) ===\n{}\n", question_prompt(topic, &[]));
    println!(
        "=== INTERVIEWER (later rounds) ===\n{}\n",
        question_prompt(topic, &["<earlier question>"])
    );
    println!("=== INTERVIEWEE (early rounds) ===\n{}\n", answer_prompt("<question>", None));
    println!(
        "=== INTERVIEWEE (coached rounds) ===\n{}\n",
        answer_prompt("<question>", Some("<previous feedback>"))
    );
    println!("=== JUDGE ===\n{}", judge_prompt("<question>", "<answer>"));
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let result = match cli.command {
        Command::Prompts { topic } => {
            show_prompts(&topic);
            Ok(())
        }
        Command::Run(args) => {
            let file = match &cli.config {
                Some(path) => FileConfig::load(path),
                None => Ok(FileConfig::default()),
            };
            match file {
                Ok(file) => run(args, file, cli.quiet).await,
                Err(e) => Err(e.into()),
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
