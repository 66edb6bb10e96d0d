//! CLI binary for logpolish: rewrite collected log messages with an LLM provider.

use anyhow::{Context, Result};
use clap::Parser;
use logpolish_core::{Credentials, LogTable, PolishConfig, ProviderKind};
use logpolish_improve::{BatchConfig, LogImprover, create_provider, run_batch};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Parser)]
#[command(
    name = "logpolish",
    version,
    about = "Improve log messages in a collected CSV using an LLM provider"
)]
struct Cli {
    /// Input CSV produced by the log collector
    input: PathBuf,

    /// Where to write the updated CSV
    output: PathBuf,

    /// Provider: claude, gemini, copilot
    #[arg(long, default_value = "claude")]
    provider: String,

    /// Leave rows that already have a NewMessage untouched
    #[arg(long)]
    skip_existing: bool,

    /// Override the selected provider's model
    #[arg(long)]
    model: Option<String>,

    /// Config file (defaults to .logpolish/config.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,
}

fn load_config(cli: &Cli) -> Result<PolishConfig> {
    let mut config = match &cli.config {
        Some(path) => PolishConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => {
            let root = std::env::current_dir().context("failed to get current directory")?;
            PolishConfig::load(&root).context("failed to load .logpolish/config.toml")?
        }
    };

    if let Some(model) = &cli.model
        && let Ok(kind) = cli.provider.parse::<ProviderKind>()
    {
        config.set_model(kind, model.clone());
    }

    Ok(config)
}

/// Install the Ctrl-C handler. The first press asks the batch to stop after
/// the current row; a second press exits immediately.
fn install_interrupt_handler() -> Result<Arc<AtomicBool>> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
    })
    .context("failed to install Ctrl-C handler")?;
    Ok(interrupted)
}

fn print_next_steps(output: &Path) {
    println!("\nNext steps:");
    println!("  1. Review the improved messages in {}", output.display());
    println!("  2. Preview the changes:");
    println!(
        "     ./logrefactor transform -input {} -path ./your-project -dry-run",
        output.display()
    );
    println!("  3. Apply the changes:");
    println!(
        "     ./logrefactor transform -input {} -path ./your-project",
        output.display()
    );
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let credentials = Credentials::from_env();
    tracing::debug!(?credentials, "credentials loaded");

    println!("Initializing {} provider...", cli.provider);
    let provider = create_provider(&cli.provider, &credentials, &config)?;
    tracing::info!(
        provider = provider.kind().as_str(),
        model = provider.model_name(),
        "provider ready"
    );

    println!("Reading {}...", cli.input.display());
    let table = LogTable::load(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    println!("Found {} log entries\n", table.len());

    let interrupted = install_interrupt_handler()?;
    let batch_config = BatchConfig {
        skip_existing: cli.skip_existing,
        show_progress: !cli.no_progress,
    };

    let mut improver = LogImprover::new(provider);
    let outcome = run_batch(&table, &mut improver, &batch_config, &interrupted);

    println!("\n{}", outcome.summary);
    println!("  Usage: {}", improver.usage());

    println!("\nSaving to {}...", cli.output.display());
    outcome
        .table
        .save(&cli.output)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    println!("✓ Successfully saved to {}", cli.output.display());

    print_next_steps(&cli.output);
    Ok(())
}
