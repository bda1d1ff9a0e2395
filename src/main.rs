//! prompt-optimizer CLI - Compress LLM prompts to cut token usage and cost

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use prompt_optimizer::{
    config::Config,
    metrics::{EmbeddingError, SimilarityScorer},
    optimization::{OptimizationResult, StrategyName},
    orchestrator::{Orchestrator, OrchestratorConfig},
    providers::ProviderRegistry,
    tokenizer::CounterKind,
};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "prompt-optimizer")]
#[command(about = "Optimize LLM prompts to reduce token usage and cost")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (logs go to stderr)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,
}

/// Options shared by every command that runs the optimizer
#[derive(clap::Args)]
struct OptimizerArgs {
    /// Prompt to optimize; read from --file or stdin when omitted
    prompt: Option<String>,

    /// Read the prompt from a file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Target model for token counting and pricing
    #[arg(short, long)]
    model: Option<String>,

    /// Keywords no analyzer may touch (repeatable)
    #[arg(short, long)]
    preserve: Vec<String>,

    /// Minimum similarity before falling back to the conservative strategy
    #[arg(long)]
    threshold: Option<f64>,

    /// Force a token counter (openai, anthropic, gemini, generic)
    #[arg(long)]
    counter: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize a prompt and print the result
    Optimize {
        #[command(flatten)]
        args: OptimizerArgs,

        /// Strategy: conservative, moderate or aggressive
        #[arg(short, long, value_parser = ["conservative", "moderate", "aggressive"])]
        strategy: Option<String>,

        /// System prompt, optimized together with the prompt
        #[arg(long, conflicts_with = "system_file")]
        system: Option<String>,

        /// Read the system prompt from a file
        #[arg(long)]
        system_file: Option<PathBuf>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,

        /// Show the original text before the optimized one
        #[arg(long)]
        show_diff: bool,

        /// Show detailed optimization metrics
        #[arg(short, long)]
        verbose: bool,
    },

    /// Compare the built-in strategies on one prompt
    Benchmark {
        #[command(flatten)]
        args: OptimizerArgs,
    },

    /// Show provider, token counter and pricing for a model
    Model {
        /// Model name, e.g. gpt-4o or claude-sonnet-4
        name: String,
    },

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Initialize configuration file with defaults
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Optimize {
            args,
            strategy,
            system,
            system_file,
            json,
            show_diff,
            verbose,
        } => {
            let system = match (system, system_file) {
                (Some(text), _) => Some(text),
                (None, Some(path)) => Some(read_file(&path).await?),
                (None, None) => None,
            };
            let output = OutputOptions {
                json,
                show_diff,
                verbose,
            };
            run_optimize(args, strategy, system, output).await?;
        }
        Commands::Benchmark { args } => {
            run_benchmark(args).await?;
        }
        Commands::Model { name } => {
            show_model(&name);
        }
        Commands::Config(cmd) => {
            run_config_command(cmd)?;
        }
    }

    Ok(())
}

struct OutputOptions {
    json: bool,
    show_diff: bool,
    verbose: bool,
}

async fn read_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Positional prompt, else `--file`, else piped stdin.
async fn resolve_prompt(prompt: Option<String>, file: Option<PathBuf>) -> Result<String> {
    let prompt = match (prompt, file) {
        (Some(prompt), _) => prompt,
        (None, Some(path)) => read_file(&path).await?,
        (None, None) => {
            if std::io::stdin().is_terminal() {
                bail!("No prompt provided. Pass a prompt or pipe from stdin.");
            }
            let mut buffer = String::new();
            tokio::io::stdin().read_to_string(&mut buffer).await?;
            buffer
        }
    };

    let prompt = prompt.trim();
    if prompt.is_empty() {
        bail!("Empty prompt provided.");
    }
    Ok(prompt.to_string())
}

/// File/env config with command-line overrides applied on top
fn orchestrator_config(config: &Config, args: &OptimizerArgs) -> Result<OrchestratorConfig> {
    let mut orchestrator = config.to_orchestrator_config();

    if let Some(model) = &args.model {
        orchestrator.model = model.clone();
    }
    if let Some(threshold) = args.threshold {
        orchestrator.similarity_threshold = threshold;
    }
    if let Some(counter) = &args.counter {
        orchestrator.counter = Some(counter.parse::<CounterKind>()?);
    }
    orchestrator
        .preserve_keywords
        .extend(args.preserve.iter().cloned());

    Ok(orchestrator)
}

fn similarity_scorer(use_embeddings: bool) -> SimilarityScorer {
    if use_embeddings {
        SimilarityScorer::with_embeddings(|| {
            Err(EmbeddingError::Unavailable(
                "this build has no embedding model".to_string(),
            ))
        })
    } else {
        SimilarityScorer::new()
    }
}

async fn run_optimize(
    args: OptimizerArgs,
    strategy: Option<String>,
    system: Option<String>,
    output: OutputOptions,
) -> Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let mut orchestrator_config = orchestrator_config(&config, &args)?;
    if let Some(strategy) = strategy {
        orchestrator_config.strategy = strategy.parse::<StrategyName>()?;
    }

    let prompt = resolve_prompt(args.prompt, args.file).await?;

    info!(
        "Optimizing {} chars with {} for {}",
        prompt.len(),
        orchestrator_config.strategy,
        orchestrator_config.model
    );

    let model = orchestrator_config.model.clone();
    let scorer = similarity_scorer(config.similarity.use_embeddings);
    let mut orchestrator = Orchestrator::new(orchestrator_config)?.with_similarity(scorer);
    let result = orchestrator.optimize(&prompt, system.as_deref(), &[]);

    if output.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if output.show_diff {
        println!("=== ORIGINAL ===");
        println!("{}", result.original_text);
        println!();
        println!("=== OPTIMIZED ===");
    }

    println!("{}", result.optimized_text);

    if output.verbose {
        print_metrics(&model, orchestrator.counter_name(), &result);
    }

    Ok(())
}

fn print_metrics(model: &str, counter: &str, result: &OptimizationResult) {
    println!();
    println!("--- Metrics ---");
    println!("Model:            {}", model);
    println!("Counter:          {}", counter);
    println!("Strategy:         {}", result.strategy_used);
    println!("Original tokens:  {}", result.original_tokens);
    println!("Optimized tokens: {}", result.optimized_tokens);
    println!("Tokens saved:     {}", result.tokens_saved());
    println!("Savings:          {:.1}%", result.savings_percent);
    println!("Cost savings:     ${:.6}", result.estimated_cost_savings);
    println!("Similarity:       {:.3}", result.similarity_score);
}

async fn run_benchmark(args: OptimizerArgs) -> Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let base = orchestrator_config(&config, &args)?;
    let prompt = resolve_prompt(args.prompt, args.file).await?;

    info!("Running benchmark on {} chars", prompt.len());

    // One orchestrator per worker; they share nothing.
    let mut handles = Vec::new();
    for strategy in StrategyName::BUILT_IN {
        let worker_config = OrchestratorConfig {
            strategy,
            cache_enabled: false,
            ..base.clone()
        };
        let prompt = prompt.clone();
        let use_embeddings = config.similarity.use_embeddings;
        handles.push(tokio::task::spawn_blocking(move || {
            benchmark_strategy(worker_config, &prompt, use_embeddings)
        }));
    }

    println!("=== Benchmark Results ({}) ===\n", base.model);
    println!(
        "{:<28} {:>10} {:>10} {:>9} {:>11} {:>10}",
        "Strategy", "Original", "Optimized", "Saved", "Similarity", "Time"
    );
    println!("{}", "-".repeat(83));

    for handle in handles {
        let (result, elapsed) = handle.await??;
        println!(
            "{:<28} {:>10} {:>10} {:>8.1}% {:>11.3} {:>8.2}ms",
            result.strategy_used,
            result.original_tokens,
            result.optimized_tokens,
            result.savings_percent,
            result.similarity_score,
            elapsed.as_secs_f64() * 1000.0
        );
    }

    Ok(())
}

/// Runs one strategy the way `optimize` would, scored with the configured similarity.
fn benchmark_strategy(
    config: OrchestratorConfig,
    prompt: &str,
    use_embeddings: bool,
) -> Result<(OptimizationResult, Duration)> {
    let mut orchestrator =
        Orchestrator::new(config)?.with_similarity(similarity_scorer(use_embeddings));
    let start = Instant::now();
    let result = orchestrator.optimize(prompt, None, &[]);
    Ok((result, start.elapsed()))
}

fn show_model(name: &str) {
    let registry = ProviderRegistry::new();
    let info = registry.lookup(name);
    let counter = registry.counter_for(name);

    println!("Model:            {}", name);
    println!("Provider:         {}", info.provider);
    println!("Counter:          {} (using {})", info.counter, counter.name());
    println!("Input per 1K:     ${}", info.cost_per_1k_input);
    println!("Output per 1K:    ${}", info.cost_per_1k_output);
}

fn run_config_command(cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Init { force } => {
            config_init(force)?;
        }
        ConfigCommands::Show => {
            config_show()?;
        }
        ConfigCommands::Path => {
            println!("{}", Config::default_path().display());
        }
    }
    Ok(())
}

fn config_init(force: bool) -> Result<()> {
    let path = Config::default_path();

    if path.exists() && !force {
        println!("Configuration file already exists at: {}", path.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    Config::default().save()?;

    println!("Configuration file created at: {}", path.display());
    println!();
    println!("Environment overrides:");
    println!("  PROMPT_OPTIMIZER_MODEL, PROMPT_OPTIMIZER_STRATEGY, PROMPT_OPTIMIZER_THRESHOLD");

    Ok(())
}

fn config_show() -> Result<()> {
    let config = Config::load()?;
    println!("{}", toml::to_string_pretty(&config)?);

    println!("--- Environment Variables ---");
    for var in [
        "PROMPT_OPTIMIZER_MODEL",
        "PROMPT_OPTIMIZER_STRATEGY",
        "PROMPT_OPTIMIZER_THRESHOLD",
    ] {
        println!(
            "{}: {}",
            var,
            std::env::var(var).unwrap_or_else(|_| "not set".to_string())
        );
    }

    Ok(())
}
