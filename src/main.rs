//! @ai:module:intent CLI for the code-repair evaluation harness
//! @ai:module:layer presentation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quix_eval::{
    config::{EvalConfig, DEFAULT_CONFIG_FILE},
    corpus::{DatasetLoader, DatasetLoaderTrait},
    evaluator::Evaluator,
    metrics::EvaluationResults,
    prompt::build_instruction_prompt,
    report::{console, ReportGenerator},
    runner::EvaluationExecutor,
    toolchain::ToolchainValidator,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quix-eval")]
#[command(about = "Score LLM-generated bug fixes by exact match, AST match, unit tests and similarity")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every example in a dataset
    Run {
        /// Path to the NDJSON dataset (overrides the config file)
        dataset: Option<PathBuf>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Sandbox timeout per example, in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Python interpreter used for unit tests
        #[arg(long)]
        python: Option<String>,

        /// Only evaluate these examples (comma-separated)
        #[arg(long)]
        names: Option<String>,

        /// Directory for results.json and charts
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip chart rendering
        #[arg(long)]
        no_charts: bool,

        /// Print only the summary, not the per-example blocks
        #[arg(short, long)]
        quiet: bool,
    },

    /// Check that every dataset line parses
    Validate {
        dataset: Option<PathBuf>,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List example names in the dataset
    List {
        dataset: Option<PathBuf>,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the instruction prompt for one example
    Prompt {
        /// Example name
        name: String,

        dataset: Option<PathBuf>,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Regenerate charts from an existing results.json
    Report {
        /// Path to results JSON file
        #[arg(short, long)]
        results: PathBuf,

        /// Output directory for reports
        #[arg(short, long, default_value = "reports")]
        output: PathBuf,
    },

    /// Initialize default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quix_eval=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            dataset,
            config,
            timeout,
            python,
            names,
            output,
            no_charts,
            quiet,
        } => {
            run_evaluation(RunArgs {
                dataset,
                config,
                timeout,
                python,
                names,
                output,
                no_charts,
                quiet,
            })
            .await
        }
        Commands::Validate { dataset, config } => validate(dataset, config),
        Commands::List { dataset, config } => list_examples(dataset, config),
        Commands::Prompt {
            name,
            dataset,
            config,
        } => print_prompt(&name, dataset, config),
        Commands::Report { results, output } => generate_reports(results, output),
        Commands::Init { output } => init_config(output),
    }
}

struct RunArgs {
    dataset: Option<PathBuf>,
    config: Option<PathBuf>,
    timeout: Option<u64>,
    python: Option<String>,
    names: Option<String>,
    output: Option<PathBuf>,
    no_charts: bool,
    quiet: bool,
}

/// @ai:intent Evaluate the dataset, print the summary and persist reports when configured
/// @ai:effects fs:read, fs:write, process
async fn run_evaluation(args: RunArgs) -> Result<()> {
    let mut config = load_or_default_config(args.config)?;

    if let Some(dataset) = args.dataset {
        config.dataset.path = Some(dataset);
    }
    if let Some(timeout) = args.timeout {
        config.sandbox.timeout_seconds = timeout;
    }
    if let Some(python) = args.python {
        config.sandbox.python = python;
    }
    if let Some(names) = args.names {
        config.filter.names = Some(split_names(&names));
    }
    if let Some(output) = args.output {
        config.report.output_dir = Some(output);
    }
    if args.no_charts {
        config.report.charts = false;
    }
    config.validate()?;

    let dataset = config.dataset_path()?.to_path_buf();

    let toolchain_status = ToolchainValidator::validate(&config.sandbox.python);
    ToolchainValidator::log_warnings(&toolchain_status);

    tracing::info!("Loading dataset from {}", dataset.display());
    let examples = DatasetLoader::new()
        .load_filtered(&dataset, &config.filter)
        .with_context(|| format!("Failed to load dataset {}", dataset.display()))?;

    if examples.is_empty() {
        tracing::warn!("No examples match the filter criteria");
    } else {
        tracing::info!(
            "Evaluating {} examples (timeout {}s)",
            examples.len(),
            config.sandbox.timeout_seconds
        );
    }

    let executor = EvaluationExecutor::new(Evaluator::new(&config)).with_example_output(!args.quiet);
    let results = executor.run(&examples, &dataset.display().to_string()).await;

    println!();
    console::print_summary(&results.summary);

    if let Some(output) = &config.report.output_dir {
        let timestamp = chrono::Utc::now().format("%Y-%m-%d_%H-%M-%S");
        let output_dir = output.join(timestamp.to_string());

        ReportGenerator::new().generate_all(&results, &output_dir, config.report.charts)?;
        println!("Reports written to {}", output_dir.display());
    }

    Ok(())
}

/// @ai:intent Load the dataset and report the count or the first malformed line
/// @ai:effects fs:read
fn validate(dataset: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let config = config_with_dataset(config, dataset)?;
    let path = config.dataset_path()?;
    let examples = DatasetLoader::new().load_all(path)?;

    println!("Dataset validation passed!");
    println!("Total examples: {}", examples.len());

    Ok(())
}

/// @ai:intent List example names
/// @ai:effects fs:read
fn list_examples(dataset: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let config = config_with_dataset(config, dataset)?;
    let examples = DatasetLoader::new().load_filtered(config.dataset_path()?, &config.filter)?;

    println!("Examples ({}):", examples.len());
    println!("{}", "-".repeat(60));

    for example in &examples {
        println!("  {}", example.name);
    }

    Ok(())
}

/// @ai:intent Print the instruction prompt for one example
/// @ai:effects fs:read
fn print_prompt(name: &str, dataset: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let config = config_with_dataset(config, dataset)?;
    let example = DatasetLoader::new().load_by_name(config.dataset_path()?, name)?;

    print!("{}", build_instruction_prompt(&example, &config.extraction));
    Ok(())
}

/// @ai:intent Generate reports from results file
/// @ai:effects fs:read, fs:write
fn generate_reports(results_path: PathBuf, output_dir: PathBuf) -> Result<()> {
    let content = std::fs::read_to_string(&results_path)
        .with_context(|| format!("Failed to read {}", results_path.display()))?;
    let results: EvaluationResults = serde_json::from_str(&content)?;

    ReportGenerator::new().generate_all(&results, &output_dir, true)?;

    console::print_summary(&results.summary);
    println!("Reports generated in {}", output_dir.display());
    Ok(())
}

/// @ai:intent Initialize default configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<()> {
    let config = EvalConfig::default();
    config.save(&output)?;
    println!("Configuration saved to {}", output.display());
    Ok(())
}

/// @ai:intent Load configuration or use defaults
/// @ai:effects fs:read
fn load_or_default_config(path: Option<PathBuf>) -> Result<EvalConfig> {
    match path {
        Some(p) => EvalConfig::load(&p).with_context(|| format!("Failed to load {}", p.display())),
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);

            if default_path.exists() {
                EvalConfig::load(&default_path)
            } else {
                Ok(EvalConfig::default())
            }
        }
    }
}

/// @ai:effects fs:read
fn config_with_dataset(config: Option<PathBuf>, dataset: Option<PathBuf>) -> Result<EvalConfig> {
    let mut config = load_or_default_config(config)?;
    if let Some(dataset) = dataset {
        config.dataset.path = Some(dataset);
    }
    Ok(config)
}

/// @ai:intent Split a comma-separated name list
/// @ai:effects pure
fn split_names(names: &str) -> Vec<String> {
    names
        .split(',')
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}
