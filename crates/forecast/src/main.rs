use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use forecast::cli::{commands, GlobalOptions, OutputFormat};

#[derive(Parser)]
#[command(name = "forecast")]
#[command(about = "Forecast - ask questions about demand forecasts\nPlans the data slice behind a question and hands it to an LLM assistant")]
#[command(version)]
struct Cli {
  /// Config file (defaults to forecast.yaml, .forecast.yaml, then the user config dir)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Monthly forecast CSV, overriding the config
  #[arg(long, global = true)]
  monthly: Option<PathBuf>,

  /// Daily forecast CSV, overriding the config
  #[arg(long, global = true)]
  daily: Option<PathBuf>,

  /// Show planner decisions on stderr
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

/// Credentials for the assistant API
#[derive(Args)]
struct ApiKey {
  /// API key for the chat completion endpoint
  #[arg(long = "api-key", env = "OPENAI_API_KEY", hide_env_values = true)]
  api_key: Option<String>,
}

#[derive(Subcommand)]
enum Command {
  /// Ask one question about the forecasts
  Ask {
    /// The question, in English or French
    #[arg(required = true)]
    question: Vec<String>,
    /// Print the data context instead of calling the assistant
    #[arg(long)]
    context_only: bool,
    /// Rows passed to the assistant before sampling
    #[arg(long)]
    row_cap: Option<usize>,
    #[command(flatten)]
    key: ApiKey,
  },
  /// Show how a question is classified and which rows it selects
  Analyze {
    #[arg(required = true)]
    question: Vec<String>,
    #[arg(long, value_enum, default_value = "pretty")]
    format: OutputFormat,
  },
  /// Overview of the loaded forecasts
  Stats,
  /// Locations with the highest total demand for a product
  Top {
    /// Product name or keyword (e.g. "laptop")
    product: String,
    /// Number of locations to show
    #[arg(short = 'n', long)]
    limit: Option<usize>,
  },
  /// Period-over-period growth per product and location
  Growth {
    #[arg(short, long)]
    product: Option<String>,
    /// Restrict to these locations
    #[arg(short, long)]
    location: Vec<String>,
  },
  /// Total demand per month
  Trend {
    #[arg(short, long)]
    product: Option<String>,
  },
  /// Interactive conversation with the assistant
  Chat {
    #[command(flatten)]
    key: ApiKey,
  },
}

fn init_tracing(verbose: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    if verbose {
      EnvFilter::new("forecast=debug,warn")
    } else {
      EnvFilter::new("forecast=warn,error")
    }
  });

  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(filter)
    .init();
}

async fn handle(options: GlobalOptions, command: Command) -> Result<()> {
  let workspace = commands::Workspace::open(&options)?;

  match command {
    Command::Ask { question, context_only, row_cap, key } => {
      commands::ask(&workspace, &question.join(" "), context_only, row_cap, key.api_key.as_deref())
        .await
    }
    Command::Analyze { question, format } => {
      commands::analyze(&workspace, &question.join(" "), format)
    }
    Command::Stats => commands::stats(&workspace),
    Command::Top { product, limit } => commands::top(&workspace, &product, limit),
    Command::Growth { product, location } => {
      commands::growth_table(&workspace, product.as_deref(), &location)
    }
    Command::Trend { product } => commands::trend(&workspace, product.as_deref()),
    Command::Chat { key } => commands::chat(&workspace, key.api_key.as_deref()).await,
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let options = GlobalOptions { config: cli.config, monthly: cli.monthly, daily: cli.daily };
  handle(options, cli.command).await
}
