use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use crate::aggregate::{monthly_totals, top_n};
use crate::assistant::{Assistant, ConversationHistory, OpenAiClient};
use crate::cli::display;
use crate::cli::{GlobalOptions, OutputFormat};
use crate::config::Config;
use crate::dataset::{Dataset, DatasetLoader};
use crate::extract::{EntityExtractor, QueryAnalysis};
use crate::growth::growth;
use crate::planner::{DataSlice, PlanWarning, QueryPlanner};
use crate::summarize::{render_table, summarize};

/// Resolved config plus the lazily loaded dataset it points at
pub struct Workspace {
  pub config: Config,
  loader: DatasetLoader,
}

impl Workspace {
  pub fn open(options: &GlobalOptions) -> Result<Self> {
    let mut config = match &options.config {
      Some(path) => Config::load_from_file(path)
        .with_context(|| format!("Failed to load config {}", path.display()))?,
      None => Config::load().context("Failed to load config")?,
    };

    if let Some(monthly) = &options.monthly {
      config.data.monthly = monthly.clone();
    }
    if let Some(daily) = &options.daily {
      config.data.daily = daily.clone();
    }

    let loader = DatasetLoader::new(&config.data.monthly, &config.data.daily);
    Ok(Self { config, loader })
  }

  pub fn dataset(&self) -> Result<&Dataset> {
    self.loader.load().with_context(|| {
      format!(
        "Failed to load forecast data from {} and {}",
        self.loader.monthly_path().display(),
        self.loader.daily_path().display()
      )
    })
  }

  pub fn planner(&self) -> Result<QueryPlanner<'_>> {
    Ok(QueryPlanner::new(self.dataset()?).with_top_n(self.config.planner.top_n))
  }

  fn assistant(&self, api_key: Option<&str>) -> Result<Assistant<OpenAiClient>> {
    let client = OpenAiClient::from_config(&self.config, api_key)?;
    Ok(Assistant::new(client, self.config.prompts.clone()))
  }
}

/// Answer one question, or print the context the assistant would get
pub async fn ask(
  workspace: &Workspace,
  question: &str,
  context_only: bool,
  row_cap: Option<usize>,
  api_key: Option<&str>,
) -> Result<()> {
  let planner = workspace.planner()?;
  let planned = planner.resolve(question);
  display::print_warnings(&planned.warnings);

  let row_cap = row_cap.unwrap_or(workspace.config.context.row_cap);
  let payload = summarize(&planned.slice, row_cap);

  if context_only {
    println!("{}", payload.render());
    return Ok(());
  }

  let assistant = workspace.assistant(api_key)?;
  let mut history = ConversationHistory::new(workspace.config.llm.history_window);
  let answer = assistant
    .ask(&mut history, question, Some(&payload))
    .await
    .context("The assistant could not answer")?;

  println!("{answer}");
  Ok(())
}

#[derive(Serialize)]
struct AnalysisReport<'a> {
  analysis: &'a QueryAnalysis,
  rows: usize,
  warnings: &'a [PlanWarning],
}

/// Show how a question is understood without calling the assistant
pub fn analyze(workspace: &Workspace, question: &str, format: OutputFormat) -> Result<()> {
  let planner = workspace.planner()?;
  let planned = planner.resolve(question);

  match format {
    OutputFormat::Json => {
      let report = AnalysisReport {
        analysis: &planned.analysis,
        rows: planned.slice.len(),
        warnings: &planned.warnings,
      };
      println!("{}", serde_json::to_string_pretty(&report)?);
    }
    OutputFormat::Pretty => {
      for line in display::analysis_lines(&planned.analysis, planned.slice.len()) {
        println!("{line}");
      }
      display::print_warnings(&planned.warnings);
    }
  }

  Ok(())
}

pub fn stats(workspace: &Workspace) -> Result<()> {
  let dataset = workspace.dataset()?;
  for line in display::summary_lines(&dataset.summary()) {
    println!("{line}");
  }
  Ok(())
}

/// Product names may be given as a keyword ("laptop") or in full
fn resolve_product(raw: &str) -> String {
  EntityExtractor::new().extract_product(raw).unwrap_or_else(|| raw.to_string())
}

pub fn top(workspace: &Workspace, product: &str, limit: Option<usize>) -> Result<()> {
  let dataset = workspace.dataset()?;
  let product = resolve_product(product);
  let limit = limit.unwrap_or(workspace.config.planner.top_n);

  let totals = top_n(dataset.monthly(), &product, limit);
  if totals.is_empty() {
    bentley::warn!("No forecasts for product {}", product);
    return Ok(());
  }

  println!("{} {}", "Top locations for".bold(), product.cyan());
  println!("{}", display::ranking_table(&totals));
  Ok(())
}

pub fn growth_table(
  workspace: &Workspace,
  product: Option<&str>,
  locations: &[String],
) -> Result<()> {
  let dataset = workspace.dataset()?;
  let product = product.map(resolve_product);

  let mut table = growth(dataset.monthly(), product.as_deref());
  if !locations.is_empty() {
    let extractor = EntityExtractor::new().with_known_locations(dataset.locations());
    let resolved: Vec<String> =
      locations.iter().flat_map(|l| extractor.extract_locations(l)).collect();
    table = table.restrict_to_locations(&resolved);
  }

  if table.is_empty() {
    bentley::warn!("No forecast rows to compute growth from");
    return Ok(());
  }

  let payload = summarize(&DataSlice::Growth(table), usize::MAX);
  println!("{}", render_table(&payload.columns, &payload.rows));
  Ok(())
}

pub fn trend(workspace: &Workspace, product: Option<&str>) -> Result<()> {
  let dataset = workspace.dataset()?;
  let product = product.map(resolve_product);

  let totals = monthly_totals(dataset.monthly(), product.as_deref());
  if totals.is_empty() {
    bentley::warn!("No forecast rows to chart");
    return Ok(());
  }

  println!("{}", display::trend_table(&totals));
  Ok(())
}

/// Interactive session. One history is kept for the whole session and
/// bounded by the configured window.
pub async fn chat(workspace: &Workspace, api_key: Option<&str>) -> Result<()> {
  let planner = workspace.planner()?;
  let assistant = workspace.assistant(api_key)?;
  let mut history = ConversationHistory::new(workspace.config.llm.history_window);
  let session = Uuid::new_v4();

  bentley::announce!("Forecast assistant ({} rows loaded)", workspace.dataset()?.monthly().len());
  bentley::info!("Type a question, /reset to forget the conversation, /quit to leave");
  tracing::debug!(%session, "chat session started");

  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  while let Some(line) = lines.next_line().await? {
    let question = line.trim();
    match question {
      "" => continue,
      "/quit" | "/exit" => break,
      "/reset" => {
        history.clear();
        bentley::success!("Conversation reset");
        continue;
      }
      _ => {}
    }

    let planned = planner.resolve(question);
    display::print_warnings(&planned.warnings);
    let payload = summarize(&planned.slice, workspace.config.context.row_cap);

    match assistant.ask(&mut history, question, Some(&payload)).await {
      Ok(answer) => {
        println!("{answer}");
        println!("{}", display::separator());
      }
      Err(e) => bentley::error!("{}", e),
    }
    bentley::event(
      bentley::Level::Info,
      &format!("session {} · {} messages in history", session, history.len()),
    );
  }

  Ok(())
}
