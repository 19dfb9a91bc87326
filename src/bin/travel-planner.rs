//! CLI binary for travel-planner.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PlannerConfig`, prints the itinerary and writes the PDF.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use travel_planner::{
    document_filename, render_document, write_document, DocumentStyles,
    GenerationProgressCallback, PlannerConfig, ProgressCallback, TravelPlanner, TripRequest,
    DEFAULT_PROVIDER,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner shown while the model is writing; one log line per skipped model.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Planning");
        bar.set_message("Crafting your perfect itinerary…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_generation_start(&self, destination: &str, candidates: usize) {
        self.bar.println(format!(
            "{} {}  {}",
            bold("◆"),
            bold(&format!("Planning a trip to {destination}")),
            dim(&format!("{candidates} candidate model(s)")),
        ));
    }

    fn on_attempt_start(&self, model: &str, attempt: usize, total: usize) {
        self.bar.set_prefix(format!("{model} ({attempt}/{total})"));
    }

    fn on_model_unavailable(&self, model: &str, detail: &str) {
        let msg = if detail.chars().count() > 80 {
            format!("{}\u{2026}", detail.chars().take(79).collect::<String>())
        } else {
            detail.to_string()
        };
        self.bar.println(format!(
            "  {} {model} unavailable  {}",
            yellow("↷"),
            dim(&msg)
        ));
    }

    fn on_generation_complete(&self, model: &str, markdown_len: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} Itinerary ready  {}",
            green("✔"),
            dim(&format!("{model}, {markdown_len} chars"))
        );
    }

    fn on_generation_error(&self, error: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), red(error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Plan a trip, print the itinerary and save kyoto-travel-plan.pdf
  travel-planner plan --destination Kyoto --days 3 \
      --interests "temples, tea ceremony" --guardrails "wheelchair accessible"

  # Choose the output file and print JSON instead of Markdown
  travel-planner plan -d Lisbon -n "5 days" -o lisbon.pdf --json

  # Render an existing Markdown itinerary (no API key needed)
  travel-planner render plan.md -o plan.pdf

  # Start the web form on http://127.0.0.1:8501
  travel-planner serve

  # Try cheaper models first
  travel-planner --models gpt-4o-mini,gpt-3.5-turbo plan -d Rome -n 2

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY                OpenAI API key (required for the default provider)
  TRAVEL_PLANNER_PROVIDER       edgequake-llm provider name (default: openai)
  TRAVEL_PLANNER_MODELS         Comma-separated candidate models
  TRAVEL_PLANNER_MAX_TOKENS     Completion token limit (default: 2500)
  TRAVEL_PLANNER_TEMPERATURE    Sampling temperature (default: 0.7)
  TRAVEL_PLANNER_API_TIMEOUT    Per-model timeout in seconds (default: 120)
  RUST_LOG                      Overrides the log filter

A .env file in the working directory is loaded before flags are read.
"#;

/// Plan trips with a language model and export them as PDF.
#[derive(Parser, Debug)]
#[command(
    name = "travel-planner",
    version,
    about = "Generate day-by-day travel itineraries and export them as PDF",
    long_about = "Generate personalised, day-by-day travel itineraries that respect the \
traveler's guardrails (accessibility, diet, pace) using a chat model, falling back to \
older models when one is unavailable, and export the result as a paginated PDF.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// edgequake-llm provider: openai, anthropic, gemini, ollama, …
    #[arg(long, global = true, env = "TRAVEL_PLANNER_PROVIDER", default_value = DEFAULT_PROVIDER)]
    provider: String,

    /// Candidate models in fallback order (comma-separated).
    #[arg(long, global = true, env = "TRAVEL_PLANNER_MODELS", value_delimiter = ',')]
    models: Vec<String>,

    /// Max completion tokens.
    #[arg(long, global = true, env = "TRAVEL_PLANNER_MAX_TOKENS", default_value_t = 2500)]
    max_tokens: usize,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, global = true, env = "TRAVEL_PLANNER_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Per-model call timeout in seconds.
    #[arg(long, global = true, env = "TRAVEL_PLANNER_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, global = true, env = "TRAVEL_PLANNER_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "TRAVEL_PLANNER_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "TRAVEL_PLANNER_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an itinerary, print it and save the PDF.
    Plan(PlanArgs),

    /// Render an existing Markdown itinerary to PDF.
    Render {
        /// Markdown file to render.
        input: PathBuf,

        /// Output PDF path. Default: input with a .pdf extension.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Serve the trip form over HTTP.
    #[cfg(feature = "web")]
    Serve {
        #[arg(long, env = "TRAVEL_PLANNER_HOST", default_value = "127.0.0.1")]
        host: String,

        #[arg(long, env = "TRAVEL_PLANNER_PORT", default_value_t = 8501)]
        port: u16,
    },
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// Destination, e.g. "Tokyo, Japan".
    #[arg(short, long)]
    destination: String,

    /// Number of days, e.g. 5 or "5 days".
    #[arg(short = 'n', long)]
    days: String,

    /// Special interests, e.g. "Museums, Food & Cuisine".
    #[arg(short, long, default_value = "")]
    interests: String,

    /// Hard constraints, e.g. "wheelchair accessible, no spicy food".
    #[arg(short, long, default_value = "")]
    guardrails: String,

    /// PDF path. Default: <destination>-travel-plan.pdf
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the itinerary and attempt log as JSON instead of Markdown.
    #[arg(long)]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "TRAVEL_PLANNER_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads env fallbacks.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let g = &cli.global;

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already reports progress, so library INFO logs are hidden
    // unless asked for.
    let filter = if g.verbose {
        "debug"
    } else if g.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Plan(args) => run_plan(g, args).await,
        Command::Render { input, output } => run_render(g, input, output.clone()).await,
        #[cfg(feature = "web")]
        Command::Serve { host, port } => {
            let config = build_config(g).await?;
            let planner = TravelPlanner::new(config).context("Cannot start planner")?;
            let addr: std::net::SocketAddr = format!("{host}:{port}")
                .parse()
                .with_context(|| format!("Invalid listen address {host}:{port}"))?;
            if !g.quiet {
                eprintln!("{} Serving on {}", green("◆"), bold(&format!("http://{addr}")));
            }
            travel_planner::web::serve(planner, addr)
                .await
                .context("Web server failed")
        }
    }
}

async fn run_plan(g: &GlobalArgs, args: &PlanArgs) -> Result<()> {
    let request = TripRequest::from_form(
        &args.destination,
        &args.days,
        &args.interests,
        &args.guardrails,
    )?;

    let mut config = build_config(g).await?;
    // Check the key before the spinner starts so a failure prints cleanly.
    config.require_api_key().context("Cannot start planner")?;

    let show_progress = !g.quiet && !args.no_progress && !args.json;
    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new();
        config.progress_callback = Some(cb);
    }

    let planner = TravelPlanner::new(config).context("Cannot start planner")?;
    let output = planner
        .plan(&request)
        .await
        .context("Itinerary generation failed")?;

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&output.filename));

    let document = match output.document {
        Ok(doc) => {
            write_document(&path, &doc.bytes)
                .await
                .context("Failed to save PDF")?;
            Some(doc)
        }
        Err(ref e) => {
            eprintln!("{} PDF generation error: {}", red("✘"), e);
            None
        }
    };

    if args.json {
        let json = serde_json::json!({
            "itinerary": &output.itinerary,
            "pdf": document.as_ref().map(|_| path.display().to_string()),
            "pages": document.as_ref().map(|d| d.page_count()),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).context("Failed to serialise output")?
        );
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.itinerary.markdown.as_bytes())
            .context("Failed to write to stdout")?;
    }

    if !g.quiet {
        if let Some(ref doc) = document {
            eprintln!(
                "{}  {} page(s)  →  {}",
                green("✔"),
                doc.page_count(),
                bold(&path.display().to_string()),
            );
        }
        eprintln!(
            "   {} tokens in  /  {} tokens out  —  {}ms total",
            dim(&output.itinerary.prompt_tokens.to_string()),
            dim(&output.itinerary.completion_tokens.to_string()),
            output.itinerary.duration_ms,
        );
    }

    if document.is_none() {
        anyhow::bail!("The itinerary was generated but the PDF could not be built");
    }
    Ok(())
}

async fn run_render(g: &GlobalArgs, input: &Path, output: Option<PathBuf>) -> Result<()> {
    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {:?}", input))?;
    let styles = DocumentStyles::default();
    let doc = render_document(&text, &styles).context("Failed to render PDF")?;

    let path = output.unwrap_or_else(|| {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if stem.is_empty() {
            PathBuf::from(document_filename(""))
        } else {
            input.with_extension("pdf")
        }
    });
    write_document(&path, &doc.bytes)
        .await
        .context("Failed to save PDF")?;

    if !g.quiet {
        eprintln!(
            "{}  {} page(s)  →  {}",
            green("✔"),
            doc.page_count(),
            bold(&path.display().to_string())
        );
    }
    Ok(())
}

/// Map CLI args to `PlannerConfig`.
async fn build_config(g: &GlobalArgs) -> Result<PlannerConfig> {
    let mut builder = PlannerConfig::builder()
        .provider_name(&g.provider)
        .max_tokens(g.max_tokens)
        .temperature(g.temperature)
        .api_timeout_secs(g.api_timeout);

    if !g.models.is_empty() {
        builder = builder.models(g.models.iter().map(String::as_str));
    }

    if let Some(ref path) = g.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}
