//! CLI binary for edgequake-pptx2docx.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `GenerationConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pptx2docx::{
    extract_text, generate, inspect, render_reply, DocumentMode, GenerationConfig,
    GenerationOutput, GenerationProgressCallback, ProgressCallback, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

/// Terminal progress: one spinner whose message follows the current stage,
/// and a tick line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_message("Opening presentation…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{}…", stage.label()));
    }

    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        let unit = match stage {
            Stage::Parse => "sections",
            Stage::Populate => "bytes",
            Stage::Extract | Stage::Summarize => "chars",
        };
        self.bar.println(format!(
            "  {} {:<40} {}",
            green("✓"),
            stage.label(),
            dim(&format!("{output_len:>6} {unit}"))
        ));
    }

    fn on_generation_complete(&self, _output_path: &Path) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate a new document
  pptx2docx incident.pptx -o lessons.docx

  # Fill a company template instead
  pptx2docx incident.pptx --template lessons_template.docx -o lessons.docx

  # Re-render a saved reply without calling the model
  pptx2docx --reply reply.txt -o lessons.docx

  # Show the text that would be sent (no API key needed)
  pptx2docx --extract-only incident.pptx

  # Presentation facts (no API key needed)
  pptx2docx --inspect-only incident.pptx

  # Serve the upload form
  pptx2docx --serve --bind 0.0.0.0:8000

TEMPLATE TOKENS:
  A paragraph containing one of these is replaced by the section's text:
  {{Title}}  {{Event_Summary}}  {{Contributing_Factors}}  {{Lessons_Learned}}

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (required for the default provider)
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID (with EDGEQUAKE_LLM_PROVIDER)
  RUST_LOG                Log filter, e.g. edgequake_pptx2docx=debug
"#;

/// Turn incident-review slide decks into Lessons Learned Word documents.
#[derive(Parser, Debug)]
#[command(
    name = "pptx2docx",
    version,
    about = "Turn incident-review slide decks into Lessons Learned Word documents",
    long_about = "Extract the text of a PowerPoint presentation, ask a language model for a \
structured Serious Event Lessons Learned summary, and write it as a Word document, either \
from scratch or by filling placeholder paragraphs in a template.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local .pptx file path or HTTP/HTTPS URL.
    #[arg(required_unless_present_any = ["serve", "reply"])]
    input: Option<String>,

    /// Where to write the Word document.
    #[arg(short, long, env = "PPTX2DOCX_OUTPUT", default_value = "Lessons_Learned_Summary.docx")]
    output: PathBuf,

    /// Fill this .docx template instead of building a new document.
    #[arg(short, long, env = "PPTX2DOCX_TEMPLATE")]
    template: Option<PathBuf>,

    /// LLM model ID (default: gpt-3.5-turbo).
    #[arg(long, env = "PPTX2DOCX_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. OpenAI when OPENAI_API_KEY is set, otherwise auto-detected.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Path to a text file with a custom instruction; `{text}` marks the slide text.
    #[arg(long, env = "PPTX2DOCX_PROMPT")]
    prompt: Option<PathBuf>,

    /// Max LLM output tokens.
    #[arg(long, env = "PPTX2DOCX_MAX_TOKENS", default_value_t = 700)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PPTX2DOCX_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Heading used when the reply has no title.
    #[arg(long, env = "PPTX2DOCX_DEFAULT_TITLE", default_value = "Lessons Learned")]
    default_title: String,

    /// Clean up the reply before parsing: undecorate headers, drop blank
    /// lines and list markers.
    #[arg(long)]
    normalise: bool,

    /// Render a saved model reply instead of calling the model.
    #[arg(long, conflicts_with_all = ["serve", "inspect_only", "extract_only"])]
    reply: Option<PathBuf>,

    /// Output structured JSON (GenerationOutput) on stdout.
    #[arg(long, env = "PPTX2DOCX_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PPTX2DOCX_NO_PROGRESS")]
    no_progress: bool,

    /// Print presentation facts only, no generation.
    #[arg(long)]
    inspect_only: bool,

    /// Print the extracted slide text only, no generation.
    #[arg(long)]
    extract_only: bool,

    /// Serve the upload form instead of processing one file.
    #[arg(long)]
    serve: bool,

    /// Address for --serve.
    #[arg(long, env = "PPTX2DOCX_BIND", default_value = "127.0.0.1:8000")]
    bind: String,

    /// Directory for uploads and the generated document under --serve.
    #[arg(long, env = "PPTX2DOCX_WORK_DIR", default_value = ".")]
    work_dir: PathBuf,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PPTX2DOCX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PPTX2DOCX_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PPTX2DOCX_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters when it is shown, so
    // library INFO logs are hidden unless the user asks for more.
    let show_progress =
        !cli.quiet && !cli.no_progress && !cli.json && !cli.serve && cli.reply.is_none();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect / extract-only modes ─────────────────────────────────────
    if cli.inspect_only || cli.extract_only {
        let input = cli.input.as_deref().context("An input presentation is required")?;
        return print_presentation(&cli, input).await;
    }

    // ── Build config ─────────────────────────────────────────────────────
    let spinner = show_progress.then(CliProgressCallback::new);
    let progress_cb: Option<ProgressCallback> = spinner
        .clone()
        .map(|cb| cb as Arc<dyn GenerationProgressCallback>);
    let config = build_config(&cli, progress_cb).await?;

    // ── Serve mode ───────────────────────────────────────────────────────
    if cli.serve {
        return serve(&cli, config).await;
    }

    // ── Offline render of a saved reply ──────────────────────────────────
    if let Some(ref reply_path) = cli.reply {
        let reply = tokio::fs::read_to_string(reply_path)
            .await
            .with_context(|| format!("Failed to read reply from {:?}", reply_path))?;
        let (sections, report) = render_reply(&reply, &cli.output, &config)
            .await
            .context("Rendering failed")?;

        if cli.json {
            let json = serde_json::json!({ "sections": sections, "template": report });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).context("Failed to serialise output")?
            );
        }
        if !cli.quiet {
            if let Some(ref report) = report {
                warn_missing(&report.missing);
            }
            eprintln!(
                "{}  {} sections  →  {}",
                green("✔"),
                sections.len(),
                bold(&cli.output.display().to_string())
            );
        }
        return Ok(());
    }

    // ── Run generation ───────────────────────────────────────────────────
    let input = cli.input.as_deref().context("An input presentation is required")?;
    let result = generate(input, &cli.output, &config).await;
    if let Some(ref spinner) = spinner {
        spinner.bar.finish_and_clear();
    }
    let output = result.context("Generation failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }
    if !cli.quiet {
        print_summary(&output);
    }

    Ok(())
}

/// `--inspect-only` / `--extract-only`: no provider needed.
async fn print_presentation(cli: &Cli, input: &str) -> Result<()> {
    if cli.extract_only {
        let path = PathBuf::from(input);
        let text = tokio::task::spawn_blocking(move || extract_text(&path))
            .await
            .context("Extraction task failed")?
            .context("Failed to extract slide text")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
        return Ok(());
    }

    let meta = inspect(input).await.context("Failed to inspect presentation")?;
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
        );
    } else {
        println!("File:         {}", input);
        if let Some(ref t) = meta.title {
            println!("Title:        {}", t);
        }
        println!("Slides:       {}", meta.slide_count);
        println!("Text shapes:  {}", meta.text_shape_count);
        println!("Characters:   {}", meta.char_count);
    }
    Ok(())
}

#[cfg(feature = "web")]
async fn serve(cli: &Cli, config: GenerationConfig) -> Result<()> {
    use edgequake_pptx2docx::server::{self, AppState};

    if !cli.quiet {
        eprintln!("{} Upload form at {}", green("◆"), bold(&format!("http://{}", cli.bind)));
    }
    server::serve(&cli.bind, AppState::new(config, &cli.work_dir))
        .await
        .with_context(|| format!("Server on {} failed", cli.bind))
}

#[cfg(not(feature = "web"))]
async fn serve(_cli: &Cli, _config: GenerationConfig) -> Result<()> {
    anyhow::bail!("This build has no web form; rebuild with `--features web`")
}

fn warn_missing(missing: &[String]) {
    if !missing.is_empty() {
        eprintln!(
            "{} Template has no paragraph for: {}",
            yellow("⚠"),
            missing.join(", ")
        );
    }
}

fn print_summary(output: &GenerationOutput) {
    if let Some(ref report) = output.template {
        warn_missing(&report.missing);
    }
    eprintln!(
        "{}  {} slides  {} sections  {}ms  →  {}",
        green("✔"),
        output.metadata.slide_count,
        output.sections.len(),
        output.stats.total_duration_ms,
        bold(&output.output_path.display().to_string()),
    );
    eprintln!(
        "   {} tokens in  /  {} tokens out  ({})",
        dim(&output.stats.input_tokens.to_string()),
        dim(&output.stats.output_tokens.to_string()),
        output.stats.model,
    );
}

/// Map CLI args to `GenerationConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .default_title(cli.default_title.clone())
        .normalise_reply(cli.normalise)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref path) = cli.prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.prompt(prompt);
    }
    if let Some(ref template) = cli.template {
        builder = builder.mode(DocumentMode::Template(template.clone()));
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(key) = edgequake_pptx2docx::config::read_api_key() {
        builder = builder.api_key(key);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
