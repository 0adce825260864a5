//! Generation entry points.
//!
//! [`generate`] runs the whole pipeline for one presentation: resolve the
//! input, extract slide text, request the summary, clean and parse the reply,
//! and write the Word document. The document is written last, only after
//! every earlier stage succeeded.
//!
//! [`render_reply`] is the offline half (clean → parse → populate) for callers
//! that already hold a reply, and [`inspect`] reads presentation facts without
//! touching the model.

use crate::config::GenerationConfig;
use crate::error::Pptx2DocxError;
use crate::output::{GenerationOutput, GenerationStats, PresentationMetadata};
use crate::pipeline::extract::{self, ExtractedPresentation};
use crate::pipeline::llm::{resolve_provider, SummaryRequester};
use crate::pipeline::populate::{self, Populated, TemplateReport};
use crate::pipeline::sections::{parse_sections, SectionMap};
use crate::pipeline::{input, postprocess};
use crate::progress::Stage;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Turn a presentation file or URL into a Lessons Learned document.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str`  : Local `.pptx` path or HTTP/HTTPS URL
/// * `output_path`: Where the `.docx` is written (overwritten if present)
/// * `config`     : Generation configuration
///
/// # Errors
/// Every error is fatal and leaves no output file behind:
/// - presentation missing, unreadable, or not a PPTX
/// - provider not configured, or the summary request failed
/// - template missing or unreadable (template mode)
/// - output not writable
pub async fn generate(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, Pptx2DocxError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    let output_path = output_path.as_ref();
    info!("Starting generation: {}", input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;

    // ── Step 2: Get/create provider ──────────────────────────────────────
    let provider = resolve_provider(config).await?;

    // ── Step 3: Extract slide text ───────────────────────────────────────
    stage_start(config, Stage::Extract);
    let extract_start = Instant::now();
    let presentation = extract_blocking(resolved.path().to_path_buf()).await?;
    let raw_text = presentation.raw_text();
    let metadata = presentation.metadata();
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    if raw_text.is_empty() {
        warn!("Presentation has no slide text; the summary will be based on nothing");
    }
    stage_complete(config, Stage::Extract, raw_text.len());

    // ── Step 4: Request the summary ──────────────────────────────────────
    stage_start(config, Stage::Summarize);
    let requester = SummaryRequester::new(provider, config);
    let summary = requester.request(&raw_text).await?;
    stage_complete(config, Stage::Summarize, summary.content.len());

    // ── Step 5: Clean, parse, populate ───────────────────────────────────
    let populate_start = Instant::now();
    let (sections, populated) = render(&summary.content, output_path, config).await?;
    let populate_duration_ms = populate_start.elapsed().as_millis() as u64;

    // ── Step 6: Compute stats ────────────────────────────────────────────
    let stats = GenerationStats {
        model: config.model_name().to_string(),
        input_tokens: summary.prompt_tokens,
        output_tokens: summary.completion_tokens,
        extract_duration_ms,
        llm_duration_ms: summary.duration_ms,
        populate_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        output_bytes: populated.bytes,
    };

    info!(
        "Generation complete: '{}' ({} sections, {}ms total)",
        populated.path.display(),
        sections.len(),
        stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_complete(&populated.path);
    }

    Ok(GenerationOutput {
        output_path: populated.path,
        raw_text,
        reply: summary.content,
        sections,
        metadata,
        template: populated.template,
        stats,
    })
}

/// Generate from presentation bytes held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is removed on return.
/// This is what the upload form uses.
pub async fn generate_from_bytes(
    bytes: &[u8],
    output_path: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, Pptx2DocxError> {
    let mut tmp = tempfile::Builder::new()
        .suffix(".pptx")
        .tempfile()
        .map_err(|e| Pptx2DocxError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Pptx2DocxError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `generate` returns
    generate(&path, output_path, config).await
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, Pptx2DocxError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pptx2DocxError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(input_str, output_path, config))
}

/// Write the document for an existing reply, without calling the model.
///
/// Applies the same clean-up, parsing and population as [`generate`].
pub async fn render_reply(
    reply: &str,
    output_path: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<(SectionMap, Option<TemplateReport>), Pptx2DocxError> {
    let (sections, populated) = render(reply, output_path.as_ref(), config).await?;
    Ok((sections, populated.template))
}

/// Read presentation facts without generating anything.
///
/// Does not require an LLM provider or API key.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<PresentationMetadata, Pptx2DocxError> {
    let resolved = input::resolve_input(input_str.as_ref(), 120).await?;
    let presentation = extract_blocking(resolved.path().to_path_buf()).await?;
    Ok(presentation.metadata())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Zip and XML parsing is blocking work; keep it off the async workers.
async fn extract_blocking(path: PathBuf) -> Result<ExtractedPresentation, Pptx2DocxError> {
    tokio::task::spawn_blocking(move || extract::extract_presentation(&path))
        .await
        .map_err(|e| Pptx2DocxError::Internal(format!("extraction task panicked: {e}")))?
}

async fn render(
    reply: &str,
    output_path: &Path,
    config: &GenerationConfig,
) -> Result<(SectionMap, Populated), Pptx2DocxError> {
    stage_start(config, Stage::Parse);
    let sections = if config.normalise_reply {
        parse_sections(&postprocess::clean_reply(reply))
    } else {
        parse_sections(reply)
    };
    debug!(
        "Parsed {} sections: {:?}",
        sections.len(),
        sections.names().collect::<Vec<_>>()
    );
    stage_complete(config, Stage::Parse, sections.len());

    stage_start(config, Stage::Populate);
    let populated = populate::populate(&sections, config, output_path).await?;
    stage_complete(config, Stage::Populate, populated.bytes as usize);

    Ok((sections, populated))
}

fn stage_start(config: &GenerationConfig, stage: Stage) {
    debug!("Stage start: {}", stage);
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}

fn stage_complete(config: &GenerationConfig, stage: Stage, output_len: usize) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(stage, output_len);
    }
}
