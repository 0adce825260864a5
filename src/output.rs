//! Result types returned by the generation entry points.

use crate::pipeline::populate::TemplateReport;
use crate::pipeline::sections::SectionMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything a successful run produced, besides the file on disk.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutput {
    /// Where the Word document was written.
    pub output_path: PathBuf,
    /// Slide text that was sent to the model.
    pub raw_text: String,
    /// The model's reply, trimmed, before clean-up.
    pub reply: String,
    /// Sections parsed from the (cleaned) reply.
    pub sections: SectionMap,
    /// Facts about the input deck.
    pub metadata: PresentationMetadata,
    /// Placeholder bookkeeping; `None` in from-scratch mode.
    pub template: Option<TemplateReport>,
    /// Timings and token counts.
    pub stats: GenerationStats,
}

/// Facts about a presentation, available without an API key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationMetadata {
    /// `dc:title` from the package core properties.
    pub title: Option<String>,
    /// Number of slides listed by the presentation.
    pub slide_count: usize,
    /// Number of shapes that carry a text frame.
    pub text_shape_count: usize,
    /// Characters of extracted text (excluding separators).
    pub char_count: usize,
}

/// Timings and token usage for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationStats {
    pub model: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub extract_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub populate_duration_ms: u64,
    pub total_duration_ms: u64,
    /// Size of the written document in bytes.
    pub output_bytes: u64,
}
