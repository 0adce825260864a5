//! # edgequake-pptx2docx
//!
//! Turn an incident-review slide deck into a "Serious Event Lessons Learned"
//! Word document, with one language-model call in the middle.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PPTX
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Extract   one text segment per text-bearing shape, slide order
//!  ├─ 3. Summarize single chat request (gpt-3.5-turbo, t=0.2, 700 tokens)
//!  ├─ 4. Clean     undo markdown fences and decorated headers
//!  ├─ 5. Parse     colon-terminated lines open sections
//!  └─ 6. Populate  new DOCX from scratch, or fill a DOCX template
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pptx2docx::{generate, GenerationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential read from OPENAI_API_KEY
//!     let config = GenerationConfig::from_env();
//!     let output = generate("incident.pptx", "lessons.docx", &config).await?;
//!     println!("{}", output.reply);
//!     eprintln!("tokens: {} in / {} out",
//!         output.stats.input_tokens,
//!         output.stats.output_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Template Mode
//!
//! Point [`GenerationConfigBuilder::template`] at a `.docx` whose paragraphs
//! contain `{{Title}}`, `{{Event_Summary}}`, `{{Contributing_Factors}}` or
//! `{{Lessons_Learned}}`. Each such paragraph is replaced by that section's
//! text; tokens the template lacks are listed in [`TemplateReport::missing`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pptx2docx` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `web`   | on      | Enables [`server`], the single-page upload form (axum) |
//!
//! Disable both when using only the library:
//! ```toml
//! edgequake-pptx2docx = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod docx;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
#[cfg(feature = "web")]
pub mod server;

mod ooxml;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DocumentMode, GenerationConfig, GenerationConfigBuilder};
pub use convert::{generate, generate_from_bytes, generate_sync, inspect, render_reply};
pub use error::{ErrorCategory, Pptx2DocxError};
pub use output::{GenerationOutput, GenerationStats, PresentationMetadata};
pub use pipeline::extract::extract_text;
pub use pipeline::populate::TemplateReport;
pub use pipeline::sections::{parse_sections, SectionMap};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
