//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to be told
//! when each stage starts and finishes. The CLI drives a spinner from it; the
//! web form ignores it.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pptx2docx::{GenerationConfig, GenerationProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl GenerationProgressCallback for Printer {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("{}…", stage.label());
//!     }
//! }
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One step of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Read slide text out of the presentation.
    Extract,
    /// Ask the language model for the structured summary.
    Summarize,
    /// Split the reply into named sections.
    Parse,
    /// Write the Word document.
    Populate,
}

impl Stage {
    /// All stages in the order they run.
    pub const ALL: [Stage; 4] = [Stage::Extract, Stage::Summarize, Stage::Parse, Stage::Populate];

    /// Human-readable label for spinners and logs.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Extract => "Extracting content from presentation",
            Stage::Summarize => "Generating Lessons Learned summary",
            Stage::Parse => "Parsing sections",
            Stage::Populate => "Writing Word document",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Called by the pipeline as it moves through each [`Stage`].
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called just before a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finished successfully.
    ///
    /// # Arguments
    /// * `stage`     : the stage that finished
    /// * `output_len`: byte length of what the stage produced (text, reply,
    ///   number of sections, or document bytes)
    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        let _ = (stage, output_len);
    }

    /// Called once when the document has been written.
    fn on_generation_complete(&self, output_path: &std::path::Path) {
        let _ = output_path;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
