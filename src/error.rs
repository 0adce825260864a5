//! Error types for the edgequake-pptx2docx library.
//!
//! Every failure in the pipeline is fatal: the run either produces a document
//! or it produces nothing. [`Pptx2DocxError`] is the single error type returned
//! by the top-level `generate*` functions.
//!
//! A placeholder token missing from a Word template is **not** an error. It is
//! reported through [`crate::pipeline::populate::TemplateReport`] so callers
//! can log or surface it without losing the generated document.
//!
//! Front ends (CLI, web form) usually want a short, stable message rather than
//! the full diagnostic. [`Pptx2DocxError::category`] and
//! [`Pptx2DocxError::user_message`] give them that.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pptx2docx library.
#[derive(Debug, Error)]
pub enum Pptx2DocxError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Presentation not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a ZIP container at all.
    #[error(
        "File is not a PPTX presentation: '{path}' (looks like {kind})",
        kind = crate::pipeline::input::sniff_format(.magic)
    )]
    NotAPresentation { path: PathBuf, magic: [u8; 4] },

    /// The container opened but a required part is missing or unreadable.
    #[error("Cannot read presentation '{path}': {detail}")]
    CorruptPresentation { path: PathBuf, detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The provider call failed (network, authentication, rate limit, …).
    #[error("Summary generation failed ({provider}): {detail}")]
    SummaryFailed { provider: String, detail: String },

    // ── Template errors ───────────────────────────────────────────────────
    /// Template mode was selected but the template file does not exist.
    #[error("Word template not found: '{path}'")]
    TemplateNotFound { path: PathBuf },

    /// The template is not a readable DOCX package.
    #[error("Cannot read Word template '{path}': {detail}")]
    CorruptTemplate { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse failure classes, matching what a user can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorCategory {
    /// The uploaded or referenced presentation could not be read.
    Input,
    /// The language-model call failed or no provider is configured.
    Summary,
    /// The Word template could not be read.
    Template,
    /// The output document could not be written.
    Output,
    /// Configuration or internal failure.
    Other,
}

impl Pptx2DocxError {
    /// Classify this error for display.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Pptx2DocxError::FileNotFound { .. }
            | Pptx2DocxError::PermissionDenied { .. }
            | Pptx2DocxError::DownloadFailed { .. }
            | Pptx2DocxError::DownloadTimeout { .. }
            | Pptx2DocxError::NotAPresentation { .. }
            | Pptx2DocxError::CorruptPresentation { .. } => ErrorCategory::Input,
            Pptx2DocxError::ProviderNotConfigured { .. } | Pptx2DocxError::SummaryFailed { .. } => {
                ErrorCategory::Summary
            }
            Pptx2DocxError::TemplateNotFound { .. } | Pptx2DocxError::CorruptTemplate { .. } => {
                ErrorCategory::Template
            }
            Pptx2DocxError::OutputWriteFailed { .. } => ErrorCategory::Output,
            Pptx2DocxError::InvalidConfig(_) | Pptx2DocxError::Internal(_) => ErrorCategory::Other,
        }
    }

    /// Short message suitable for an end user; details go to the log.
    pub fn user_message(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Cannot read presentation",
            ErrorCategory::Summary => "Summary generation failed",
            ErrorCategory::Template => "Cannot read Word template",
            ErrorCategory::Output => "Could not save the generated document",
            ErrorCategory::Other => "Something went wrong",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_presentation_is_input_error() {
        let e = Pptx2DocxError::CorruptPresentation {
            path: PathBuf::from("deck.pptx"),
            detail: "missing ppt/presentation.xml".into(),
        };
        assert_eq!(e.category(), ErrorCategory::Input);
        assert_eq!(e.user_message(), "Cannot read presentation");
        assert!(e.to_string().contains("deck.pptx"));
    }

    #[test]
    fn not_a_presentation_names_the_format() {
        let e = Pptx2DocxError::NotAPresentation {
            path: PathBuf::from("notes.txt"),
            magic: *b"hell",
        };
        assert!(e.to_string().contains("notes.txt"), "got: {e}");
        assert!(e.to_string().contains("unknown data"), "got: {e}");
        let e = Pptx2DocxError::NotAPresentation {
            path: PathBuf::from("old.ppt"),
            magic: [0xD0, 0xCF, 0x11, 0xE0],
        };
        assert!(e.to_string().contains("legacy .ppt"), "got: {e}");
        assert_eq!(e.category(), ErrorCategory::Input);
    }

    #[test]
    fn summary_failed_display() {
        let e = Pptx2DocxError::SummaryFailed {
            provider: "openai".into(),
            detail: "401 invalid api key".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("openai"), "got: {msg}");
        assert!(msg.contains("invalid api key"), "got: {msg}");
        assert_eq!(e.user_message(), "Summary generation failed");
    }

    #[test]
    fn provider_not_configured_is_summary_error() {
        let e = Pptx2DocxError::ProviderNotConfigured {
            provider: "openai".into(),
            hint: "Set OPENAI_API_KEY".into(),
        };
        assert_eq!(e.category(), ErrorCategory::Summary);
    }

    #[test]
    fn output_write_failed_keeps_source() {
        use std::error::Error as _;
        let e = Pptx2DocxError::OutputWriteFailed {
            path: PathBuf::from("/readonly/out.docx"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.source().is_some());
        assert_eq!(e.category(), ErrorCategory::Output);
    }
}
