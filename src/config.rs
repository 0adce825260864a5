//! Configuration types for slide-deck-to-Word generation.
//!
//! All generation behaviour is controlled through [`GenerationConfig`], built
//! via its [`GenerationConfigBuilder`]. The credential and the provider live
//! here too, so one value carries everything a single pipeline run needs and
//! nothing is read from process-wide state once the run has started.

use crate::error::Pptx2DocxError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Heading used when the reply has no usable `Title` section.
pub const DEFAULT_TITLE: &str = "Lessons Learned";

/// Environment variable holding the OpenAI credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Configuration for one presentation-to-document run.
///
/// Built via [`GenerationConfig::builder()`], [`GenerationConfig::from_env()`]
/// or [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pptx2docx::{DocumentMode, GenerationConfig};
///
/// let config = GenerationConfig::builder()
///     .model("gpt-4.1-mini")
///     .mode(DocumentMode::Template("template.docx".into()))
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// API credential captured at startup. Never printed.
    pub api_key: Option<String>,

    /// Sampling temperature. Default: 0.2.
    ///
    /// The summary should restate the deck, not embellish it.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 700.
    pub max_tokens: usize,

    /// Custom instruction template. `{text}` is replaced with the slide text.
    /// If None, uses [`crate::prompts::DEFAULT_PROMPT`].
    pub prompt: Option<String>,

    /// How the output document is produced. Default: from scratch.
    pub mode: DocumentMode,

    /// Top-level heading when the reply carries no title. Default: "Lessons Learned".
    pub default_title: String,

    /// Run [`crate::pipeline::postprocess::clean_reply`] before parsing. Default: false,
    /// so section lines reach the document exactly as the model wrote them.
    pub normalise_reply: bool,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional stage-level progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            api_key: None,
            temperature: 0.2,
            max_tokens: 700,
            prompt: None,
            mode: DocumentMode::default(),
            default_title: DEFAULT_TITLE.to_string(),
            normalise_reply: false,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("prompt", &self.prompt.as_ref().map(|p| p.len()))
            .field("mode", &self.mode)
            .field("default_title", &self.default_title)
            .field("normalise_reply", &self.normalise_reply)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default configuration with the credential read from `OPENAI_API_KEY`.
    pub fn from_env() -> Self {
        Self {
            api_key: read_api_key(),
            ..Self::default()
        }
    }

    /// The model that will be requested.
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Read the credential from the environment; empty values count as unset.
pub fn read_api_key() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty())
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn mode(mut self, mode: DocumentMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Shorthand for `mode(DocumentMode::Template(path))`.
    pub fn template(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.mode = DocumentMode::Template(path.into());
        self
    }

    pub fn default_title(mut self, title: impl Into<String>) -> Self {
        self.config.default_title = title.into();
        self
    }

    pub fn normalise_reply(mut self, v: bool) -> Self {
        self.config.normalise_reply = v;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, Pptx2DocxError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(Pptx2DocxError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if let Some(ref prompt) = c.prompt {
            if !prompt.contains(crate::prompts::TEXT_PLACEHOLDER) {
                return Err(Pptx2DocxError::InvalidConfig(format!(
                    "custom prompt must contain the {} placeholder",
                    crate::prompts::TEXT_PLACEHOLDER
                )));
            }
        }
        if c.default_title.trim().is_empty() {
            return Err(Pptx2DocxError::InvalidConfig(
                "default title must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the output Word document is produced.
///
/// | Mode | Result |
/// |------|--------|
/// | `FromScratch` | New document: title heading, summary paragraph, two bulleted lists |
/// | `Template(path)` | Copy of `path` with `{{Title}}`-style placeholder paragraphs replaced |
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentMode {
    /// Build a new document with headings and bullet lists. (default)
    #[default]
    FromScratch,
    /// Fill placeholder paragraphs inside an existing DOCX template.
    Template(PathBuf),
}

impl DocumentMode {
    /// The template path, when in template mode.
    pub fn template_path(&self) -> Option<&std::path::Path> {
        match self {
            DocumentMode::FromScratch => None,
            DocumentMode::Template(p) => Some(p),
        }
    }
}
