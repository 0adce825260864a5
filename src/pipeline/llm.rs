//! Summary request: send the slide text to the model, return its reply.
//!
//! This module is intentionally thin. The instruction wording lives in
//! [`crate::prompts`] and the reply is interpreted elsewhere
//! ([`crate::pipeline::postprocess`], [`crate::pipeline::sections`]); here we
//! only assemble one chat request and call the provider once.
//!
//! ## Failure Policy
//!
//! There is exactly one round trip per run. A provider error is fatal and
//! surfaces as [`Pptx2DocxError::SummaryFailed`]; nothing is retried and no
//! timeout is imposed beyond what the provider itself applies.

use crate::config::{GenerationConfig, API_KEY_ENV};
use crate::error::Pptx2DocxError;
use crate::prompts::build_prompt;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, OpenAIProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// The model's answer for one presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Reply text, trimmed of surrounding whitespace.
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub duration_ms: u64,
}

/// Sends one summary request per call, using the provider and sampling
/// parameters captured at construction.
pub struct SummaryRequester {
    provider: Arc<dyn LLMProvider>,
    prompt: Option<String>,
    options: CompletionOptions,
}

impl SummaryRequester {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &GenerationConfig) -> Self {
        Self {
            provider,
            prompt: config.prompt.clone(),
            options: build_options(config),
        }
    }

    /// Request a summary of `raw_text`.
    ///
    /// The instruction and the text travel together in a single user message;
    /// the reply is trimmed and otherwise returned as the model wrote it.
    pub async fn request(&self, raw_text: &str) -> Result<Summary, Pptx2DocxError> {
        let start = Instant::now();
        let messages = build_messages(self.prompt.as_deref(), raw_text);
        debug!(
            "Requesting summary: {} chars of slide text, max_tokens={:?}",
            raw_text.len(),
            self.options.max_tokens
        );

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| Pptx2DocxError::SummaryFailed {
                provider: self.provider.name().to_string(),
                detail: format!("{e}"),
            })?;

        let duration = start.elapsed();
        info!(
            "Summary received: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens, response.completion_tokens, duration
        );

        Ok(Summary {
            content: response.content.trim().to_string(),
            prompt_tokens: response.prompt_tokens,
            completion_tokens: response.completion_tokens,
            duration_ms: duration.as_millis() as u64,
        })
    }
}

/// The chat request for `raw_text`: one user message.
fn build_messages(prompt: Option<&str>, raw_text: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user(build_prompt(prompt, raw_text))]
}

/// Build `CompletionOptions` from the generation config.
fn build_options(config: &GenerationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

// ── Provider resolution ──────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, Pptx2DocxError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Pptx2DocxError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// OpenAI client built from the credential the config carries.
fn openai_with_key(key: &str, model: &str) -> Arc<dyn LLMProvider> {
    Arc::new(OpenAIProvider::new(key).with_model(model))
}

fn missing_key(provider: &str) -> Pptx2DocxError {
    Pptx2DocxError::ProviderNotConfigured {
        provider: provider.to_string(),
        hint: format!("{API_KEY_ENV} is not set. Export it or pass a pre-built provider."),
    }
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model` or
///    [`crate::config::DEFAULT_MODEL`]. `openai` is built from
///    `config.api_key`; naming it without a credential fails here rather
///    than at request time.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI** whenever the config carries a credential.
/// 5. **Auto-detection** via [`ProviderFactory::from_env`].
///
/// The OpenAI client always takes its key from the config, never from the
/// process environment. Other named providers read their own credentials.
pub async fn resolve_provider(
    config: &GenerationConfig,
) -> Result<Arc<dyn LLMProvider>, Pptx2DocxError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        if name.eq_ignore_ascii_case("openai") {
            let key = config.api_key.as_deref().ok_or_else(|| missing_key(name))?;
            return Ok(openai_with_key(key, config.model_name()));
        }
        return create_provider(name, config.model_name());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Some(ref key) = config.api_key {
        return Ok(openai_with_key(key, config.model_name()));
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Pptx2DocxError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set {API_KEY_ENV} or configure a provider.\n\
                Error: {e}"
            ),
        })?;

    Ok(llm_provider)
}
