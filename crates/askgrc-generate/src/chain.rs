//! Sequential generation-provider fallback chain.
//!
//! Providers are ranked once at startup and tried strictly in order with a
//! per-attempt timeout; the first success short-circuits. Providers are
//! never called in parallel, so an earlier success never incurs spend on a
//! later provider. Failures accumulate and are carried in the answer
//! metadata instead of being swallowed.

use std::sync::Arc;
use std::time::Duration;

use askgrc_core::traits::GenerationProvider;
use askgrc_core::types::{FusedResult, GenerationRequest};

pub struct ProviderChain {
    providers: Vec<Arc<dyn GenerationProvider>>,
    attempt_timeout: Duration,
}

/// What the chain produced: either one provider's output, or the list of
/// errors after every provider (possibly none configured) failed.
pub enum ChainOutcome {
    Generated {
        text: String,
        provider: String,
        tokens: Option<u32>,
        errors: Vec<String>,
    },
    Exhausted {
        errors: Vec<String>,
    },
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn GenerationProvider>>, attempt_timeout: Duration) -> Self {
        Self { providers, attempt_timeout }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub async fn generate(&self, req: &GenerationRequest) -> ChainOutcome {
        let mut errors = Vec::new();
        for provider in &self.providers {
            let attempt = tokio::time::timeout(self.attempt_timeout, provider.generate(req));
            match attempt.await {
                Ok(Ok(output)) => {
                    return ChainOutcome::Generated {
                        text: output.text,
                        provider: provider.name().to_string(),
                        tokens: output.tokens,
                        errors,
                    };
                }
                Ok(Err(e)) => {
                    tracing::warn!(provider = provider.name(), error = %e, "provider failed, trying next");
                    errors.push(format!("{}: {e}", provider.name()));
                }
                Err(_) => {
                    tracing::warn!(
                        provider = provider.name(),
                        timeout_ms = self.attempt_timeout.as_millis() as u64,
                        "provider timed out, trying next"
                    );
                    errors.push(format!("{}: timed out", provider.name()));
                }
            }
        }
        if self.providers.is_empty() {
            errors.push("no generation providers configured".to_string());
        }
        ChainOutcome::Exhausted { errors }
    }
}

/// Provider tag recorded when the extractive fallback produced the answer.
pub const EXTRACTIVE_PROVIDER: &str = "extractive";

/// Build an extractive answer from the single top-scored chunk: its file
/// name as a preface, then a bounded excerpt of its text.
pub fn extractive_answer(top: &FusedResult, preview_length: usize) -> String {
    let excerpt = truncate_chars(&top.chunk.content, preview_length);
    format!(
        "No generation provider was available. Most relevant excerpt from {}:\n\n{}",
        top.chunk.file_name, excerpt
    )
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}
