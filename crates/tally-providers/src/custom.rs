// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fully caller-configurable usage extraction.
//!
//! Supports providers without a built-in extractor: the caller supplies
//! three extraction functions and a provider name, and the core never needs
//! to know the response shape.

use serde_json::Value;
use tally_core::{ExtractedUsage, TallyError, UsageExtractor};

type ModelFn = dyn Fn(&Value) -> Result<String, TallyError> + Send + Sync;
type TokenFn = dyn Fn(&Value) -> Result<u64, TallyError> + Send + Sync;

/// Extractor built from caller-supplied functions.
///
/// ```
/// use serde_json::Value;
/// use tally_core::TallyError;
/// use tally_providers::CustomExtractor;
///
/// let extractor = CustomExtractor::new(
///     "my-llm-service",
///     |raw: &Value| {
///         raw["model"].as_str().map(String::from).ok_or_else(|| {
///             TallyError::malformed("missing model")
///         })
///     },
///     |raw| raw["tokens"]["in"].as_u64().ok_or_else(|| TallyError::malformed("missing tokens.in")),
///     |raw| raw["tokens"]["out"].as_u64().ok_or_else(|| TallyError::malformed("missing tokens.out")),
/// );
/// ```
pub struct CustomExtractor {
    provider: String,
    model_fn: Box<ModelFn>,
    prompt_fn: Box<TokenFn>,
    completion_fn: Box<TokenFn>,
}

impl CustomExtractor {
    pub fn new(
        provider: impl Into<String>,
        model_fn: impl Fn(&Value) -> Result<String, TallyError> + Send + Sync + 'static,
        prompt_fn: impl Fn(&Value) -> Result<u64, TallyError> + Send + Sync + 'static,
        completion_fn: impl Fn(&Value) -> Result<u64, TallyError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            provider: provider.into(),
            model_fn: Box::new(model_fn),
            prompt_fn: Box::new(prompt_fn),
            completion_fn: Box::new(completion_fn),
        }
    }
}

impl UsageExtractor for CustomExtractor {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn extract(&self, raw: &Value) -> Result<ExtractedUsage, TallyError> {
        Ok(ExtractedUsage {
            model: (self.model_fn)(raw)?,
            prompt_tokens: (self.prompt_fn)(raw)?,
            completion_tokens: (self.completion_fn)(raw)?,
        })
    }
}
