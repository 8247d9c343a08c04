// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage extraction for the OpenAI chat-completion response shape.

use serde_json::Value;
use tally_core::{ExtractedUsage, TallyError, UsageExtractor};

use crate::extract::{string_field, token_field};

/// Reads `model`, `usage.prompt_tokens`, and `usage.completion_tokens`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiExtractor;

impl UsageExtractor for OpenAiExtractor {
    fn provider(&self) -> &str {
        "openai"
    }

    fn extract(&self, raw: &Value) -> Result<ExtractedUsage, TallyError> {
        Ok(ExtractedUsage {
            model: string_field(raw, "model")?,
            prompt_tokens: token_field(raw, "usage", "prompt_tokens")?,
            completion_tokens: token_field(raw, "usage", "completion_tokens")?,
        })
    }
}
