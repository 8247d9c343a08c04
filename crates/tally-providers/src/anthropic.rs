// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage extraction for the Anthropic Messages API response shape.

use serde_json::Value;
use tally_core::{ExtractedUsage, TallyError, UsageExtractor};

use crate::extract::{string_field, token_field};

/// Reads `model`, `usage.input_tokens`, and `usage.output_tokens`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicExtractor;

impl UsageExtractor for AnthropicExtractor {
    fn provider(&self) -> &str {
        "anthropic"
    }

    fn extract(&self, raw: &Value) -> Result<ExtractedUsage, TallyError> {
        Ok(ExtractedUsage {
            model: string_field(raw, "model")?,
            prompt_tokens: token_field(raw, "usage", "input_tokens")?,
            completion_tokens: token_field(raw, "usage", "output_tokens")?,
        })
    }
}
