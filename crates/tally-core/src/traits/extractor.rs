// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage extraction strategy for raw provider responses.

use serde_json::Value;

use crate::error::TallyError;
use crate::types::ExtractedUsage;

/// Translates a raw provider response into normalized usage fields.
///
/// One implementation exists per supported provider response shape, plus a
/// fully caller-configurable variant for providers without a built-in one.
pub trait UsageExtractor: Send + Sync {
    /// Provider name used for ledger attribution (e.g. "anthropic").
    fn provider(&self) -> &str;

    /// Extract `(model, prompt_tokens, completion_tokens)` from a raw
    /// response.
    ///
    /// Fails with [`TallyError::MalformedResponse`] if a required field is
    /// absent or cannot be read as a non-negative integer.
    fn extract(&self, raw: &Value) -> Result<ExtractedUsage, TallyError>;
}
