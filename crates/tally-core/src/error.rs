// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tally usage tracker.

use thiserror::Error;

/// The primary error type used across all Tally crates.
#[derive(Debug, Error)]
pub enum TallyError {
    /// Configuration errors (invalid TOML, unknown keys, failed validation).
    #[error("configuration error: {0}")]
    Config(String),

    /// A model identifier has no entry in any pricing tier.
    ///
    /// Surfaced instead of pricing at zero, which would corrupt budget
    /// accounting.
    #[error("model '{model}' not found in pricing table; register it with PricingTable::register")]
    UnknownModel { model: String },

    /// A price registration carried a negative rate.
    #[error(
        "invalid price for model '{model}': input ${input_per_1k}/1k, output ${output_per_1k}/1k"
    )]
    InvalidPrice {
        model: String,
        input_per_1k: f64,
        output_per_1k: f64,
    },

    /// A provider response was missing usage fields or carried values that
    /// could not be read as non-negative integers.
    #[error("malformed provider response: {message}")]
    MalformedResponse { message: String },

    /// A budget guard's cost cap was crossed.
    #[error("budget exceeded: spent ${spent_usd:.6} against a ${limit_usd:.6} limit")]
    BudgetExceeded { spent_usd: f64, limit_usd: f64 },

    /// A budget guard's token cap was crossed.
    #[error("token limit reached: {used_tokens} tokens used against a {limit_tokens} token limit")]
    TokenLimitReached { used_tokens: u64, limit_tokens: u64 },

    /// Cache backend errors (file I/O, entry serialization).
    #[error("cache error: {source}")]
    Cache {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Errors raised by a wrapped provider client. The proxy propagates
    /// these untouched; nothing is recorded or cached for a failed call.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// HTTP transport errors during a remote pricing refresh.
    #[error("http error: {message}")]
    Http {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl TallyError {
    /// Shorthand for a [`TallyError::MalformedResponse`].
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Amount by which the cost cap was overshot, if this is a
    /// [`TallyError::BudgetExceeded`].
    pub fn overshoot_usd(&self) -> Option<f64> {
        match self {
            Self::BudgetExceeded {
                spent_usd,
                limit_usd,
            } => Some(spent_usd - limit_usd),
            _ => None,
        }
    }
}
