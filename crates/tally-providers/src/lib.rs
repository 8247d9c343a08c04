// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider usage extractors and the tracking client proxy.
//!
//! Wrap any [`tally_core::ProviderClient`] in a [`TrackedClient`] and call
//! through it exactly as you would the raw client: usage is extracted,
//! priced, recorded into the shared ledger, optionally cached, and checked
//! against active budget guards.

pub mod anthropic;
pub mod custom;
mod extract;
pub mod openai;
pub mod proxy;
pub mod setup;

pub use anthropic::AnthropicExtractor;
pub use custom::CustomExtractor;
pub use openai::OpenAiExtractor;
pub use proxy::TrackedClient;
pub use setup::{cache_from_config, limits_from_config, register_configured_models};
