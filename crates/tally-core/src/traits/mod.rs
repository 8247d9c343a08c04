// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits at the provider boundary.

pub mod client;
pub mod extractor;

pub use client::ProviderClient;
pub use extractor::UsageExtractor;
