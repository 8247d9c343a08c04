// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test utilities for the Tally workspace.

pub mod mock_client;

pub use mock_client::{MockClient, anthropic_response, openai_response};
