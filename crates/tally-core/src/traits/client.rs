// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The narrow capability a wrapped provider client must offer.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TallyError;

/// A call-generating provider method: takes a request, returns a response
/// with extractable usage fields.
///
/// This is the only shape requirement the tracking proxy imposes on a
/// client. Implementations own transport, authentication, retry, and
/// cancellation; the proxy never interprets the request or response beyond
/// handing the response to a [`crate::UsageExtractor`]. A synchronous
/// client implements `call` without awaiting anything.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Perform one provider call.
    ///
    /// Errors propagate through the proxy unmodified; a failed call is
    /// never recorded as usage and never cached.
    async fn call(&self, request: &Value) -> Result<Value, TallyError>;
}
