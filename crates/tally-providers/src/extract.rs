// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field helpers shared by the built-in extractors.

use serde_json::Value;
use tally_core::TallyError;

/// Read a top-level string field.
pub(crate) fn string_field(raw: &Value, field: &str) -> Result<String, TallyError> {
    raw.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| TallyError::malformed(format!("missing or non-string field '{field}'")))
}

/// Read a token count from a nested object.
///
/// Rejects anything that is not a non-negative integer (negative numbers
/// and floats read as absent).
pub(crate) fn token_field(raw: &Value, object: &str, field: &str) -> Result<u64, TallyError> {
    let nested = raw
        .get(object)
        .ok_or_else(|| TallyError::malformed(format!("missing '{object}' object")))?;
    nested.get(field).and_then(Value::as_u64).ok_or_else(|| {
        TallyError::malformed(format!(
            "missing or invalid token count '{object}.{field}'"
        ))
    })
}
