//! Conversion utilities between JSON arguments, domain types and MCP results.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::block::BlockType;
use crate::error::{McpError, Result};

/// Wrap a serializable value as a text `tools/call` result.
pub fn text_result<T: Serialize>(value: &T) -> Result<JsonValue> {
    let text = serde_json::to_string_pretty(value)?;
    Ok(serde_json::json!({
        "content": [{ "type": "text", "text": text }]
    }))
}

/// A `tools/call` result reporting a tool-level failure.
pub fn error_result(message: &str) -> JsonValue {
    serde_json::json!({
        "content": [{ "type": "text", "text": message }],
        "isError": true
    })
}

/// Helper to get a required string argument from JSON arguments.
pub fn get_string_arg(args: &Map<String, JsonValue>, name: &str) -> Result<String> {
    get_optional_string(args, name)?.ok_or_else(|| McpError::MissingArg(name.to_string()))
}

/// Helper to get an optional string argument.
///
/// Present-but-not-a-string is an error rather than silently ignored.
pub fn get_optional_string(args: &Map<String, JsonValue>, name: &str) -> Result<Option<String>> {
    match args.get(name) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(McpError::InvalidArg {
            name: name.to_string(),
            reason: "Expected a string".to_string(),
        }),
    }
}

/// Helper to get an optional non-negative integer argument.
///
/// Integral floats such as `10.0` are accepted since schemas declare `number`.
pub fn get_optional_u64(args: &Map<String, JsonValue>, name: &str) -> Result<Option<u64>> {
    let Some(value) = args.get(name) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    if let Some(n) = value.as_u64() {
        return Ok(Some(n));
    }
    match value.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(Some(f as u64)),
        _ => Err(McpError::InvalidArg {
            name: name.to_string(),
            reason: "Expected a non-negative integer".to_string(),
        }),
    }
}

/// Helper to get an optional block type filter.
pub fn get_optional_block_type(
    args: &Map<String, JsonValue>,
    name: &str,
) -> Result<Option<BlockType>> {
    get_optional_string(args, name)?
        .map(|s| {
            s.parse::<BlockType>().map_err(|reason| McpError::InvalidArg {
                name: name.to_string(),
                reason,
            })
        })
        .transpose()
}
