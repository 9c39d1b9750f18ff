//! Conversion between rmcp's wire types and the plain text reply this core
//! cares about.
//!
//! The core consumes only the first text content block of a
//! `tools/call` reply, and a plugin can report failure two ways: a
//! JSON-RPC `error` object (handled by `rmcp` itself, surfacing as an
//! `McpError` from the call), or a successful reply whose text is JSON
//! shaped `{"data": ..., "error": ...}`. Both must produce identical
//! user-visible output.

use rmcp::model::{CallToolResult, RawContent};

use crate::mcp::error::McpError;
use crate::models::PluginDataError;

/// Extracts the plugin's reply body from a `tools/call` result, handling
/// both error shapes uniformly.
///
/// Returns `Ok(text)` for a normal reply, or `Err(McpError::Application)`
/// when either `result.is_error` is set or the first text block parses as
/// `{data, error}` with a non-empty `error`.
pub fn extract_reply(plugin: &str, result: CallToolResult) -> Result<String, McpError> {
    let first_text = first_text_block(&result).ok_or_else(|| McpError::MalformedResponse {
        plugin: plugin.to_string(),
    })?;

    if result.is_error.unwrap_or(false) {
        return Err(McpError::Application(first_text));
    }

    if let Ok(shaped) = serde_json::from_str::<PluginDataError>(&first_text) {
        if let Some(error) = shaped.error.filter(|e| !e.is_empty()) {
            return Err(McpError::Application(error));
        }
        if let Some(data) = shaped.data {
            return Ok(data);
        }
    }

    Ok(first_text)
}

fn first_text_block(result: &CallToolResult) -> Option<String> {
    result.content.iter().find_map(|content| match &**content {
        RawContent::Text(text) => Some(text.text.clone()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use rmcp::model::{CallToolResult, Content};

    use super::*;

    fn result_with_text(text: &str, is_error: bool) -> CallToolResult {
        CallToolResult {
            content: vec![Content::text(text.to_string())],
            structured_content: None,
            is_error: Some(is_error),
            meta: None,
        }
    }

    #[test]
    fn plain_text_reply_passes_through() {
        let result = result_with_text("hello world", false);
        assert_eq!(extract_reply("echo", result).unwrap(), "hello world");
    }

    #[test]
    fn jsonrpc_error_flag_surfaces_as_application_error() {
        let result = result_with_text("boom", true);
        let err = extract_reply("echo", result).unwrap_err();
        assert!(matches!(err, McpError::Application(msg) if msg == "boom"));
    }

    #[test]
    fn data_error_shape_with_error_surfaces_verbatim() {
        let result = result_with_text(r#"{"data": null, "error": "bad input"}"#, false);
        let err = extract_reply("echo", result).unwrap_err();
        assert!(matches!(err, McpError::Application(msg) if msg == "bad input"));
    }

    #[test]
    fn data_error_shape_with_empty_error_uses_data() {
        let result = result_with_text(r#"{"data": "ok", "error": ""}"#, false);
        assert_eq!(extract_reply("echo", result).unwrap(), "ok");
    }

    #[test]
    fn no_content_blocks_is_malformed() {
        let result = CallToolResult {
            content: vec![],
            structured_content: None,
            is_error: Some(false),
            meta: None,
        };
        let err = extract_reply("echo", result).unwrap_err();
        assert!(matches!(err, McpError::MalformedResponse { .. }));
    }
}
