//! Newline-delimited JSON framing.

use serde::Serialize;
use serde_json::Value;

use crate::types::{JsonRpcMessage, McpError, McpResult, RequestId};

/// Parse one line as a JSON-RPC message.
pub fn parse_message(line: &str) -> McpResult<JsonRpcMessage> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(McpError::ParseError("Empty message".to_string()));
    }

    let value: Value =
        serde_json::from_str(trimmed).map_err(|e| McpError::ParseError(e.to_string()))?;
    if !value.is_object() {
        return Err(McpError::InvalidRequest(
            "Message must be a JSON object".to_string(),
        ));
    }
    let has_id = value.get("id").is_some();
    let msg: JsonRpcMessage =
        serde_json::from_value(value).map_err(|e| McpError::InvalidRequest(e.to_string()))?;

    // An id that is not a string, number or null makes the request fall
    // through to the notification shape, which would go unanswered.
    if has_id && matches!(msg, JsonRpcMessage::Notification(_)) {
        return Err(McpError::InvalidRequest(
            "Request id must be a string, a number or null".to_string(),
        ));
    }
    Ok(msg)
}

/// Serialize to a single line with a trailing newline.
pub fn frame_message(value: &impl Serialize) -> McpResult<String> {
    let mut json = serde_json::to_string(value)?;
    json.push('\n');
    Ok(json)
}

/// The reply to a message that could not be decoded. The id is unknown, so it is null.
pub fn undecodable_reply(error: &McpError) -> Value {
    serde_json::to_value(error.to_json_rpc_error(RequestId::Null)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::error_codes;

    #[test]
    fn test_parse_error_kinds() {
        let err = parse_message("{not json").unwrap_err();
        assert_eq!(err.code(), error_codes::PARSE_ERROR);

        let err = parse_message("[1, 2]").unwrap_err();
        assert_eq!(err.code(), error_codes::INVALID_REQUEST);

        let err = parse_message("   ").unwrap_err();
        assert_eq!(err.code(), error_codes::PARSE_ERROR);
    }

    #[test]
    fn test_unusable_id_is_invalid_request() {
        let err = parse_message(r#"{"jsonrpc":"2.0","id":{"n":1},"method":"ping"}"#).unwrap_err();
        assert_eq!(err.code(), error_codes::INVALID_REQUEST);

        let err = parse_message(r#"{"jsonrpc":"2.0","id":true,"method":"ping"}"#).unwrap_err();
        assert_eq!(err.code(), error_codes::INVALID_REQUEST);

        let msg = parse_message(r#"{"jsonrpc":"2.0","id":1.5,"method":"ping"}"#).unwrap();
        assert!(msg.is_request());
    }

    #[test]
    fn test_undecodable_reply_has_null_id() {
        let reply = undecodable_reply(&McpError::ParseError("bad".to_string()));
        assert_eq!(reply["id"], Value::Null);
        assert_eq!(reply["error"]["code"], error_codes::PARSE_ERROR);
    }

    #[test]
    fn test_frame_is_single_line() {
        let framed = frame_message(&serde_json::json!({"a": "x\ny"})).unwrap();
        assert!(framed.ends_with('\n'));
        assert_eq!(framed.matches('\n').count(), 1);
    }
}
