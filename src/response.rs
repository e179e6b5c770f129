//! Uniform tool response envelope.
//!
//! Every tool answers with a JSON text payload carrying an explicit
//! `success` flag, a `result` on success or an `error` message on failure,
//! and an optional human-readable `message`. Failures still come back as a
//! structured payload (with the protocol `isError` flag set) so one bad
//! query never takes down the server.

use rmcp::model::{CallToolResult, Content};
use rmcp::ErrorData as McpError;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct ToolEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ToolEnvelope {
    pub fn success(result: impl Serialize, message: impl Into<Option<String>>) -> Result<Self, McpError> {
        let result = serde_json::to_value(result)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(Self {
            success: true,
            result: Some(result),
            error: None,
            message: message.into(),
        })
    }

    pub fn failure(error: impl Into<String>, message: impl Into<Option<String>>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            message: message.into(),
        }
    }

    pub fn into_call_tool_result(self) -> Result<CallToolResult, McpError> {
        let json = serde_json::to_string(&self)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        let content = vec![Content::text(json)];
        Ok(if self.success {
            CallToolResult::success(content)
        } else {
            CallToolResult::error(content)
        })
    }
}

/// Successful tool response with a result payload.
pub fn envelope_success(
    result: impl Serialize,
    message: impl Into<Option<String>>,
) -> Result<CallToolResult, McpError> {
    ToolEnvelope::success(result, message)?.into_call_tool_result()
}

/// Failed tool response; `error` carries the caller-safe message only.
pub fn envelope_failure(
    error: impl Into<String>,
    message: impl Into<Option<String>>,
) -> Result<CallToolResult, McpError> {
    ToolEnvelope::failure(error, message).into_call_tool_result()
}
