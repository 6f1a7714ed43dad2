use crate::errors::{ToolError, ToolErrorKind};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// JSON-RPC 2.0 error codes the server emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(i32)]
pub enum ErrorCode {
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Protocol-level failure, rendered as the `error` member of a response.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct McpError {
    pub code: ErrorCode,
    pub message: String,
    pub data: Option<Value>,
}

impl McpError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let code = match err.kind {
            ToolErrorKind::InvalidParams | ToolErrorKind::NotFound => ErrorCode::InvalidParams,
            ToolErrorKind::Internal => ErrorCode::InternalError,
        };
        let message = match &err.hint {
            Some(hint) => format!("{}\nhint: {}", err.message, hint),
            None => err.message,
        };
        Self {
            code,
            message,
            data: err.details,
        }
    }
}
