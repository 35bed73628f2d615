//! JSON-RPC 2.0 protocol types for hostsim-agent.
//!
//! Implements the JSON-RPC 2.0 specification for driver-to-host calls.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON-RPC 2.0 error codes.
pub mod error_codes {
    /// Parse error - Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid Request - The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found - The method does not exist / is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params - Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error - Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;

    /// Platform rejected a missing or wrong-typed argument.
    pub const INVALID_ARGUMENT: i32 = -32001;
    /// Platform rejected an oversized payload.
    pub const SIZE_EXCEEDED: i32 = -32002;
    /// Encoding target buffer is too small.
    pub const BUFFER_TOO_SMALL: i32 = -32003;
}

/// JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
pub struct Request {
    /// Protocol version, must be "2.0".
    #[allow(dead_code)]
    pub jsonrpc: String,
    /// Request identifier.
    pub id: u64,
    /// Method name to invoke.
    pub method: String,
    /// Method parameters (can be object or array).
    #[serde(default)]
    pub params: Value,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub struct Response {
    /// Protocol version, always "2.0".
    pub jsonrpc: String,
    /// Request identifier (matches request).
    pub id: u64,
    /// Result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    /// Create a success response.
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: u64, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct RpcError {
    /// Error code.
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
    /// Additional error data (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Parameters for the `clone_config` method.
#[derive(Debug, Deserialize)]
pub struct CloneConfigParams {
    /// Template to copy.
    pub base: Value,
    /// Top-level keys to replace on the copy.
    #[serde(default)]
    pub overrides: Map<String, Value>,
}

/// Parameters for the `write_uint64_le` method.
#[derive(Debug, Deserialize)]
pub struct WriteUint64Params {
    /// Unsigned integer as a JSON number or decimal string.
    pub value: Value,
    /// Byte offset to write at (default: 0).
    #[serde(default)]
    pub offset: usize,
    /// Total buffer size (default: offset + 8).
    pub size: Option<usize>,
}

/// Result of the `write_uint64_le` method.
#[derive(Debug, Serialize)]
pub struct WriteUint64Result {
    /// Full buffer contents after the write.
    pub bytes: Vec<u8>,
    /// Offset just past the written field.
    pub next_offset: usize,
}
