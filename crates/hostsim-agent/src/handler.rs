//! Request handler for hostsim-agent.
//!
//! Routes JSON-RPC requests to the emulated platform calls.

use crate::protocol::{
    error_codes, CloneConfigParams, Request, Response, WriteUint64Params, WriteUint64Result,
};
use hostsim_core::winrm::{try_write_uint64_le, UINT64_LEN};
use hostsim_core::{clone_config, create_backup, EmulatorError, Uint64Value};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, trace, warn};

/// Largest buffer `write_uint64_le` will allocate for a caller.
const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Handle a JSON-RPC request and return a response.
///
/// Supported methods:
/// - `ping` - Health check, returns `{pong: true}`.
/// - `clone_config` - Merge overrides onto a copy of a config template.
/// - `create_backup` - Validate a configuration backup payload.
/// - `write_uint64_le` - Encode a 64-bit value little-endian into a buffer.
pub fn handle_request(req: Request) -> Response {
    debug!(method = %req.method, id = req.id, "handling request");
    trace!(params = ?req.params, "request params");

    let response = match req.method.as_str() {
        "ping" => {
            debug!(id = req.id, "ping request");
            Response::success(req.id, json!({"pong": true}))
        }

        "clone_config" => handle_clone_config(req.id, req.params),

        "create_backup" => handle_create_backup(req.id, req.params),

        "write_uint64_le" => handle_write_uint64_le(req.id, req.params),

        _ => {
            warn!(method = %req.method, "unknown method");
            Response::error(
                req.id,
                error_codes::METHOD_NOT_FOUND,
                format!("method not found: {}", req.method),
            )
        }
    };

    if response.error.is_some() {
        debug!(id = req.id, error = ?response.error, "request failed");
    } else {
        debug!(id = req.id, "request succeeded");
        trace!(result = ?response.result, "response result");
    }

    response
}

/// Handle the `clone_config` method.
fn handle_clone_config(id: u64, params: Value) -> Response {
    let p: CloneConfigParams = match parse_params(id, "clone_config", params) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    debug!(id = id, overrides = p.overrides.len(), "handling clone_config");
    match clone_config(p.overrides, &p.base) {
        Ok(merged) => Response::success(id, merged),
        Err(e) => emulator_error(id, e),
    }
}

/// Handle the `create_backup` method.
///
/// The params object is the backup payload itself.
fn handle_create_backup(id: u64, params: Value) -> Response {
    debug!(id = id, "handling create_backup");
    let backup = match create_backup(Some(&params)) {
        Ok(backup) => backup,
        Err(e) => return emulator_error(id, e),
    };
    match serde_json::to_value(&backup) {
        Ok(v) => Response::success(id, v),
        Err(e) => Response::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
    }
}

/// Handle the `write_uint64_le` method.
fn handle_write_uint64_le(id: u64, params: Value) -> Response {
    let p: WriteUint64Params = match parse_params(id, "write_uint64_le", params) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let value = match &p.value {
        Value::Number(n) => match n.as_u64() {
            Some(v) => Uint64Value::from(v),
            None => {
                return Response::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("value must be a non-negative integer: {n}"),
                )
            }
        },
        Value::String(s) => match Uint64Value::parse_decimal(s) {
            Ok(v) => v,
            Err(e) => return emulator_error(id, e),
        },
        other => {
            return Response::error(
                id,
                error_codes::INVALID_PARAMS,
                format!("value must be a number or decimal string, got {other}"),
            )
        }
    };

    let size = p
        .size
        .unwrap_or_else(|| p.offset.saturating_add(UINT64_LEN));
    if size > MAX_FRAME_SIZE {
        return Response::error(
            id,
            error_codes::INVALID_PARAMS,
            format!("buffer size {size} exceeds limit of {MAX_FRAME_SIZE} bytes"),
        );
    }

    debug!(id = id, value = %value, offset = p.offset, size, "handling write_uint64_le");
    let mut bytes = vec![0u8; size];
    let next_offset = match try_write_uint64_le(&mut bytes, value, p.offset) {
        Ok(next) => next,
        Err(e) => return emulator_error(id, e),
    };

    match serde_json::to_value(WriteUint64Result { bytes, next_offset }) {
        Ok(v) => Response::success(id, v),
        Err(e) => Response::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
    }
}

fn parse_params<T: DeserializeOwned>(id: u64, method: &str, params: Value) -> Result<T, Response> {
    serde_json::from_value(params).map_err(|e| {
        warn!(id = id, method = %method, error = %e, "invalid params");
        Response::error(
            id,
            error_codes::INVALID_PARAMS,
            format!("invalid params: {}", e),
        )
    })
}

/// Map a platform error onto a JSON-RPC error response.
fn emulator_error(id: u64, e: EmulatorError) -> Response {
    let code = match &e {
        EmulatorError::InvalidArgument(_) => error_codes::INVALID_ARGUMENT,
        EmulatorError::SizeExceeded { .. } => error_codes::SIZE_EXCEEDED,
        EmulatorError::BufferTooSmall { .. } => error_codes::BUFFER_TOO_SMALL,
        EmulatorError::AlreadyReported(_) | EmulatorError::Json(_) => error_codes::INTERNAL_ERROR,
    };
    Response::error(id, code, e.to_string())
}
