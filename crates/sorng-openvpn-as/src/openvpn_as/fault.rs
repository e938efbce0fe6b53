//! XML-RPC fault translation.
//!
//! The Access Server reports every failure as a numeric fault code plus a
//! free-text string. [`translate_fault`] maps those onto
//! [`AccessServerError`] without raising anything itself, so the caller
//! decides where the error surfaces.

use crate::openvpn_as::error::AccessServerError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const FAULT_PARAMETER: i32 = 8002;
pub const FAULT_AUTH: i32 = 9007;
pub const FAULT_RELAY: i32 = 9000;

const VALUE_ERROR_PREFIX: &str = "XMLRPCRelay: exceptions.ValueError: ";
const INTERNAL_ERROR: &str = "XMLRPC: internal error";
const FUNCTION_NOT_FOUND: &str = "XMLRPCRelay: XMLRPC: function not found";

/// A structured XML-RPC fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    pub code: i32,
    pub message: String,
}

impl Fault {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Fault {}: '{}'>", self.code, self.message)
    }
}

/// What a `sacli` call can fail with before translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    Fault(Fault),
    /// Connection, TLS, decoding or any other non-fault failure.
    Transport(String),
}

impl From<Fault> for RpcError {
    fn from(f: Fault) -> Self {
        RpcError::Fault(f)
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fault(fault) => write!(f, "{}", fault),
            Self::Transport(msg) => write!(f, "transport: {}", msg),
        }
    }
}

impl std::error::Error for RpcError {}

pub type RpcResult<T> = Result<T, RpcError>;

/// Translate a raw `sacli` failure into a typed error.
///
/// First match wins; anything unmapped becomes
/// [`AccessServerError::Unexpected`] carrying the code and message verbatim.
/// Non-fault failures pass through as [`AccessServerError::Transport`].
pub fn translate_fault(err: RpcError) -> AccessServerError {
    let fault = match err {
        RpcError::Fault(fault) => fault,
        RpcError::Transport(msg) => return AccessServerError::Transport(msg),
    };

    match fault.code {
        FAULT_PARAMETER => AccessServerError::Parameter,
        FAULT_AUTH => AccessServerError::Auth,
        FAULT_RELAY => {
            if let Some(detail) = fault.message.strip_prefix(VALUE_ERROR_PREFIX) {
                AccessServerError::Value(detail.to_string())
            } else if fault.message == INTERNAL_ERROR {
                AccessServerError::Internal
            } else if fault.message == FUNCTION_NOT_FOUND {
                AccessServerError::FunctionNotFound
            } else {
                unexpected(fault)
            }
        }
        _ => unexpected(fault),
    }
}

fn unexpected(fault: Fault) -> AccessServerError {
    AccessServerError::Unexpected {
        code: fault.code,
        message: fault.message,
    }
}

impl From<RpcError> for AccessServerError {
    fn from(e: RpcError) -> Self {
        translate_fault(e)
    }
}
