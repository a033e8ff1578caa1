// Credvault - JSON-RPC 2.0 Protocol Types
//
// Minimal JSON-RPC 2.0 envelope for the UDS gateway, plus the fixed
// application error codes credential failures map onto.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::credential::CredentialError;

/// A JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: Value,
}

/// A JSON-RPC 2.0 success/error response.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// Standard JSON-RPC 2.0 error codes
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// Application error codes
pub const INVALID_CREDENTIAL_TYPE: i32 = -32001;
pub const PERMISSION_DENIED: i32 = -32003;
pub const NOT_FOUND: i32 = -32004;
pub const PARTIAL_DELETE: i32 = -32005;

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create an error response.
    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
            id,
        }
    }

    /// Create a parse error response (id is null because we couldn't parse it).
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::error(Value::Null, PARSE_ERROR, message)
    }

    /// Map a credential failure onto its application error code.
    pub fn from_credential_error(id: Value, err: &CredentialError) -> Self {
        let code = match err {
            CredentialError::InvalidCredentialType(_) => INVALID_CREDENTIAL_TYPE,
            CredentialError::PermissionDenied(_) => PERMISSION_DENIED,
            CredentialError::InvalidArgument(_) => INVALID_PARAMS,
            CredentialError::NotFound(_) => NOT_FOUND,
            CredentialError::PartialDelete { .. } => PARTIAL_DELETE,
            CredentialError::Store(_) => INTERNAL_ERROR,
        };

        let mut response = Self::error(id, code, err.to_string());
        if let (CredentialError::PartialDelete { deleted, failed, .. }, Some(error)) =
            (err, response.error.as_mut())
        {
            error.data = Some(serde_json::json!({
                "deleted": deleted,
                "failed": failed,
                "cause": err.root_cause().to_string(),
            }));
        }
        response
    }
}

impl JsonRpcRequest {
    /// Validate that this is a proper JSON-RPC 2.0 request.
    pub fn validate(&self) -> Result<(), String> {
        if self.jsonrpc != "2.0" {
            return Err("jsonrpc must be \"2.0\"".to_string());
        }
        if self.method.is_empty() {
            return Err("method must not be empty".to_string());
        }
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
