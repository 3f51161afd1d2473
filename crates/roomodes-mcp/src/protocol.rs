//! JSON-RPC 2.0 protocol types for the MCP transport.
//!
//! Self-contained implementation without external JSON-RPC libraries. An
//! inbound line classifies as a request (has an `id`) or a notification
//! (no `id`); every request gets exactly one response, notifications none.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use roomodes_core::ModeError;

/// JSON-RPC 2.0 version constant.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC request ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
    Null,
}

/// A classified inbound message.
#[derive(Debug, Clone)]
pub enum Incoming {
    Request {
        id: RequestId,
        method: String,
        params: Value,
    },
    Notification {
        method: String,
        params: Value,
    },
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
    pub id: RequestId,
}

impl Response {
    pub fn success(id: RequestId, result: Value) -> Self {
        Response {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: RequestId, error: ErrorObject) -> Self {
        Response {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    pub fn from_error(id: RequestId, err: RpcError) -> Self {
        Response::error(id, err.into())
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<RpcError> for ErrorObject {
    fn from(err: RpcError) -> Self {
        ErrorObject {
            code: err.code(),
            message: err.message(),
            data: err.data(),
        }
    }
}

/// Protocol-level errors with standard JSON-RPC codes plus the server's
/// application codes.
#[derive(Debug, Clone)]
pub enum RpcError {
    ParseError(Option<String>),
    InvalidRequest(Option<String>),
    MethodNotFound(String),
    InvalidParams(String),
    InternalError(String),
    ApplicationError {
        code: i32,
        message: String,
        data: Option<Value>,
    },
}

impl RpcError {
    pub fn code(&self) -> i32 {
        match self {
            RpcError::ParseError(_) => -32700,
            RpcError::InvalidRequest(_) => -32600,
            RpcError::MethodNotFound(_) => -32601,
            RpcError::InvalidParams(_) => -32602,
            RpcError::InternalError(_) => -32603,
            RpcError::ApplicationError { code, .. } => *code,
        }
    }

    pub fn message(&self) -> String {
        match self {
            RpcError::ParseError(Some(msg)) => format!("Parse error: {}", msg),
            RpcError::ParseError(None) => "Parse error".to_string(),
            RpcError::InvalidRequest(Some(msg)) => format!("Invalid Request: {}", msg),
            RpcError::InvalidRequest(None) => "Invalid Request".to_string(),
            RpcError::MethodNotFound(method) => format!("Method not found: {}", method),
            RpcError::InvalidParams(msg) => format!("Invalid params: {}", msg),
            RpcError::InternalError(msg) => format!("Internal error: {}", msg),
            RpcError::ApplicationError { message, .. } => message.clone(),
        }
    }

    pub fn data(&self) -> Option<Value> {
        match self {
            RpcError::ApplicationError { data, .. } => data.clone(),
            _ => None,
        }
    }
}

impl From<ModeError> for RpcError {
    fn from(err: ModeError) -> Self {
        RpcError::ApplicationError {
            code: err.code(),
            message: err.to_string(),
            data: err.data(),
        }
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for RpcError {}

/// Classify one line of input as a request or a notification.
pub fn parse_incoming(text: &str) -> Result<Incoming, RpcError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| RpcError::ParseError(Some(e.to_string())))?;

    let obj = match value {
        Value::Object(obj) => obj,
        _ => {
            return Err(RpcError::InvalidRequest(Some(
                "message must be a JSON object".to_string(),
            )))
        }
    };

    match obj.get("jsonrpc").and_then(|v| v.as_str()) {
        Some(JSONRPC_VERSION) => {}
        Some(other) => {
            return Err(RpcError::InvalidRequest(Some(format!(
                "expected jsonrpc version '{}', got '{}'",
                JSONRPC_VERSION, other
            ))))
        }
        None => {
            return Err(RpcError::InvalidRequest(Some(
                "missing 'jsonrpc' field".to_string(),
            )))
        }
    }

    let method = match obj.get("method") {
        Some(Value::String(method)) => method.clone(),
        Some(_) => {
            return Err(RpcError::InvalidRequest(Some(
                "'method' must be a string".to_string(),
            )))
        }
        None => {
            return Err(RpcError::InvalidRequest(Some(
                "missing 'method' field".to_string(),
            )))
        }
    };

    let params = obj.get("params").cloned().unwrap_or(Value::Null);

    match obj.get("id") {
        None => Ok(Incoming::Notification { method, params }),
        Some(id) => {
            let id: RequestId = serde_json::from_value(id.clone())
                .map_err(|_| RpcError::InvalidRequest(Some("invalid 'id' field".to_string())))?;
            Ok(Incoming::Request { id, method, params })
        }
    }
}

/// Serialize a response to a single-line JSON string.
pub fn serialize_response(response: &Response) -> Result<String, RpcError> {
    serde_json::to_string(response).map_err(|e| RpcError::InternalError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request() {
        let incoming = parse_incoming(r#"{"jsonrpc":"2.0","method":"tools/list","id":1}"#).unwrap();
        match incoming {
            Incoming::Request { id, method, .. } => {
                assert_eq!(id, RequestId::Number(1));
                assert_eq!(method, "tools/list");
            }
            _ => panic!("expected request"),
        }
    }

    #[test]
    fn test_parse_notification() {
        let incoming =
            parse_incoming(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        match incoming {
            Incoming::Notification { method, .. } => {
                assert_eq!(method, "notifications/initialized");
            }
            _ => panic!("expected notification"),
        }
    }

    #[test]
    fn test_parse_string_id() {
        let incoming =
            parse_incoming(r#"{"jsonrpc":"2.0","method":"ping","id":"abc"}"#).unwrap();
        match incoming {
            Incoming::Request { id, .. } => assert_eq!(id, RequestId::String("abc".to_string())),
            _ => panic!("expected request"),
        }
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = parse_incoming("{not json").unwrap_err();
        assert_eq!(err.code(), -32700);
    }

    #[test]
    fn test_non_object_is_invalid_request() {
        let err = parse_incoming("[1,2,3]").unwrap_err();
        assert_eq!(err.code(), -32600);
    }

    #[test]
    fn test_wrong_version_is_invalid_request() {
        let err = parse_incoming(r#"{"jsonrpc":"1.0","method":"x","id":1}"#).unwrap_err();
        assert_eq!(err.code(), -32600);
    }

    #[test]
    fn test_missing_method_is_invalid_request() {
        let err = parse_incoming(r#"{"jsonrpc":"2.0","id":1}"#).unwrap_err();
        assert_eq!(err.code(), -32600);
    }

    #[test]
    fn test_response_success_serialization() {
        let resp = Response::success(RequestId::Number(1), serde_json::json!({"ok": true}));
        let json = serialize_response(&resp).unwrap();
        assert!(json.contains("\"result\""));
        assert!(!json.contains("\"error\""));
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_response_error_serialization() {
        let resp = Response::from_error(
            RequestId::Null,
            RpcError::MethodNotFound("bogus".to_string()),
        );
        let json = serialize_response(&resp).unwrap();
        assert!(json.contains("-32601"));
        assert!(json.contains("\"id\":null"));
    }

    #[test]
    fn test_mode_error_mapping() {
        let err: RpcError = ModeError::ModeNotFound("zap".to_string()).into();
        assert_eq!(err.code(), -32001);
        assert!(err.message().contains("zap"));

        let err: RpcError = ModeError::FileRestriction {
            tool: "write_to_file".into(),
            mode_slug: "architect".into(),
            path: "main.py".into(),
            pattern: "\\.md$".into(),
        }
        .into();
        assert_eq!(err.code(), -32006);
        let data = err.data().unwrap();
        assert_eq!(data["path"], "main.py");
    }
}
