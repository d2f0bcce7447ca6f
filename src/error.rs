//! Error types for the MCP server.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for MCP operations.
pub type Result<T> = std::result::Result<T, McpError>;

/// JSON-RPC error code: the line was JSON but not a request object.
pub const INVALID_REQUEST: i32 = -32600;
/// JSON-RPC error code: unknown method or tool.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// JSON-RPC error code: missing or malformed parameters.
pub const INVALID_PARAMS: i32 = -32602;
/// JSON-RPC error code: unexpected server-side failure.
pub const INTERNAL_ERROR: i32 = -32603;
/// Server-defined code for requests arriving before `initialize`.
pub const NOT_INITIALIZED: i32 = -32000;
/// Server-defined code for a lookup miss that escapes to the transport.
pub const NOT_FOUND: i32 = -32001;
/// MCP code for an unknown resource URI.
pub const RESOURCE_NOT_FOUND: i32 = -32002;

/// Errors that can occur while serving MCP requests.
#[derive(Debug, Error)]
pub enum McpError {
    /// The request method is not in the method table.
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// The tool name is not in the catalog.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A required tool argument is missing.
    #[error("Missing required argument: {0}")]
    MissingArg(String),

    /// A tool argument is present but unusable.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArg {
        /// Argument name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Method params are missing or malformed.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// The line parsed as JSON but is not a JSON-RPC request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Strict lifecycle is on and `initialize` has not completed.
    #[error("Server not initialized")]
    NotInitialized,

    /// No block with this id exists in the document.
    #[error("Section not found: {0}")]
    SectionNotFound(String),

    /// No resource is addressable under this URI.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Document construction failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Reading the document source or the request stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing or deserializing JSON failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// The JSON-RPC error code reported for this error.
    pub fn code(&self) -> i32 {
        match self {
            McpError::MethodNotFound(_) | McpError::UnknownTool(_) => METHOD_NOT_FOUND,
            McpError::MissingArg(_) | McpError::InvalidArg { .. } | McpError::InvalidParams(_) => {
                INVALID_PARAMS
            }
            McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::NotInitialized => NOT_INITIALIZED,
            McpError::SectionNotFound(_) => NOT_FOUND,
            McpError::ResourceNotFound(_) => RESOURCE_NOT_FOUND,
            McpError::Store(StoreError::NotFound(_)) => NOT_FOUND,
            McpError::Store(_) | McpError::Io(_) | McpError::Json(_) | McpError::Internal(_) => {
                INTERNAL_ERROR
            }
        }
    }

    /// Whether this error belongs inside a successful `tools/call` result
    /// (`isError: true`) rather than in a JSON-RPC error object.
    pub fn is_tool_result(&self) -> bool {
        matches!(
            self,
            McpError::SectionNotFound(_) | McpError::Store(StoreError::NotFound(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_errors_map_to_stable_codes() {
        assert_eq!(McpError::MethodNotFound("x".into()).code(), -32601);
        assert_eq!(McpError::UnknownTool("x".into()).code(), -32601);
        assert_eq!(McpError::MissingArg("query".into()).code(), -32602);
        assert_eq!(
            McpError::InvalidArg {
                name: "limit".into(),
                reason: "Expected a non-negative integer".into()
            }
            .code(),
            -32602
        );
        assert_eq!(McpError::InvalidRequest("x".into()).code(), -32600);
        assert_eq!(McpError::Internal("x".into()).code(), -32603);
    }

    #[test]
    fn lookup_misses_are_tool_results() {
        assert!(McpError::SectionNotFound("b1".into()).is_tool_result());
        assert!(McpError::Store(StoreError::NotFound("b1".into())).is_tool_result());
        assert!(!McpError::MissingArg("sectionId".into()).is_tool_result());
        assert!(!McpError::Store(StoreError::Frozen).is_tool_result());
    }

    #[test]
    fn missing_arg_message_names_the_argument() {
        let err = McpError::MissingArg("sectionId".into());
        assert_eq!(err.to_string(), "Missing required argument: sectionId");
    }
}
