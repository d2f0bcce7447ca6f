//! Tool registry and dispatch.
//!
//! Exposes the document query tools: `search_content`, `get_section` and
//! `list_headings`.

pub mod document;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{McpError, Result};
use crate::session::DocumentSession;

/// A tool definition for the MCP tools/list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    /// Tool name (e.g., "search_content")
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonValue,
}

impl ToolDef {
    /// Create a new tool definition.
    pub fn new(name: &str, description: &str, input_schema: JsonValue) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }

    /// Names listed in the schema's `required` array.
    pub fn required_args(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }

    /// Fail with `MissingArg` for the first required argument not supplied.
    pub fn check_required(&self, args: &Map<String, JsonValue>) -> Result<()> {
        match self
            .required_args()
            .into_iter()
            .find(|name| args.get(*name).map_or(true, JsonValue::is_null))
        {
            Some(missing) => Err(McpError::MissingArg(missing.to_string())),
            None => Ok(()),
        }
    }
}

/// Registry of available MCP tools.
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    /// Create the tool registry with the document tools.
    pub fn new() -> Self {
        Self {
            tools: document::tools(),
        }
    }

    /// Get all tool definitions.
    pub fn tools(&self) -> &[ToolDef] {
        &self.tools
    }

    /// Find a tool definition by name.
    pub fn get(&self, name: &str) -> Option<&ToolDef> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Validate required arguments, then dispatch to the tool's handler.
    pub fn dispatch(
        &self,
        session: &DocumentSession,
        name: &str,
        args: Map<String, JsonValue>,
    ) -> Result<JsonValue> {
        let tool = self
            .get(name)
            .ok_or_else(|| McpError::UnknownTool(name.to_string()))?;
        tool.check_required(&args)?;
        document::dispatch(session, name, args)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper macro for creating JSON Schema for tool input parameters.
///
/// Each property is `"name": type "description"`; optional properties may add
/// `= default`.
#[macro_export]
macro_rules! schema {
    // Object with required and optional properties
    (object {
        required: { $($req_name:literal : $req_type:tt $req_desc:literal),* $(,)? },
        optional: { $($opt_name:literal : $opt_type:tt $opt_desc:literal $(= $opt_default:expr)?),* $(,)? }
    }) => {{
        let mut required: Vec<&str> = Vec::new();
        $(required.push($req_name);)*

        let mut props = serde_json::Map::new();
        $(props.insert($req_name.to_string(), $crate::schema!(@prop $req_type, $req_desc));)*
        $(props.insert($opt_name.to_string(), $crate::schema!(@prop $opt_type, $opt_desc $(, $opt_default)?));)*

        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": required
        })
    }};

    // Object with only required properties
    (object {
        required: { $($req_name:literal : $req_type:tt $req_desc:literal),* $(,)? }
    }) => {{
        let mut required: Vec<&str> = Vec::new();
        $(required.push($req_name);)*

        let mut props = serde_json::Map::new();
        $(props.insert($req_name.to_string(), $crate::schema!(@prop $req_type, $req_desc));)*

        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": required
        })
    }};

    // Object with only optional properties
    (object {
        optional: { $($opt_name:literal : $opt_type:tt $opt_desc:literal $(= $opt_default:expr)?),* $(,)? }
    }) => {{
        let mut props = serde_json::Map::new();
        $(props.insert($opt_name.to_string(), $crate::schema!(@prop $opt_type, $opt_desc $(, $opt_default)?));)*

        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": []
        })
    }};

    // Property with description, optionally a default
    (@prop $type:tt, $desc:literal) => {{
        let mut prop = $crate::schema!(@type $type);
        prop["description"] = serde_json::json!($desc);
        prop
    }};
    (@prop $type:tt, $desc:literal, $default:expr) => {{
        let mut prop = $crate::schema!(@prop $type, $desc);
        prop["default"] = serde_json::json!($default);
        prop
    }};

    // Type mappings
    (@type string) => { serde_json::json!({"type": "string"}) };
    (@type number) => { serde_json::json!({"type": "number"}) };
    (@type integer) => { serde_json::json!({"type": "integer"}) };
    (@type boolean) => { serde_json::json!({"type": "boolean"}) };
    (@type block_type) => {
        serde_json::json!({"type": "string", "enum": ["heading", "paragraph", "table", "figure"]})
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn schema_macro_builds_required_and_defaults() {
        let s = schema!(object {
            required: { "query": string "Search text" },
            optional: { "limit": number "Max results" = 10 }
        });
        assert_eq!(s["required"], json!(["query"]));
        assert_eq!(s["properties"]["query"]["type"], "string");
        assert_eq!(s["properties"]["query"]["description"], "Search text");
        assert_eq!(s["properties"]["limit"]["default"], 10);
        assert!(s["properties"]["query"].get("default").is_none());
    }

    #[test]
    fn schema_macro_optional_only_has_empty_required() {
        let s = schema!(object {
            optional: { "maxLevel": number "Depth" = 3 }
        });
        assert_eq!(s["required"], json!([]));
    }

    #[test]
    fn check_required_reports_missing_argument() {
        let registry = ToolRegistry::new();
        let tool = registry.get("get_section").unwrap();
        assert_eq!(tool.required_args(), vec!["sectionId"]);

        let args = json!({}).as_object().cloned().unwrap();
        assert!(matches!(
            tool.check_required(&args),
            Err(McpError::MissingArg(name)) if name == "sectionId"
        ));

        let args = json!({"sectionId": null}).as_object().cloned().unwrap();
        assert!(tool.check_required(&args).is_err());

        let args = json!({"sectionId": "b1"}).as_object().cloned().unwrap();
        assert!(tool.check_required(&args).is_ok());
    }

    #[test]
    fn registry_lists_three_tools() {
        let registry = ToolRegistry::new();
        let names: Vec<&str> = registry
            .tools()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["search_content", "get_section", "list_headings"]);
    }
}
