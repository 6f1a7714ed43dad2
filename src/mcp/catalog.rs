use crate::errors::{ErrorCode, McpError};
use crate::utils::suggest::suggest;
use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

static TOOL_CATALOG: Lazy<Vec<ToolDef>> = Lazy::new(|| {
    let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tool_catalog.json"));
    serde_json::from_str(raw).expect("tool_catalog.json must be valid JSON")
});

static TOOL_VALIDATORS: Lazy<HashMap<String, JSONSchema>> = Lazy::new(|| {
    TOOL_CATALOG
        .iter()
        .filter_map(|tool| {
            JSONSchema::compile(&tool.input_schema)
                .ok()
                .map(|schema| (tool.name.clone(), schema))
        })
        .collect()
});

pub fn tool_catalog() -> &'static [ToolDef] {
    &TOOL_CATALOG
}

pub fn tool_by_name(name: &str) -> Option<&'static ToolDef> {
    TOOL_CATALOG.iter().find(|tool| tool.name == name)
}

pub fn tool_names() -> Vec<&'static str> {
    TOOL_CATALOG.iter().map(|tool| tool.name.as_str()).collect()
}

/// Checks `args` against the tool's input schema.
///
/// Unknown tools pass; the executor reports them with suggestions.
pub fn validate_tool_args(tool_name: &str, args: &Value) -> Result<(), McpError> {
    let (Some(tool), Some(schema)) = (tool_by_name(tool_name), TOOL_VALIDATORS.get(tool_name))
    else {
        return Ok(());
    };
    if let Err(errors) = schema.validate(args) {
        let message = format_schema_errors(tool_name, errors, &tool.input_schema);
        return Err(McpError::new(ErrorCode::InvalidParams, message));
    }
    Ok(())
}

fn format_schema_errors(
    tool_name: &str,
    errors: jsonschema::ErrorIterator,
    schema: &Value,
) -> String {
    let properties: Vec<&str> = schema
        .get("properties")
        .and_then(|v| v.as_object())
        .map(|map| map.keys().map(|k| k.as_str()).collect())
        .unwrap_or_default();

    let mut lines = vec![format!("Invalid arguments for {}", tool_name)];
    let mut did_you_mean = Vec::new();

    for err in errors.take(10) {
        let path = err.instance_path.to_string();
        let path = if path.is_empty() {
            "(root)".to_string()
        } else {
            path
        };
        let line = match &err.kind {
            ValidationErrorKind::AdditionalProperties { unexpected } => {
                for unknown in unexpected {
                    let suggestions = suggest(unknown, &properties, 2);
                    if !suggestions.is_empty() {
                        did_you_mean.push(format!("'{}' -> {}", unknown, suggestions.join(", ")));
                    }
                }
                format!("{}: unknown field(s) {}", path, unexpected.join(", "))
            }
            ValidationErrorKind::Required { property } => format!(
                "{}: missing required field '{}'",
                path,
                property.as_str().unwrap_or(&property.to_string())
            ),
            ValidationErrorKind::Type { kind } => {
                format!("{}: expected {}", path, format_type_kind(kind))
            }
            _ => format!("{}: {}", path, err),
        };
        lines.push(format!("- {}", line));
    }

    if !did_you_mean.is_empty() {
        lines.push(format!("Did you mean: {}", did_you_mean.join(" | ")));
    }
    lines.join("\n")
}

fn format_type_kind(kind: &TypeKind) -> String {
    match kind {
        TypeKind::Single(primitive) => primitive.to_string(),
        TypeKind::Multiple(types) => {
            let list: Vec<String> = (*types).into_iter().map(|t| t.to_string()).collect();
            list.join(" | ")
        }
    }
}
