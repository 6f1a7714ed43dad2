use crate::errors::ToolError;
use serde_json::{Map, Value};

/// Typed accessors over tool arguments that have already passed schema checks.
#[derive(Clone, Default)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    pub fn ensure_string(&self, args: &Value, label: &str) -> Result<String, ToolError> {
        let text = args.get(label).and_then(|v| v.as_str()).ok_or_else(|| {
            ToolError::invalid_params(format!("{} must be a non-empty string", label))
        })?;
        let normalized = text.trim();
        if normalized.is_empty() {
            return Err(ToolError::invalid_params(format!(
                "{} must be a non-empty string",
                label
            )));
        }
        Ok(normalized.to_string())
    }

    pub fn ensure_object<'a>(
        &self,
        args: &'a Value,
        label: &str,
    ) -> Result<&'a Map<String, Value>, ToolError> {
        args.get(label)
            .and_then(|v| v.as_object())
            .ok_or_else(|| ToolError::invalid_params(format!("{} must be a JSON object", label)))
    }

    pub fn optional_object<'a>(
        &self,
        args: &'a Value,
        label: &str,
    ) -> Result<Option<&'a Map<String, Value>>, ToolError> {
        match args.get(label) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.ensure_object(args, label).map(Some),
        }
    }

    pub fn optional_u64(&self, args: &Value, label: &str) -> Result<Option<u64>, ToolError> {
        match args.get(label) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value.as_u64().map(Some).ok_or_else(|| {
                ToolError::invalid_params(format!("{} must be a non-negative integer", label))
            }),
        }
    }

    pub fn optional_bool(&self, args: &Value, label: &str) -> Result<bool, ToolError> {
        match args.get(label) {
            None | Some(Value::Null) => Ok(false),
            Some(value) => value
                .as_bool()
                .ok_or_else(|| ToolError::invalid_params(format!("{} must be a boolean", label))),
        }
    }

    pub fn string_list(&self, args: &Value, label: &str) -> Result<Vec<String>, ToolError> {
        let Some(value) = args.get(label).filter(|v| !v.is_null()) else {
            return Ok(Vec::new());
        };
        let items = value.as_array().ok_or_else(|| {
            ToolError::invalid_params(format!("{} must be an array of strings", label))
        })?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        ToolError::invalid_params(format!(
                            "{} must contain only non-empty strings",
                            label
                        ))
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Validation;
    use serde_json::json;

    #[test]
    fn strings_are_trimmed_and_required() {
        let v = Validation::new();
        assert_eq!(
            v.ensure_string(&json!({ "entity": "  CustomersV3 " }), "entity")
                .unwrap(),
            "CustomersV3"
        );
        assert!(v.ensure_string(&json!({ "entity": "   " }), "entity").is_err());
        assert!(v.ensure_string(&json!({}), "entity").is_err());
    }

    #[test]
    fn optional_values_accept_null() {
        let v = Validation::new();
        let args = json!({ "skip": null, "crossCompany": null, "filter": null });
        assert_eq!(v.optional_u64(&args, "skip").unwrap(), None);
        assert!(!v.optional_bool(&args, "crossCompany").unwrap());
        assert!(v.optional_object(&args, "filter").unwrap().is_none());
        assert!(v.optional_u64(&json!({ "skip": -1 }), "skip").is_err());
    }

    #[test]
    fn string_list_rejects_blank_items() {
        let v = Validation::new();
        assert_eq!(
            v.string_list(&json!({ "select": ["Name", " Id "] }), "select")
                .unwrap(),
            vec!["Name", "Id"]
        );
        assert!(v.string_list(&json!({ "select": ["", "Id"] }), "select").is_err());
        assert!(v.string_list(&json!({}), "select").unwrap().is_empty());
    }
}
