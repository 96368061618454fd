//! Schema validation helpers.
//!
//! Validates a `serde_json::Value` config against a [`Schema`] before any typed
//! handling happens, reporting every problem as a [`Diagnostic`] with the
//! attribute path it applies to.
//!
//! # Example
//!
//! ```
//! use hemmer_provider_azurerm::schema::{Schema, Attribute};
//! use hemmer_provider_azurerm::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute("location", Attribute::computed_string());
//!
//! assert!(validate(&schema, &json!({"name": "sqlserver-1"})).is_empty());
//!
//! // Computed attributes cannot be configured
//! let diagnostics = validate(&schema, &json!({"name": "sqlserver-1", "location": "westeurope"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("location".to_string()));
//! ```

use crate::schema::{
    Attribute, AttributeType, Block, BlockNestingMode, Diagnostic, NestedBlock, Schema,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Validate a JSON config against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed-only attributes must not be configured
/// - Keys the schema does not declare are rejected
/// - Attribute types must match the schema
/// - Nested blocks are validated recursively with min/max item constraints
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

/// Validate a JSON config against a schema, returning Ok if valid or Err with diagnostics.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check a single value against an attribute type.
///
/// Used both for config validation and when the provider writes computed
/// attributes into state.
pub fn validate_value(attr_type: &AttributeType, value: &Value, path: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_attribute_type(attr_type, value, path, &mut diagnostics);
    diagnostics
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return,
        _ => {
            let mut diagnostic =
                Diagnostic::error("Expected object").with_detail(format!("Got {}", value_type_name(value)));
            if !path.is_empty() {
                diagnostic = diagnostic.with_attribute(path);
            }
            diagnostics.push(diagnostic);
            return;
        },
    };

    for key in obj.keys() {
        if !block.attributes.contains_key(key) && !block.blocks.contains_key(key) {
            let key_path = join_path(path, key);
            diagnostics.push(
                Diagnostic::error(format!("Unsupported argument '{}'", key_path))
                    .with_detail("An argument with this name is not expected here")
                    .with_attribute(key_path),
            );
        }
    }

    let mut names: Vec<&String> = block.attributes.keys().collect();
    names.sort();
    for name in names {
        let attr_path = join_path(path, name);
        validate_attribute(&block.attributes[name], obj.get(name), &attr_path, diagnostics);
    }

    for (name, nested) in &block.blocks {
        let block_path = join_path(path, name);
        validate_nested_block(nested, obj.get(name), &block_path, diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        },
        Some(_) if attr.flags.is_computed_only() => {
            diagnostics.push(
                Diagnostic::error(format!("Value for unconfigurable attribute '{}'", path))
                    .with_detail("This attribute is computed by the provider and cannot be set")
                    .with_attribute(path),
            );
        },
        Some(v) => validate_attribute_type(&attr.attr_type, v, path, diagnostics),
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        },
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        },
        AttributeType::List(element_type) => match value.as_array() {
            Some(arr) => {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
            },
            None => diagnostics.push(type_error(path, "list", value)),
        },
        AttributeType::Map(value_type) => match value.as_object() {
            Some(obj) => {
                for (key, val) in obj {
                    let key_path = format!("{}.{}", path, key);
                    validate_attribute_type(value_type, val, &key_path, diagnostics);
                }
            },
            None => diagnostics.push(type_error(path, "map", value)),
        },
        AttributeType::Object(attrs) => match value.as_object() {
            Some(obj) => validate_object_type(attrs, obj, path, diagnostics),
            None => diagnostics.push(type_error(path, "object", value)),
        },
    }
}

fn validate_object_type(
    attrs: &HashMap<String, AttributeType>,
    obj: &Map<String, Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (name, value) in obj {
        let attr_path = join_path(path, name);
        match attrs.get(name) {
            Some(attr_type) => {
                validate_attribute_type(attr_type, value, &attr_path, diagnostics);
            },
            None => diagnostics.push(
                Diagnostic::error(format!("Unexpected object attribute '{}'", attr_path))
                    .with_attribute(attr_path),
            ),
        }
    }
}

fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match (nested.nesting_mode, value) {
        (_, None | Some(Value::Null)) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s)",
                        path, nested.min_items
                    ))
                    .with_attribute(path),
                );
            }
        },
        (BlockNestingMode::Single, Some(v)) => {
            validate_block(&nested.block, v, path, diagnostics);
        },
        (BlockNestingMode::List, Some(Value::Array(items))) => {
            let len = items.len() as u32;

            if len < nested.min_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s), got {}",
                        path, nested.min_items, len
                    ))
                    .with_attribute(path),
                );
            }

            // max_items of 0 means unlimited
            if nested.max_items > 0 && len > nested.max_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' allows at most {} item(s), got {}",
                        path, nested.max_items, len
                    ))
                    .with_attribute(path),
                );
            }

            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{}.{}", path, i);
                validate_block(&nested.block, item, &item_path, diagnostics);
            }
        },
        (BlockNestingMode::List, Some(v)) => {
            diagnostics.push(
                Diagnostic::error(format!("Expected list for block '{}'", path))
                    .with_detail(format!("Got {}", value_type_name(v)))
                    .with_attribute(path),
            );
        },
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected, value_type_name(got)))
        .with_attribute(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeFlags, Block, NestedBlock, Schema};
    use serde_json::json;

    fn server_lookup_schema() -> Schema {
        Schema::v0()
            .with_attribute("name", Attribute::required_string())
            .with_attribute("resource_group_name", Attribute::required_string())
            .with_attribute("location", Attribute::computed_string())
            .with_block(
                "timeouts",
                NestedBlock::single(Block::new().with_attribute("read", Attribute::optional_string())),
            )
    }

    #[test]
    fn test_validate_required_string() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(validate(&schema, &json!({"name": "test"})).is_empty());

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("name".to_string()));

        let diagnostics = validate(&schema, &json!({"name": null}));
        assert_eq!(diagnostics.len(), 1);

        let diagnostics = validate(&schema, &json!({"name": 123}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_optional_attribute() {
        let schema = Schema::v0().with_attribute("endpoint", Attribute::optional_string());

        assert!(validate(&schema, &json!({"endpoint": "http://localhost"})).is_empty());
        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"endpoint": null})).is_empty());
        assert_eq!(validate(&schema, &json!({"endpoint": true})).len(), 1);
    }

    #[test]
    fn test_computed_attribute_rejected_when_configured() {
        let schema = server_lookup_schema();

        let diagnostics = validate(
            &schema,
            &json!({"name": "srv", "resource_group_name": "rg", "location": "westeurope"}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("unconfigurable"));

        // Null counts as not configured
        let diagnostics = validate(
            &schema,
            &json!({"name": "srv", "resource_group_name": "rg", "location": null}),
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_argument_rejected() {
        let schema = server_lookup_schema();

        let diagnostics = validate(
            &schema,
            &json!({"name": "srv", "resource_group_name": "rg", "sku": "basic"}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("sku".to_string()));
        assert!(diagnostics[0].summary.contains("Unsupported argument"));
    }

    #[test]
    fn test_validate_bool() {
        let schema = Schema::v0().with_attribute(
            "enabled",
            Attribute::new(AttributeType::Bool, AttributeFlags::required()),
        );

        assert!(validate(&schema, &json!({"enabled": true})).is_empty());
        assert!(validate(&schema, &json!({"enabled": false})).is_empty());
        assert_eq!(validate(&schema, &json!({"enabled": "true"})).len(), 1);
    }

    #[test]
    fn test_validate_value_list_of_objects() {
        let identity = AttributeType::list(AttributeType::object([
            ("type", AttributeType::String),
            ("principal_id", AttributeType::String),
        ]));

        assert!(validate_value(
            &identity,
            &json!([{"type": "SystemAssigned", "principal_id": "p"}]),
            "identity"
        )
        .is_empty());
        assert!(validate_value(&identity, &json!([]), "identity").is_empty());

        let diagnostics = validate_value(&identity, &json!([{"type": 1}]), "identity");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("identity.0.type".to_string()));

        let diagnostics = validate_value(&identity, &json!([{"kind": "x"}]), "identity");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("identity.0.kind".to_string()));

        assert_eq!(validate_value(&identity, &json!({}), "identity").len(), 1);
    }

    #[test]
    fn test_validate_value_map() {
        let tags = AttributeType::map(AttributeType::String);

        assert!(validate_value(&tags, &json!({"ENV": "Staging", "database": "test"}), "tags").is_empty());

        let diagnostics = validate_value(&tags, &json!({"ENV": "Staging", "count": 42}), "tags");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("tags.count".to_string()));
    }

    #[test]
    fn test_validate_single_block() {
        let schema = server_lookup_schema();

        let diagnostics = validate(
            &schema,
            &json!({"name": "srv", "resource_group_name": "rg", "timeouts": {"read": "10m"}}),
        );
        assert!(diagnostics.is_empty());

        let diagnostics = validate(
            &schema,
            &json!({"name": "srv", "resource_group_name": "rg", "timeouts": {"read": 10}}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("timeouts.read".to_string()));

        let diagnostics = validate(
            &schema,
            &json!({"name": "srv", "resource_group_name": "rg", "timeouts": {"create": "10m"}}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("timeouts.create".to_string()));

        let diagnostics = validate(
            &schema,
            &json!({"name": "srv", "resource_group_name": "rg", "timeouts": "10m"}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected object"));
    }

    #[test]
    fn test_validate_list_block_limits() {
        let schema = Schema::v0().with_block(
            "filter",
            NestedBlock::list(Block::new().with_attribute("name", Attribute::required_string()))
                .with_min_items(1)
                .with_max_items(2),
        );

        assert!(validate(&schema, &json!({"filter": [{"name": "a"}]})).is_empty());

        let diagnostics = validate(&schema, &json!({"filter": []}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at least 1"));

        let diagnostics = validate(
            &schema,
            &json!({"filter": [{"name": "a"}, {"name": "b"}, {"name": "c"}]}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at most 2"));

        let diagnostics = validate(&schema, &json!({"filter": [{"name": 1}]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("filter.0.name".to_string()));

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_validate_multiple_errors() {
        let schema = server_lookup_schema();

        let diagnostics = validate(&schema, &json!({"name": 1, "resource_group_name": false}));
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].attribute, Some("name".to_string()));
        assert_eq!(
            diagnostics[1].attribute,
            Some("resource_group_name".to_string())
        );
    }

    #[test]
    fn test_validate_result_helper() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        assert!(validate_result(&schema, &json!({"name": "test"})).is_ok());

        let result = validate_result(&schema, &json!({}));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().len(), 1);
    }

    #[test]
    fn test_validate_root_not_object() {
        let schema = Schema::v0().with_attribute("name", Attribute::required_string());

        let diagnostics = validate(&schema, &json!("not an object"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected object"));
        assert!(diagnostics[0].attribute.is_none());
    }
}
