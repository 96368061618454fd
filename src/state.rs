//! Schema-backed attribute bag written by data source reads.
//!
//! [`ResourceData`] starts with every attribute of the schema at its zero
//! value. The reader then overwrites attributes one upstream call at a time;
//! each write is checked against the declared type, so the finished bag always
//! matches the schema.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ProviderError;
use crate::schema::Schema;
use crate::validation::validate_value;

/// Attribute values of a single data source read.
#[derive(Debug, Clone)]
pub struct ResourceData<'a> {
    schema: &'a Schema,
    attributes: Map<String, Value>,
}

impl<'a> ResourceData<'a> {
    /// Create a bag with every schema attribute at its zero value.
    pub fn new(schema: &'a Schema) -> Self {
        let attributes = schema
            .block
            .attributes
            .iter()
            .map(|(name, attr)| (name.clone(), attr.attr_type.zero_value()))
            .collect();
        Self { schema, attributes }
    }

    /// Set the resource identifier.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.attributes.insert("id".to_string(), Value::String(id.into()));
    }

    /// The resource identifier, if one has been set.
    pub fn id(&self) -> Option<&str> {
        self.attributes
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    /// Set an attribute.
    ///
    /// `None` and other values serializing to `null` reset the attribute to
    /// its zero value. Keys the schema does not declare and values of the
    /// wrong shape fail with [`ProviderError::FieldSetting`].
    pub fn set<T>(&mut self, key: &str, value: &T) -> Result<(), ProviderError>
    where
        T: Serialize + ?Sized,
    {
        let attr = self
            .schema
            .attribute(key)
            .ok_or_else(|| field_error(key, "attribute is not declared in the schema"))?;

        let value = serde_json::to_value(value).map_err(|e| field_error(key, e.to_string()))?;
        let value = if value.is_null() {
            attr.attr_type.zero_value()
        } else {
            value
        };

        if let Some(diagnostic) = validate_value(&attr.attr_type, &value, key).into_iter().next() {
            let reason = match diagnostic.detail {
                Some(detail) => format!("{}: {}", diagnostic.summary, detail),
                None => diagnostic.summary,
            };
            return Err(field_error(key, reason));
        }

        self.attributes.insert(key.to_string(), value);
        Ok(())
    }

    /// Current value of an attribute.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Finish the read, producing the attribute bag handed back to the host.
    pub fn into_value(self) -> Value {
        Value::Object(self.attributes)
    }
}

fn field_error(field: &str, reason: impl Into<String>) -> ProviderError {
    ProviderError::FieldSetting {
        field: field.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeType};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string())
            .with_attribute("enabled", Attribute::computed_bool())
            .with_attribute(
                "tags",
                Attribute::computed(AttributeType::map(AttributeType::String)),
            )
            .with_attribute(
                "identity",
                Attribute::computed(AttributeType::list(AttributeType::object([(
                    "type",
                    AttributeType::String,
                )]))),
            )
    }

    #[test]
    fn test_new_fills_zero_values() {
        let schema = schema();
        let data = ResourceData::new(&schema);

        assert_eq!(
            data.into_value(),
            json!({"id": "", "name": "", "enabled": false, "tags": {}, "identity": []})
        );
    }

    #[test]
    fn test_set_and_get() {
        let schema = schema();
        let mut data = ResourceData::new(&schema);

        data.set("name", "srv").unwrap();
        data.set("enabled", &true).unwrap();
        data.set("tags", &BTreeMap::from([("ENV", "Staging")])).unwrap();
        data.set("identity", &json!([{"type": "SystemAssigned"}])).unwrap();

        assert_eq!(data.get("name"), Some(&json!("srv")));
        assert_eq!(data.get("enabled"), Some(&json!(true)));
        assert_eq!(data.get("tags"), Some(&json!({"ENV": "Staging"})));
        assert_eq!(data.get("identity"), Some(&json!([{"type": "SystemAssigned"}])));
    }

    #[test]
    fn test_set_none_resets_to_zero() {
        let schema = schema();
        let mut data = ResourceData::new(&schema);

        data.set("name", "srv").unwrap();
        data.set("name", &None::<String>).unwrap();
        assert_eq!(data.get("name"), Some(&json!("")));
    }

    #[test]
    fn test_set_unknown_key_fails() {
        let schema = schema();
        let mut data = ResourceData::new(&schema);

        let err = data.set("sku", "basic").unwrap_err();
        assert!(matches!(err, ProviderError::FieldSetting { ref field, .. } if field == "sku"));
    }

    #[test]
    fn test_set_wrong_shape_fails() {
        let schema = schema();
        let mut data = ResourceData::new(&schema);

        let err = data.set("identity", &json!({"type": "SystemAssigned"})).unwrap_err();
        assert!(err.to_string().starts_with("setting `identity`"));

        let err = data.set("tags", &json!({"count": 2})).unwrap_err();
        assert!(err.to_string().contains("tags.count"));

        // A rejected write leaves the previous value in place
        assert_eq!(data.get("tags"), Some(&json!({})));
    }

    #[test]
    fn test_id() {
        let schema = schema();
        let mut data = ResourceData::new(&schema);
        assert_eq!(data.id(), None);

        data.set_id("/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Sql/servers/srv");
        assert_eq!(
            data.id(),
            Some("/subscriptions/sub/resourceGroups/rg/providers/Microsoft.Sql/servers/srv")
        );
    }
}
