//! Resource tag helpers.

use std::collections::{BTreeMap, HashMap};

use crate::schema::{Attribute, AttributeType};

/// Flatten an upstream tag map into the `tags` attribute.
///
/// ARM allows tag values to be `null`; those become empty strings. A resource
/// without tags flattens to an empty map.
pub fn flatten(tags: Option<&HashMap<String, Option<String>>>) -> BTreeMap<String, String> {
    tags.into_iter()
        .flatten()
        .map(|(key, value)| (key.clone(), value.clone().unwrap_or_default()))
        .collect()
}

/// The `tags` attribute as exposed by data sources.
pub fn schema_for_data_source() -> Attribute {
    Attribute::computed(AttributeType::map(AttributeType::String))
        .with_description("Tags assigned to the resource")
}
