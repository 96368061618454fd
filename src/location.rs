//! Azure location helpers.

use crate::schema::Attribute;

/// Normalize an Azure location to its canonical form.
///
/// The management API reports locations either as display names
/// (`"West Europe"`) or as programmatic names (`"westeurope"`); both normalize
/// to the lowercase form without spaces. Normalizing twice is a no-op.
pub fn normalize_location(location: &str) -> String {
    location
        .chars()
        .filter(|c| *c != ' ')
        .flat_map(char::to_lowercase)
        .collect()
}

/// The `location` attribute as exposed by data sources.
pub fn schema_for_data_source() -> Attribute {
    Attribute::computed_string().with_description("Azure region the resource lives in")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_display_name() {
        assert_eq!(normalize_location("West Europe"), "westeurope");
        assert_eq!(normalize_location("East US 2"), "eastus2");
        assert_eq!(normalize_location("UK South"), "uksouth");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for location in ["westeurope", "West Europe", "  North  Central US ", "", "germanywestcentral"] {
            let once = normalize_location(location);
            assert_eq!(normalize_location(&once), once);
        }
    }

    #[test]
    fn test_location_schema_is_computed() {
        assert!(schema_for_data_source().flags.is_computed_only());
    }
}
