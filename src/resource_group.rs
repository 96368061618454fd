//! Resource group name helpers.

use crate::schema::Attribute;

const MAX_LEN: usize = 90;

/// Check a resource group name against the ARM naming rules.
///
/// Names are 1-90 characters of letters, digits, underscores, hyphens,
/// periods and parentheses, and cannot end with a period.
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("resource group name must not be empty".to_string());
    }
    if name.chars().count() > MAX_LEN {
        return Err(format!(
            "resource group name must be at most {} characters",
            MAX_LEN
        ));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '(' | ')')))
    {
        return Err(format!(
            "resource group name may only contain letters, digits, '_', '-', '.', '(' and ')', found {:?}",
            c
        ));
    }
    if name.ends_with('.') {
        return Err("resource group name must not end with '.'".to_string());
    }
    Ok(())
}

/// The `resource_group_name` attribute as taken by data sources.
pub fn schema_for_data_source() -> Attribute {
    Attribute::required_string().with_description("Resource group containing the resource")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["acctestRG-01", "rg_prod", "rg.(legacy)", "a", "ресурсы"] {
            assert!(validate_name(name).is_ok(), "{} should be valid", name);
        }
        assert!(validate_name(&"r".repeat(90)).is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name("rg.").is_err());
        assert!(validate_name("rg/prod").is_err());
        assert!(validate_name("rg prod").is_err());
        assert!(validate_name(&"r".repeat(91)).is_err());
    }
}
