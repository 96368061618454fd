//! Provider configuration.
//!
//! The host hands the provider block over as JSON. Every setting may instead
//! come from the environment, the way the Azure tooling conventionally reads
//! them:
//!
//! | Attribute | Environment variable |
//! |---|---|
//! | `subscription_id` | `ARM_SUBSCRIPTION_ID` |
//! | `access_token` | `ARM_ACCESS_TOKEN` |
//! | `environment` | `ARM_ENVIRONMENT` |
//! | `endpoint` | `ARM_ENDPOINT` |
//!
//! Values in the provider block win over the environment.

use std::fmt;
use std::str::FromStr;

use secrecy::SecretString;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::schema::{Attribute, Diagnostic, Schema};

/// Environment variable holding the subscription ID.
pub const ENV_SUBSCRIPTION_ID: &str = "ARM_SUBSCRIPTION_ID";
/// Environment variable holding a pre-acquired bearer token.
pub const ENV_ACCESS_TOKEN: &str = "ARM_ACCESS_TOKEN";
/// Environment variable selecting the cloud environment.
pub const ENV_ENVIRONMENT: &str = "ARM_ENVIRONMENT";
/// Environment variable overriding the management endpoint.
pub const ENV_ENDPOINT: &str = "ARM_ENDPOINT";

/// An Azure cloud, which determines the management endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Azure public cloud.
    #[default]
    Public,
    /// Azure US Government.
    UsGovernment,
    /// Azure China (21Vianet).
    China,
    /// Azure Germany.
    German,
}

impl Environment {
    /// Base URL of the Resource Manager endpoint for this cloud.
    pub fn management_endpoint(&self) -> &'static str {
        match self {
            Self::Public => "https://management.azure.com/",
            Self::UsGovernment => "https://management.usgovcloudapi.net/",
            Self::China => "https://management.chinacloudapi.cn/",
            Self::German => "https://management.microsoftazure.de/",
        }
    }

    /// The name used in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::UsGovernment => "usgovernment",
            Self::China => "china",
            Self::German => "german",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "usgovernment" => Ok(Self::UsGovernment),
            "china" => Ok(Self::China),
            "german" => Ok(Self::German),
            _ => Err(format!(
                "unknown environment {:?}, expected one of: public, usgovernment, china, german",
                s
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawProviderConfig {
    #[serde(default)]
    subscription_id: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    environment: Option<String>,
    #[serde(default)]
    endpoint: Option<String>,
}

/// Validated provider settings.
#[derive(Debug)]
pub struct ProviderConfig {
    /// Subscription all lookups are scoped to.
    pub subscription_id: String,
    /// Bearer token sent to the management API.
    pub access_token: SecretString,
    /// Selected cloud.
    pub environment: Environment,
    /// Management endpoint, either explicit or derived from `environment`.
    pub endpoint: Url,
}

/// Cloud and endpoint settings, which can be checked without credentials.
struct Target {
    environment: Environment,
    endpoint: Url,
}

impl ProviderConfig {
    /// Build the configuration from the provider block, falling back to
    /// `lookup` (normally the process environment) for unset attributes.
    ///
    /// Every problem found is reported, each tagged with its attribute.
    pub fn from_value<F>(config: &Value, lookup: F) -> Result<Self, Vec<Diagnostic>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = parse_raw(config)?;
        let mut diagnostics = Vec::new();

        let target = resolve_target(&raw, &lookup, &mut diagnostics);

        let subscription_id = setting(raw.subscription_id, ENV_SUBSCRIPTION_ID, &lookup);
        if subscription_id.is_none() {
            diagnostics.push(
                Diagnostic::error("Missing subscription ID")
                    .with_detail(format!(
                        "Set `subscription_id` or the {} environment variable",
                        ENV_SUBSCRIPTION_ID
                    ))
                    .with_attribute("subscription_id"),
            );
        }

        let access_token = setting(raw.access_token, ENV_ACCESS_TOKEN, &lookup);
        if access_token.is_none() {
            diagnostics.push(
                Diagnostic::error("Missing access token")
                    .with_detail(format!(
                        "Set `access_token` or the {} environment variable",
                        ENV_ACCESS_TOKEN
                    ))
                    .with_attribute("access_token"),
            );
        }

        match (subscription_id, access_token, target) {
            (Some(subscription_id), Some(access_token), Some(target)) if diagnostics.is_empty() => {
                Ok(Self {
                    subscription_id,
                    access_token: SecretString::from(access_token),
                    environment: target.environment,
                    endpoint: target.endpoint,
                })
            },
            _ => Err(diagnostics),
        }
    }
}

/// Check the settings that do not depend on credentials.
///
/// Used while validating the provider block, before credentials are required.
pub fn validate_settings<F>(config: &Value, lookup: F) -> Vec<Diagnostic>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_raw(config) {
        Ok(raw) => {
            let mut diagnostics = Vec::new();
            resolve_target(&raw, &lookup, &mut diagnostics);
            diagnostics
        },
        Err(diagnostics) => diagnostics,
    }
}

/// Schema of the provider configuration block.
pub fn schema() -> Schema {
    Schema::v0()
        .with_attribute(
            "subscription_id",
            Attribute::optional_string().with_description("Subscription ID to read resources from"),
        )
        .with_attribute(
            "access_token",
            Attribute::optional_string()
                .sensitive()
                .with_description("Bearer token for the Resource Manager API"),
        )
        .with_attribute(
            "environment",
            Attribute::optional_string()
                .with_description("Cloud environment: public, usgovernment, china or german"),
        )
        .with_attribute(
            "endpoint",
            Attribute::optional_string().with_description("Override for the management endpoint URL"),
        )
}

fn parse_raw(config: &Value) -> Result<RawProviderConfig, Vec<Diagnostic>> {
    if config.is_null() {
        return Ok(RawProviderConfig::default());
    }
    serde_json::from_value(config.clone()).map_err(|e| {
        vec![Diagnostic::error("Invalid provider configuration").with_detail(e.to_string())]
    })
}

fn setting<F>(value: Option<String>, env_var: &str, lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    value
        .filter(|v| !v.is_empty())
        .or_else(|| lookup(env_var).filter(|v| !v.is_empty()))
}

fn resolve_target<F>(
    raw: &RawProviderConfig,
    lookup: &F,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Target>
where
    F: Fn(&str) -> Option<String>,
{
    let environment = match setting(raw.environment.clone(), ENV_ENVIRONMENT, lookup) {
        None => Environment::default(),
        Some(name) => match name.parse::<Environment>() {
            Ok(environment) => environment,
            Err(e) => {
                diagnostics.push(
                    Diagnostic::error("Invalid environment")
                        .with_detail(e)
                        .with_attribute("environment"),
                );
                return None;
            },
        },
    };

    let endpoint = setting(raw.endpoint.clone(), ENV_ENDPOINT, lookup)
        .unwrap_or_else(|| environment.management_endpoint().to_string());
    match Url::parse(&endpoint) {
        Ok(url) if !url.cannot_be_a_base() => Some(Target {
            environment,
            endpoint: url,
        }),
        Ok(_) => {
            diagnostics.push(
                Diagnostic::error("Invalid endpoint")
                    .with_detail(format!("{:?} cannot be used as a base URL", endpoint))
                    .with_attribute("endpoint"),
            );
            None
        },
        Err(e) => {
            diagnostics.push(
                Diagnostic::error("Invalid endpoint")
                    .with_detail(format!("{:?}: {}", endpoint, e))
                    .with_attribute("endpoint"),
            );
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serde_json::json;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_config_from_block() {
        let config = ProviderConfig::from_value(
            &json!({"subscription_id": "sub-1", "access_token": "tok"}),
            env(&[]),
        )
        .unwrap();

        assert_eq!(config.subscription_id, "sub-1");
        assert_eq!(config.access_token.expose_secret(), "tok");
        assert_eq!(config.environment, Environment::Public);
        assert_eq!(config.endpoint.as_str(), "https://management.azure.com/");
    }

    #[test]
    fn test_config_env_fallback() {
        let config = ProviderConfig::from_value(
            &json!({"subscription_id": ""}),
            env(&[
                (ENV_SUBSCRIPTION_ID, "sub-env"),
                (ENV_ACCESS_TOKEN, "tok-env"),
                (ENV_ENVIRONMENT, "china"),
            ]),
        )
        .unwrap();

        assert_eq!(config.subscription_id, "sub-env");
        assert_eq!(config.access_token.expose_secret(), "tok-env");
        assert_eq!(config.environment, Environment::China);
        assert_eq!(config.endpoint.as_str(), "https://management.chinacloudapi.cn/");
    }

    #[test]
    fn test_block_wins_over_env() {
        let config = ProviderConfig::from_value(
            &json!({"subscription_id": "sub-block", "access_token": "tok", "environment": "usgovernment"}),
            env(&[(ENV_SUBSCRIPTION_ID, "sub-env"), (ENV_ENVIRONMENT, "german")]),
        )
        .unwrap();

        assert_eq!(config.subscription_id, "sub-block");
        assert_eq!(config.environment, Environment::UsGovernment);
    }

    #[test]
    fn test_explicit_endpoint_overrides_environment() {
        let config = ProviderConfig::from_value(
            &json!({
                "subscription_id": "sub",
                "access_token": "tok",
                "environment": "china",
                "endpoint": "http://127.0.0.1:8080"
            }),
            env(&[]),
        )
        .unwrap();

        assert_eq!(config.environment, Environment::China);
        assert_eq!(config.endpoint.as_str(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn test_missing_credentials_reported_together() {
        let diagnostics = ProviderConfig::from_value(&json!({}), env(&[])).unwrap_err();

        let attributes: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| d.attribute.as_deref())
            .collect();
        assert_eq!(attributes, vec!["subscription_id", "access_token"]);
    }

    #[test]
    fn test_null_config_uses_env() {
        let config = ProviderConfig::from_value(
            &Value::Null,
            env(&[(ENV_SUBSCRIPTION_ID, "sub"), (ENV_ACCESS_TOKEN, "tok")]),
        )
        .unwrap();
        assert_eq!(config.subscription_id, "sub");
    }

    #[test]
    fn test_validate_settings() {
        assert!(validate_settings(&json!({"environment": "PUBLIC"}), env(&[])).is_empty());

        let diagnostics = validate_settings(&json!({"environment": "mars"}), env(&[]));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("environment".to_string()));

        let diagnostics = validate_settings(&json!({"endpoint": "not a url"}), env(&[]));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("endpoint".to_string()));

        let diagnostics = validate_settings(&json!({"endpoint": "mailto:ops@example.com"}), env(&[]));
        assert_eq!(diagnostics.len(), 1);

        // Credentials are not required at this stage
        assert!(validate_settings(&json!({}), env(&[])).is_empty());
    }

    #[test]
    fn test_access_token_not_in_debug_output() {
        let config = ProviderConfig::from_value(
            &json!({"subscription_id": "sub", "access_token": "super-secret"}),
            env(&[]),
        )
        .unwrap();
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[test]
    fn test_environment_round_trip_names() {
        for environment in [
            Environment::Public,
            Environment::UsGovernment,
            Environment::China,
            Environment::German,
        ] {
            assert_eq!(environment.name().parse::<Environment>(), Ok(environment));
        }
    }

    #[test]
    fn test_schema_marks_token_sensitive() {
        let schema = schema();
        assert!(schema.attribute("access_token").unwrap().flags.sensitive);
        assert!(!schema.attribute("subscription_id").unwrap().flags.sensitive);
    }
}
