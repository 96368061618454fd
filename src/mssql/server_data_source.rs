//! The `azurerm_mssql_server` data source.
//!
//! A read is three sequential lookups against the server: the server itself,
//! its Azure AD administrator and its connection policy. A missing
//! administrator is normal and leaves `azuread_administrator` empty; every
//! other failure, a missing connection policy included, aborts the read.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::arm::ArmError;
use crate::error::ProviderError;
use crate::location::{self, normalize_location};
use crate::resource_group;
use crate::schema::{Attribute, AttributeType, Block, Diagnostic, NestedBlock, Schema};
use crate::state::ResourceData;
use crate::tags;
use crate::validation::validate_result;

use super::client::MssqlClients;
use super::models::{ResourceIdentity, ServerAzureAdAdministrator};

/// Type name of the data source.
pub const DATA_SOURCE_TYPE: &str = "azurerm_mssql_server";

/// Deadline for a whole read when `timeouts.read` is not configured.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5 * 60);

const SERVER_NAME_MAX_LEN: usize = 63;

/// Schema of the data source.
pub fn schema() -> Schema {
    let identity = AttributeType::object([
        ("type", AttributeType::String),
        ("principal_id", AttributeType::String),
        ("tenant_id", AttributeType::String),
    ]);
    let administrator = AttributeType::object([
        ("login_username", AttributeType::String),
        ("object_id", AttributeType::String),
        ("tenant_id", AttributeType::String),
    ]);

    Schema::v0()
        .with_attribute("id", Attribute::computed_string())
        .with_attribute(
            "name",
            Attribute::required_string().with_description("Name of the SQL server"),
        )
        .with_attribute("resource_group_name", resource_group::schema_for_data_source())
        .with_attribute("location", location::schema_for_data_source())
        .with_attribute("version", Attribute::computed_string())
        .with_attribute("administrator_login", Attribute::computed_string())
        .with_attribute(
            "azuread_administrator",
            Attribute::computed(AttributeType::list(administrator)),
        )
        .with_attribute(
            "connection_policy",
            Attribute::computed_string().with_description("Default, Proxy or Redirect"),
        )
        .with_attribute("identity", Attribute::computed(AttributeType::list(identity)))
        .with_attribute("minimal_tls_version", Attribute::computed_string())
        .with_attribute("public_network_access_enabled", Attribute::computed_bool())
        .with_attribute("fully_qualified_domain_name", Attribute::computed_string())
        .with_attribute("tags", tags::schema_for_data_source())
        .with_block(
            "timeouts",
            NestedBlock::single(
                Block::new().with_attribute(
                    "read",
                    Attribute::optional_string()
                        .with_description("Deadline for the read, e.g. \"5m\""),
                ),
            ),
        )
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    name: String,
    resource_group_name: String,
    #[serde(default)]
    timeouts: Option<RawTimeouts>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTimeouts {
    #[serde(default)]
    read: Option<String>,
}

/// Validated input of a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MssqlServerDataSourceConfig {
    /// Server name.
    pub name: String,
    /// Resource group holding the server.
    pub resource_group_name: String,
    /// Deadline for the whole read.
    pub read_timeout: Duration,
}

impl MssqlServerDataSourceConfig {
    /// Input for `name` in `resource_group_name` with the default deadline.
    pub fn new(name: impl Into<String>, resource_group_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_group_name: resource_group_name.into(),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Set the read deadline.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Validate a raw data source block and convert it into typed input.
    ///
    /// Schema errors are reported first; the name, resource group and timeout
    /// checks only run on a block that matches the schema.
    pub fn from_value(config: &Value) -> Result<Self, Vec<Diagnostic>> {
        validate_result(&schema(), config)?;

        let raw: RawConfig = serde_json::from_value(config.clone()).map_err(|e| {
            vec![Diagnostic::error("Invalid data source configuration").with_detail(e.to_string())]
        })?;

        let mut diagnostics = Vec::new();

        if let Err(e) = validate_server_name(&raw.name) {
            diagnostics.push(
                Diagnostic::error("Invalid server name")
                    .with_detail(e)
                    .with_attribute("name"),
            );
        }

        if let Err(e) = resource_group::validate_name(&raw.resource_group_name) {
            diagnostics.push(
                Diagnostic::error("Invalid resource group name")
                    .with_detail(e)
                    .with_attribute("resource_group_name"),
            );
        }

        let read_timeout = match raw.timeouts.unwrap_or_default().read {
            None => DEFAULT_READ_TIMEOUT,
            Some(read) => match parse_timeout(&read) {
                Ok(timeout) => timeout,
                Err(e) => {
                    diagnostics.push(
                        Diagnostic::error("Invalid read timeout")
                            .with_detail(e)
                            .with_attribute("timeouts.read"),
                    );
                    DEFAULT_READ_TIMEOUT
                },
            },
        };

        if !diagnostics.is_empty() {
            return Err(diagnostics);
        }

        Ok(Self {
            name: raw.name,
            resource_group_name: raw.resource_group_name,
            read_timeout,
        })
    }
}

/// Validate a raw data source block, returning every problem found.
pub fn validate_config(config: &Value) -> Vec<Diagnostic> {
    match MssqlServerDataSourceConfig::from_value(config) {
        Ok(_) => Vec::new(),
        Err(diagnostics) => diagnostics,
    }
}

/// Check a SQL server name: 1-63 characters of lowercase letters, digits and
/// hyphens, not starting or ending with a hyphen.
pub fn validate_server_name(name: &str) -> Result<(), String> {
    if name.is_empty() || name.len() > SERVER_NAME_MAX_LEN {
        return Err(format!(
            "server name must be between 1 and {} characters, got {}",
            SERVER_NAME_MAX_LEN,
            name.len()
        ));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(format!(
            "server name may only contain lowercase letters, digits and '-', found {:?}",
            c
        ));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err("server name must not start or end with '-'".to_string());
    }
    Ok(())
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    let timeout =
        humantime::parse_duration(value).map_err(|e| format!("{:?}: {}", value, e))?;
    if timeout.is_zero() {
        return Err(format!("{:?}: timeout must be greater than zero", value));
    }
    Ok(timeout)
}

/// One element of the `identity` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityAttribute {
    /// Identity type, e.g. `SystemAssigned`.
    #[serde(rename = "type")]
    pub identity_type: String,
    /// Principal ID of the identity.
    pub principal_id: String,
    /// Tenant of the identity.
    pub tenant_id: String,
}

/// One element of the `azuread_administrator` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdministratorAttribute {
    /// Login name of the administrator.
    pub login_username: String,
    /// Object ID of the administrator principal.
    pub object_id: String,
    /// Tenant of the administrator principal.
    pub tenant_id: String,
}

/// Flatten a server identity into the `identity` attribute.
pub fn flatten_identity(identity: Option<&ResourceIdentity>) -> Vec<IdentityAttribute> {
    identity
        .map(|identity| IdentityAttribute {
            identity_type: identity.identity_type.clone().unwrap_or_default(),
            principal_id: identity.principal_id.clone().unwrap_or_default(),
            tenant_id: identity.tenant_id.clone().unwrap_or_default(),
        })
        .into_iter()
        .collect()
}

/// Flatten an AAD administrator into the `azuread_administrator` attribute.
///
/// A record without properties flattens to an empty list.
pub fn flatten_administrator(admin: &ServerAzureAdAdministrator) -> Vec<AdministratorAttribute> {
    admin
        .properties
        .as_ref()
        .map(|props| AdministratorAttribute {
            login_username: props.login.clone().unwrap_or_default(),
            object_id: props.sid.clone().unwrap_or_default(),
            tenant_id: props.tenant_id.clone().unwrap_or_default(),
        })
        .into_iter()
        .collect()
}

/// Read a server, bounded by the configured read deadline.
///
/// Returns the attribute bag of the data source.
#[instrument(
    skip_all,
    fields(name = %config.name, resource_group = %config.resource_group_name)
)]
pub async fn read(
    clients: &MssqlClients,
    config: &MssqlServerDataSourceConfig,
) -> Result<Value, ProviderError> {
    let schema = schema();
    match tokio::time::timeout(config.read_timeout, read_server(clients, config, &schema)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::DeadlineExceeded(format!(
            "reading SQL Server \"{}\" (Resource Group \"{}\") did not finish within {}",
            config.name,
            config.resource_group_name,
            humantime::format_duration(config.read_timeout)
        ))),
    }
}

async fn read_server(
    clients: &MssqlClients,
    config: &MssqlServerDataSourceConfig,
    schema: &Schema,
) -> Result<Value, ProviderError> {
    let name = config.name.as_str();
    let resource_group = config.resource_group_name.as_str();

    debug!("fetching server");
    let server = clients
        .servers
        .get(resource_group, name)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                ProviderError::NotFound(format!(
                    "SQL Server \"{}\" (Resource Group \"{}\") was not found",
                    name, resource_group
                ))
            } else {
                api_error(
                    format!(
                        "reading SQL Server \"{}\" (Resource Group \"{}\")",
                        name, resource_group
                    ),
                    e,
                )
            }
        })?;

    let mut data = ResourceData::new(schema);
    if let Some(id) = &server.id {
        data.set_id(id.as_str());
    }
    data.set("name", name)?;
    data.set("resource_group_name", resource_group)?;
    if let Some(location) = &server.location {
        data.set("location", &normalize_location(location))?;
    }

    if let Some(props) = &server.properties {
        data.set("version", &props.version)?;
        data.set("administrator_login", &props.administrator_login)?;
        data.set("fully_qualified_domain_name", &props.fully_qualified_domain_name)?;
        data.set("minimal_tls_version", &props.minimal_tls_version)?;
        data.set(
            "public_network_access_enabled",
            &props.public_network_access_enabled(),
        )?;
    }

    data.set("identity", &flatten_identity(server.identity.as_ref()))?;

    debug!("fetching Azure AD administrator");
    match clients.administrators.get(resource_group, name).await {
        Ok(admin) => data.set("azuread_administrator", &flatten_administrator(&admin))?,
        Err(e) if e.is_not_found() => debug!("no Azure AD administrator configured"),
        Err(e) => {
            return Err(api_error(
                format!("reading SQL Server \"{}\" Azure AD administrator", name),
                e,
            ))
        },
    }

    debug!("fetching connection policy");
    let policy = clients
        .connection_policies
        .get(resource_group, name)
        .await
        .map_err(|e| api_error(format!("reading SQL Server \"{}\" connection policy", name), e))?;
    if let Some(connection_type) = policy.properties.and_then(|p| p.connection_type) {
        data.set("connection_policy", &connection_type)?;
    }

    data.set("tags", &tags::flatten(server.tags.as_ref()))?;

    info!("read SQL Server");
    Ok(data.into_value())
}

fn api_error(context: String, source: ArmError) -> ProviderError {
    ProviderError::Api { context, source }
}
