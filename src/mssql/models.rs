//! Wire models for the `Microsoft.Sql` resources the data source reads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// `publicNetworkAccess` value that enables public access.
pub const PUBLIC_NETWORK_ACCESS_ENABLED: &str = "Enabled";

/// A SQL logical server (`Microsoft.Sql/servers`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    /// ARM allows `null` tag values.
    #[serde(default)]
    pub tags: Option<HashMap<String, Option<String>>>,
    #[serde(default)]
    pub identity: Option<ResourceIdentity>,
    #[serde(default)]
    pub properties: Option<ServerProperties>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerProperties {
    #[serde(default)]
    pub administrator_login: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub fully_qualified_domain_name: Option<String>,
    #[serde(default)]
    pub minimal_tls_version: Option<String>,
    #[serde(default)]
    pub public_network_access: Option<String>,
}

impl ServerProperties {
    /// Whether `publicNetworkAccess` is exactly `Enabled`.
    pub fn public_network_access_enabled(&self) -> bool {
        self.public_network_access.as_deref() == Some(PUBLIC_NETWORK_ACCESS_ENABLED)
    }
}

/// Managed identity attached to a resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceIdentity {
    #[serde(default, rename = "type")]
    pub identity_type: Option<String>,
    #[serde(default)]
    pub principal_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// The Azure AD administrator of a server (`administrators/ActiveDirectory`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerAzureAdAdministrator {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: Option<AdministratorProperties>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdministratorProperties {
    #[serde(default)]
    pub administrator_type: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
    /// Object ID of the administrator principal.
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// The connection policy of a server (`connectionPolicies/default`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConnectionPolicy {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub properties: Option<ConnectionPolicyProperties>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPolicyProperties {
    /// `Default`, `Proxy` or `Redirect`.
    #[serde(default)]
    pub connection_type: Option<String>,
}
