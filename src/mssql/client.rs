//! Client traits for the three `Microsoft.Sql` lookups and their ARM implementation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::arm::{ArmClient, ArmError};

use super::models::{Server, ServerAzureAdAdministrator, ServerConnectionPolicy};

/// API version used for servers and their AAD administrator.
pub const SERVERS_API_VERSION: &str = "2019-06-01-preview";
/// API version used for connection policies.
pub const CONNECTION_POLICIES_API_VERSION: &str = "2014-04-01";

const PROVIDER_NAMESPACE: &str = "Microsoft.Sql";
const ADMINISTRATOR_NAME: &str = "ActiveDirectory";
const CONNECTION_POLICY_NAME: &str = "default";

/// Reads SQL servers.
#[async_trait]
pub trait ServersClient: Send + Sync {
    /// Fetch a server by resource group and name.
    async fn get(&self, resource_group: &str, server_name: &str) -> Result<Server, ArmError>;
}

/// Reads the Azure AD administrator of a server.
#[async_trait]
pub trait ServerAzureAdAdministratorsClient: Send + Sync {
    /// Fetch the administrator; a server without one answers 404.
    async fn get(
        &self,
        resource_group: &str,
        server_name: &str,
    ) -> Result<ServerAzureAdAdministrator, ArmError>;
}

/// Reads the connection policy of a server.
#[async_trait]
pub trait ServerConnectionPoliciesClient: Send + Sync {
    /// Fetch the `default` connection policy.
    async fn get(
        &self,
        resource_group: &str,
        server_name: &str,
    ) -> Result<ServerConnectionPolicy, ArmError>;
}

/// The clients the `azurerm_mssql_server` data source reads through.
#[derive(Clone)]
pub struct MssqlClients {
    /// Server lookups.
    pub servers: Arc<dyn ServersClient>,
    /// AAD administrator lookups.
    pub administrators: Arc<dyn ServerAzureAdAdministratorsClient>,
    /// Connection policy lookups.
    pub connection_policies: Arc<dyn ServerConnectionPoliciesClient>,
}

impl MssqlClients {
    /// Route all three lookups through one ARM client.
    pub fn from_arm(client: Arc<ArmClient>) -> Self {
        Self {
            servers: client.clone(),
            administrators: client.clone(),
            connection_policies: client,
        }
    }
}

impl std::fmt::Debug for MssqlClients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MssqlClients").finish_non_exhaustive()
    }
}

#[async_trait]
impl ServersClient for ArmClient {
    async fn get(&self, resource_group: &str, server_name: &str) -> Result<Server, ArmError> {
        self.get_resource(
            resource_group,
            &["providers", PROVIDER_NAMESPACE, "servers", server_name],
            SERVERS_API_VERSION,
        )
        .await
    }
}

#[async_trait]
impl ServerAzureAdAdministratorsClient for ArmClient {
    async fn get(
        &self,
        resource_group: &str,
        server_name: &str,
    ) -> Result<ServerAzureAdAdministrator, ArmError> {
        self.get_resource(
            resource_group,
            &[
                "providers",
                PROVIDER_NAMESPACE,
                "servers",
                server_name,
                "administrators",
                ADMINISTRATOR_NAME,
            ],
            SERVERS_API_VERSION,
        )
        .await
    }
}

#[async_trait]
impl ServerConnectionPoliciesClient for ArmClient {
    async fn get(
        &self,
        resource_group: &str,
        server_name: &str,
    ) -> Result<ServerConnectionPolicy, ArmError> {
        self.get_resource(
            resource_group,
            &[
                "providers",
                PROVIDER_NAMESPACE,
                "servers",
                server_name,
                "connectionPolicies",
                CONNECTION_POLICY_NAME,
            ],
            CONNECTION_POLICIES_API_VERSION,
        )
        .await
    }
}
