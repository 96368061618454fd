//! Azure SQL (`Microsoft.Sql`) lookups.

mod client;
#[allow(missing_docs)]
pub mod models;
mod server_data_source;

pub use client::{
    MssqlClients, ServerAzureAdAdministratorsClient, ServerConnectionPoliciesClient, ServersClient,
    CONNECTION_POLICIES_API_VERSION, SERVERS_API_VERSION,
};
pub use server_data_source::{
    flatten_administrator, flatten_identity, read, schema, validate_config, validate_server_name,
    AdministratorAttribute, IdentityAttribute, MssqlServerDataSourceConfig, DATA_SOURCE_TYPE,
    DEFAULT_READ_TIMEOUT,
};
