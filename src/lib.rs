//! Hemmer AzureRM Provider
//!
//! Data sources for Azure Resource Manager, served through the
//! [`ProviderService`] trait. The crate currently ships one data source,
//! `azurerm_mssql_server`, which reads an Azure SQL logical server together
//! with its Azure AD administrator and connection policy.
//!
//! # Overview
//!
//! - **Provider**: [`AzureRmProvider`] implements [`ProviderService`]
//! - **Configuration**: subscription, bearer token and cloud environment, with
//!   `ARM_*` environment-variable fallbacks ([`config`])
//! - **ARM client**: a small `reqwest` client for resource-group scoped `GET`s ([`arm`])
//! - **Schemas and validation**: typed schemas for the provider block and data
//!   sources, checked before any remote call ([`schema`], [`validation`])
//! - **Logging**: `tracing` integration writing to stderr ([`logging`])
//! - **Testing**: a provider harness and an in-memory backend ([`testing`])
//!
//! # Quick Start
//!
//! ```ignore
//! use hemmer_provider_azurerm::{init_logging, AzureRmProvider, ProviderService};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!
//!     let provider = AzureRmProvider::new();
//!     // subscription_id and access_token fall back to ARM_SUBSCRIPTION_ID / ARM_ACCESS_TOKEN
//!     let diagnostics = provider.configure(json!({})).await?;
//!     assert!(diagnostics.is_empty());
//!
//!     let server = provider
//!         .read_data_source(
//!             "azurerm_mssql_server",
//!             json!({"name": "sqlserver-01", "resource_group_name": "production"}),
//!         )
//!         .await?;
//!     println!("{}", server["fully_qualified_domain_name"]);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod arm;
pub mod config;
pub mod error;
pub mod location;
pub mod logging;
pub mod mssql;
pub mod provider;
pub mod resource_group;
pub mod schema;
pub mod state;
pub mod tags;
pub mod testing;
pub mod validation;

// Re-export main types at crate root
pub use arm::{ArmClient, ArmError};
pub use config::{Environment, ProviderConfig};
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{AzureRmProvider, ProviderMetadata, ProviderService};
pub use schema::ProviderSchema;
pub use validation::{validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
