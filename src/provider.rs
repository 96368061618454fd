//! The provider service and its Azure implementation.
//!
//! [`ProviderService`] is the surface a host drives: schema discovery,
//! provider configuration and data source reads. [`AzureRmProvider`]
//! implements it, holding the configured ARM clients between calls.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::arm::ArmClient;
use crate::config::{self, ProviderConfig};
use crate::error::ProviderError;
use crate::mssql::{self, MssqlClients, MssqlServerDataSourceConfig};
use crate::schema::{has_errors, Diagnostic, ProviderSchema};
use crate::validation::validate;

/// Names of everything the provider serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Data source type names, sorted.
    pub data_sources: Vec<String>,
}

/// Operations a host performs against a provider.
///
/// # Example
///
/// ```ignore
/// use hemmer_provider_azurerm::{AzureRmProvider, ProviderService};
/// use serde_json::json;
///
/// let provider = AzureRmProvider::new();
/// provider.configure(json!({"subscription_id": "...", "access_token": "..."})).await?;
///
/// let server = provider
///     .read_data_source("azurerm_mssql_server", json!({"name": "srv", "resource_group_name": "rg"}))
///     .await?;
/// ```
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// Return the provider's schema including all data sources.
    fn schema(&self) -> ProviderSchema;

    /// Return provider metadata, derived from the schema by default.
    fn metadata(&self) -> ProviderMetadata {
        let mut data_sources: Vec<String> = self.schema().data_sources.keys().cloned().collect();
        data_sources.sort();
        ProviderMetadata { data_sources }
    }

    /// Validate the provider configuration before configuring.
    /// Returns diagnostics (errors and warnings).
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider with credentials and settings.
    /// Returns diagnostics (errors and warnings).
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Stop the provider gracefully.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Validate a data source's configuration.
    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (data_source_type, config);
        Ok(vec![])
    }

    /// Read data from an external source.
    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError>;
}

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Azure Resource Manager provider.
#[derive(Clone)]
pub struct AzureRmProvider {
    clients: Arc<RwLock<Option<MssqlClients>>>,
    env: EnvLookup,
}

impl AzureRmProvider {
    /// An unconfigured provider reading fallbacks from the process environment.
    pub fn new() -> Self {
        Self::with_env_lookup(|key| std::env::var(key).ok())
    }

    /// An unconfigured provider reading fallbacks through `lookup`.
    pub fn with_env_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            clients: Arc::new(RwLock::new(None)),
            env: Arc::new(lookup),
        }
    }

    /// A provider already configured with the given clients.
    pub fn with_clients(clients: MssqlClients) -> Self {
        let provider = Self::with_env_lookup(|_| None);
        Self {
            clients: Arc::new(RwLock::new(Some(clients))),
            ..provider
        }
    }

    /// Whether [`ProviderService::configure`] has installed clients.
    pub async fn is_configured(&self) -> bool {
        self.clients.read().await.is_some()
    }

    async fn configured_clients(&self) -> Result<MssqlClients, ProviderError> {
        self.clients.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration(
                "provider is not configured; call configure before reading data sources".to_string(),
            )
        })
    }
}

impl Default for AzureRmProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AzureRmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureRmProvider").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl ProviderService for AzureRmProvider {
    fn schema(&self) -> ProviderSchema {
        ProviderSchema::new()
            .with_provider_config(config::schema())
            .with_data_source(mssql::DATA_SOURCE_TYPE, mssql::schema())
    }

    #[instrument(skip_all)]
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validate(&config::schema(), &config);
        if !has_errors(&diagnostics) {
            diagnostics.extend(config::validate_settings(&config, self.env.as_ref()));
        }
        debug!(diagnostics = diagnostics.len(), "provider config validated");
        Ok(diagnostics)
    }

    #[instrument(skip_all)]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let diagnostics = validate(&config::schema(), &config);
        if has_errors(&diagnostics) {
            warn!(diagnostics = diagnostics.len(), "provider config rejected");
            return Ok(diagnostics);
        }

        let settings = match ProviderConfig::from_value(&config, self.env.as_ref()) {
            Ok(settings) => settings,
            Err(errors) => {
                warn!(diagnostics = errors.len(), "provider config incomplete");
                return Ok(errors);
            },
        };

        let client = ArmClient::new(
            settings.endpoint.clone(),
            settings.subscription_id.clone(),
            &settings.access_token,
        )
        .map_err(|e| ProviderError::Configuration(format!("building ARM client: {}", e)))?;

        *self.clients.write().await = Some(MssqlClients::from_arm(Arc::new(client)));

        info!(
            environment = %settings.environment,
            endpoint = %settings.endpoint,
            "provider configured"
        );
        Ok(diagnostics)
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        self.clients.write().await.take();
        info!("provider stopped");
        Ok(())
    }

    #[instrument(skip(self, config))]
    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        match data_source_type {
            mssql::DATA_SOURCE_TYPE => Ok(mssql::validate_config(&config)),
            other => Err(unknown_data_source(other)),
        }
    }

    #[instrument(skip(self, config))]
    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        if data_source_type != mssql::DATA_SOURCE_TYPE {
            return Err(unknown_data_source(data_source_type));
        }

        let input = MssqlServerDataSourceConfig::from_value(&config)
            .map_err(|diagnostics| ProviderError::Validation(summarize(&diagnostics)))?;
        let clients = self.configured_clients().await?;

        mssql::read(&clients, &input).await.inspect_err(|e| {
            error!(error = %e, "data source read failed");
        })
    }
}

fn unknown_data_source(data_source_type: &str) -> ProviderError {
    ProviderError::UnknownResource(format!("Unknown data source type: {}", data_source_type))
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| match (&d.attribute, &d.detail) {
            (Some(attribute), Some(detail)) => format!("{}: {} ({})", attribute, d.summary, detail),
            (Some(attribute), None) => format!("{}: {}", attribute, d.summary),
            (None, Some(detail)) => format!("{} ({})", d.summary, detail),
            (None, None) => d.summary.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
