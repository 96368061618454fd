//! Testing utilities for the provider.
//!
//! [`ProviderTester`] drives a [`ProviderService`] the way a host would,
//! [`MockMssql`] stands in for the management API, and the `assert_*`
//! helpers check read results by flatmap path (`tags.%`, `identity.0.type`).
//!
//! # Example
//!
//! ```ignore
//! use hemmer_provider_azurerm::mssql::models::Server;
//! use hemmer_provider_azurerm::testing::{assert_attr, MockMssql, ProviderTester};
//! use hemmer_provider_azurerm::AzureRmProvider;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_read_server() {
//!     let mock = MockMssql::new()
//!         .with_server("rg", "srv", Server::default())
//!         .with_connection_policy("rg", "srv", Default::default());
//!     let tester = ProviderTester::new(AzureRmProvider::with_clients(mock.clients()));
//!
//!     let state = tester
//!         .read_data_source("azurerm_mssql_server", json!({"name": "srv", "resource_group_name": "rg"}))
//!         .await
//!         .unwrap();
//!
//!     assert_attr(&state, "tags.%", "0");
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::arm::ArmError;
use crate::error::ProviderError;
use crate::mssql::models::{Server, ServerAzureAdAdministrator, ServerConnectionPolicy};
use crate::mssql::{
    MssqlClients, ServerAzureAdAdministratorsClient, ServerConnectionPoliciesClient, ServersClient,
};
use crate::provider::ProviderService;
use crate::schema::{Diagnostic, DiagnosticSeverity, ProviderSchema};

/// A test harness for provider implementations.
///
/// Wraps a `ProviderService` and turns error diagnostics into `Err` results.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of data source type names.
    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    /// Validate provider configuration.
    ///
    /// Returns `Err` with the diagnostics if there are errors.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider.
    ///
    /// Returns `Err` with the diagnostics if there are errors.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Stop the provider.
    pub async fn stop(&self) -> Result<(), ProviderError> {
        self.provider.stop().await
    }

    /// Validate a data source configuration.
    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_data_source_config(data_source_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Read a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.read_data_source(data_source_type, config).await
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            },
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// Attribute Assertions
// =========================================================================

/// Look up a flatmap path in a read result.
///
/// Path segments are object keys or list indices. A final `%` yields the size
/// of a map, a final `#` the length of a list. Scalars render the way the host
/// displays them: strings as-is, bools as `true`/`false`.
pub fn attribute_at(state: &Value, path: &str) -> Option<String> {
    let mut current = state;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let last = segments.peek().is_none();
        match (segment, current) {
            ("%", Value::Object(map)) if last => return Some(map.len().to_string()),
            ("#", Value::Array(items)) if last => return Some(items.len().to_string()),
            (key, Value::Object(map)) => current = map.get(key)?,
            (index, Value::Array(items)) => current = items.get(index.parse::<usize>().ok()?)?,
            _ => return None,
        }
    }

    match current {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Assert that the attribute at `path` renders as `expected`.
///
/// # Panics
///
/// Panics if the attribute is missing or differs.
pub fn assert_attr(state: &Value, path: &str, expected: &str) {
    match attribute_at(state, path) {
        Some(actual) => assert_eq!(
            actual, expected,
            "attribute '{}' is {:?}, expected {:?}",
            path, actual, expected
        ),
        None => panic!("attribute '{}' not found in {}", path, state),
    }
}

/// Assert that the attribute at `path` is present and non-empty.
///
/// # Panics
///
/// Panics if the attribute is missing or empty.
pub fn assert_attr_set(state: &Value, path: &str) {
    match attribute_at(state, path) {
        Some(actual) => assert!(!actual.is_empty(), "attribute '{}' is empty", path),
        None => panic!("attribute '{}' not found in {}", path, state),
    }
}

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics
        .iter()
        .filter(|d| matches!(d.severity, DiagnosticSeverity::Error))
        .collect();

    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain at least one error.
///
/// # Panics
///
/// Panics if there are no error diagnostics.
pub fn assert_has_errors(diagnostics: &[Diagnostic]) {
    assert!(
        diagnostics.iter().any(Diagnostic::is_error),
        "Expected at least one error, but got none"
    );
}

/// Assert that diagnostics contain an error with the given summary substring.
///
/// # Panics
///
/// Panics if no error diagnostic contains the given substring.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let has_matching_error = diagnostics
        .iter()
        .any(|d| d.is_error() && d.summary.contains(substring));

    assert!(
        has_matching_error,
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

// =========================================================================
// In-memory Backend
// =========================================================================

/// The upstream lookup a [`MockCall`] went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookup {
    /// `servers/{name}`
    Server,
    /// `servers/{name}/administrators/ActiveDirectory`
    Administrator,
    /// `servers/{name}/connectionPolicies/default`
    ConnectionPolicy,
}

/// A lookup received by [`MockMssql`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// Which lookup was called.
    pub lookup: Lookup,
    /// Resource group passed in.
    pub resource_group: String,
    /// Server name passed in.
    pub server_name: String,
}

type Key = (String, String);

#[derive(Default)]
struct MockState {
    servers: HashMap<Key, Server>,
    administrators: HashMap<Key, ServerAzureAdAdministrator>,
    connection_policies: HashMap<Key, ServerConnectionPolicy>,
    failures: HashMap<(Lookup, Key), u16>,
    delay: Option<Duration>,
    calls: Vec<MockCall>,
}

/// In-memory stand-in for the three `Microsoft.Sql` lookups.
///
/// Anything not registered answers 404. Clones share state, so a test can
/// keep one handle and inspect [`MockMssql::calls`] after handing
/// [`MockMssql::clients`] to a provider.
#[derive(Clone, Default)]
pub struct MockMssql {
    state: Arc<Mutex<MockState>>,
}

impl MockMssql {
    /// An empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a server.
    pub fn with_server(self, resource_group: &str, name: &str, server: Server) -> Self {
        self.lock().servers.insert(key(resource_group, name), server);
        self
    }

    /// Register the AAD administrator of a server.
    pub fn with_administrator(
        self,
        resource_group: &str,
        name: &str,
        admin: ServerAzureAdAdministrator,
    ) -> Self {
        self.lock()
            .administrators
            .insert(key(resource_group, name), admin);
        self
    }

    /// Register the connection policy of a server.
    pub fn with_connection_policy(
        self,
        resource_group: &str,
        name: &str,
        policy: ServerConnectionPolicy,
    ) -> Self {
        self.lock()
            .connection_policies
            .insert(key(resource_group, name), policy);
        self
    }

    /// Make a lookup answer with `status`, whatever is registered.
    pub fn with_failure(self, lookup: Lookup, resource_group: &str, name: &str, status: u16) -> Self {
        self.lock()
            .failures
            .insert((lookup, key(resource_group, name)), status);
        self
    }

    /// Delay every answer by `delay`.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.lock().delay = Some(delay);
        self
    }

    /// Lookups received so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Clients backed by this mock.
    pub fn clients(&self) -> MssqlClients {
        MssqlClients {
            servers: Arc::new(self.clone()),
            administrators: Arc::new(self.clone()),
            connection_policies: Arc::new(self.clone()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn answer<T, F>(
        &self,
        lookup: Lookup,
        resource_group: &str,
        name: &str,
        select: F,
    ) -> Result<T, ArmError>
    where
        F: FnOnce(&MockState, &Key) -> Option<T>,
    {
        let k = key(resource_group, name);
        let delay = {
            let mut state = self.lock();
            state.calls.push(MockCall {
                lookup,
                resource_group: resource_group.to_string(),
                server_name: name.to_string(),
            });
            state.delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.lock();
        if let Some(status) = state.failures.get(&(lookup, k.clone())) {
            return Err(ArmError::response(
                *status,
                "MockFailure",
                format!("injected {:?} failure for {}/{}", lookup, resource_group, name),
            ));
        }
        select(&state, &k).ok_or_else(|| {
            ArmError::not_found(format!(
                "{:?} for {}/{} was not found",
                lookup, resource_group, name
            ))
        })
    }
}

impl std::fmt::Debug for MockMssql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockMssql").finish_non_exhaustive()
    }
}

fn key(resource_group: &str, name: &str) -> Key {
    (resource_group.to_string(), name.to_string())
}

#[async_trait]
impl ServersClient for MockMssql {
    async fn get(&self, resource_group: &str, server_name: &str) -> Result<Server, ArmError> {
        self.answer(Lookup::Server, resource_group, server_name, |state, k| {
            state.servers.get(k).cloned()
        })
        .await
    }
}

#[async_trait]
impl ServerAzureAdAdministratorsClient for MockMssql {
    async fn get(
        &self,
        resource_group: &str,
        server_name: &str,
    ) -> Result<ServerAzureAdAdministrator, ArmError> {
        self.answer(Lookup::Administrator, resource_group, server_name, |state, k| {
            state.administrators.get(k).cloned()
        })
        .await
    }
}

#[async_trait]
impl ServerConnectionPoliciesClient for MockMssql {
    async fn get(
        &self,
        resource_group: &str,
        server_name: &str,
    ) -> Result<ServerConnectionPolicy, ArmError> {
        self.answer(Lookup::ConnectionPolicy, resource_group, server_name, |state, k| {
            state.connection_policies.get(k).cloned()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_at() {
        let state = json!({
            "name": "srv",
            "public_network_access_enabled": true,
            "tags": {"ENV": "Staging", "database": "test"},
            "identity": [{"type": "SystemAssigned"}],
            "azuread_administrator": []
        });

        assert_eq!(attribute_at(&state, "name"), Some("srv".to_string()));
        assert_eq!(
            attribute_at(&state, "public_network_access_enabled"),
            Some("true".to_string())
        );
        assert_eq!(attribute_at(&state, "tags.%"), Some("2".to_string()));
        assert_eq!(attribute_at(&state, "tags.ENV"), Some("Staging".to_string()));
        assert_eq!(attribute_at(&state, "identity.#"), Some("1".to_string()));
        assert_eq!(
            attribute_at(&state, "identity.0.type"),
            Some("SystemAssigned".to_string())
        );
        assert_eq!(attribute_at(&state, "azuread_administrator.#"), Some("0".to_string()));
        assert_eq!(attribute_at(&state, "identity.1.type"), None);
        assert_eq!(attribute_at(&state, "tags"), None);
        assert_eq!(attribute_at(&state, "location"), None);
    }

    #[test]
    fn test_assert_attr() {
        let state = json!({"version": "12.0", "tags": {}});
        assert_attr(&state, "version", "12.0");
        assert_attr(&state, "tags.%", "0");
        assert_attr_set(&state, "version");
    }

    #[test]
    #[should_panic(expected = "attribute 'version' is")]
    fn test_assert_attr_fails() {
        assert_attr(&json!({"version": "2.0"}), "version", "12.0");
    }

    #[test]
    #[should_panic(expected = "is empty")]
    fn test_assert_attr_set_fails() {
        assert_attr_set(&json!({"location": ""}), "location");
    }

    #[test]
    fn test_assert_no_errors() {
        let diagnostics = vec![Diagnostic::warning("Just a warning")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_fails() {
        let diagnostics = vec![Diagnostic::error("An error")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    fn test_assert_error_contains() {
        let diagnostics = vec![Diagnostic::error("Invalid server name")];
        assert_has_errors(&diagnostics);
        assert_error_contains(&diagnostics, "server name");
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("Missing subscription ID").with_attribute("subscription_id"),
            Diagnostic::error("Invalid endpoint").with_detail("relative URL without a base"),
        ]);

        let display = format!("{}", err);
        assert!(display.contains("Missing subscription ID"));
        assert!(display.contains("(at subscription_id)"));
        assert!(display.contains("relative URL without a base"));
    }

    #[tokio::test]
    async fn test_mock_answers_registered_and_missing() {
        let mock = MockMssql::new().with_server(
            "rg",
            "srv",
            Server {
                name: Some("srv".to_string()),
                ..Default::default()
            },
        );
        let clients = mock.clients();

        let server = clients.servers.get("rg", "srv").await.unwrap();
        assert_eq!(server.name.as_deref(), Some("srv"));

        let err = clients.administrators.get("rg", "srv").await.unwrap_err();
        assert!(err.is_not_found());

        assert_eq!(
            mock.calls(),
            vec![
                MockCall {
                    lookup: Lookup::Server,
                    resource_group: "rg".to_string(),
                    server_name: "srv".to_string(),
                },
                MockCall {
                    lookup: Lookup::Administrator,
                    resource_group: "rg".to_string(),
                    server_name: "srv".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_mock_injected_failure() {
        let mock = MockMssql::new()
            .with_connection_policy("rg", "srv", ServerConnectionPolicy::default())
            .with_failure(Lookup::ConnectionPolicy, "rg", "srv", 503);

        let err = mock.clients().connection_policies.get("rg", "srv").await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_not_found());
    }
}
