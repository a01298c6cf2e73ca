//! Error types for provider operations.

use crate::reference::ObjectKind;
use thiserror::Error;

/// Result type alias using [`ProviderError`].
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur while configuring the provider or reading from the vault.
///
/// All errors implement `std::error::Error` and can be chained with `source()`.
/// Nothing here is retried by the provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Store configuration is incomplete or inconsistent.
    #[error("invalid store config: {0}")]
    Config(String),

    /// Neither auth strategy claimed the store configuration.
    #[error("cannot initialize Azure Client: no valid authType was specified")]
    NoValidAuthType,

    /// The identity SDK rejected the credentials.
    #[error("authorization failed: {0}")]
    Authorization(String),

    /// The Kubernetes Secret holding credentials could not be fetched.
    #[error("could not find secret {namespace}/{name}: {source}")]
    KubeSecretNotFound {
        /// Namespace that was searched
        namespace: String,
        /// Secret name
        name: String,
        /// Underlying client error
        #[source]
        source: anyhow::Error,
    },

    /// The Kubernetes Secret exists but has no entry for the selected key.
    #[error("no data for {key:?} in secret '{name}/{namespace}'")]
    KubeKeyMissing {
        /// Missing data key
        key: String,
        /// Secret name
        name: String,
        /// Namespace of the secret
        namespace: String,
    },

    /// Object does not exist in the vault or has no value.
    #[error("object not found: {0}")]
    NotFound(String),

    /// Property selector did not match anything in the secret's JSON value.
    #[error("property {property} does not exist in key {key}")]
    PropertyNotFound {
        /// Requested property path
        property: String,
        /// Reference key the value came from
        key: String,
    },

    /// Secret value has the wrong shape for the requested operation.
    #[error("invalid secret data: {0}")]
    InvalidData(String),

    /// Name filter of a find reference is not a valid regular expression.
    #[error("invalid name regexp: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// Reference key has a type prefix but nothing after it.
    #[error("{0} name cannot be empty")]
    EmptyName(ObjectKind),

    /// Reference key carries a type prefix that is not secret, cert or key.
    #[error("unknown Azure Keyvault object Type for {0}")]
    UnknownObjectType(String),

    /// Operation cannot be served for this kind of object.
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// Vault call failed, with context on which call and which object.
    #[error("{operation} {item}: {source}")]
    VaultOperation {
        /// Operation name (get-secret, get-key, list-secrets, ...)
        operation: String,
        /// Object name
        item: String,
        /// Underlying error
        #[source]
        source: Box<ProviderError>,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error (catch-all, usually an SDK error).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProviderError {
    /// Wraps an error with the vault operation and object it came from.
    ///
    /// # Example
    ///
    /// ```
    /// use azkv_provider::ProviderError;
    ///
    /// let err = ProviderError::NotFound("db-pass".to_string());
    /// let wrapped = ProviderError::vault_op("get-secret", "db-pass", err);
    ///
    /// assert_eq!(
    ///     wrapped.to_string(),
    ///     "get-secret db-pass: object not found: db-pass"
    /// );
    /// ```
    pub fn vault_op(
        operation: impl Into<String>,
        item: impl Into<String>,
        err: ProviderError,
    ) -> Self {
        Self::VaultOperation {
            operation: operation.into(),
            item: item.into(),
            source: Box::new(err),
        }
    }

    /// Returns true for errors caused by requesting something the provider
    /// cannot do, as opposed to a failed lookup.
    pub fn is_not_supported(&self) -> bool {
        match self {
            Self::NotSupported(_) => true,
            Self::VaultOperation { source, .. } => source.is_not_supported(),
            _ => false,
        }
    }
}
