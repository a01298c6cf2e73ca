//! Reference types handed to the provider by the reconciliation loop.
//!
//! A [`RemoteRef`] points at one vault object. Its key carries the object
//! kind as a prefix (`cert/tls-cert`, `key/signing`); keys without a prefix
//! address secrets. [`ObjectRef`] is the parsed form.

use crate::{ProviderError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind used when a key carries no type prefix.
pub const DEFAULT_OBJECT_KIND: ObjectKind = ObjectKind::Secret;

/// Pointer to a single vault object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRef {
    /// `<type>/<name>` or a bare secret name
    pub key: String,

    /// Object version; latest when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Dotted path into a JSON secret value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
}

impl RemoteRef {
    /// Creates a reference to the latest version of `key`.
    ///
    /// # Example
    ///
    /// ```
    /// use azkv_provider::RemoteRef;
    ///
    /// let r = RemoteRef::new("secret/db-creds").with_property("user");
    /// assert_eq!(r.key, "secret/db-creds");
    /// assert_eq!(r.property.as_deref(), Some("user"));
    /// assert!(r.version.is_none());
    /// ```
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    /// Pins the reference to an object version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Selects one field of a JSON secret value.
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// Version to request, with empty strings treated as "latest".
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref().filter(|v| !v.is_empty())
    }

    /// Property to extract, with empty strings treated as "whole value".
    pub fn property(&self) -> Option<&str> {
        self.property.as_deref().filter(|p| !p.is_empty())
    }
}

/// Name filter for vault-wide listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NameFilter {
    /// Regular expression matched (unanchored) against the secret name
    pub regexp: String,
}

/// Filter for [`get_all_secrets`](crate::SecretsClient::get_all_secrets).
///
/// An empty filter selects every enabled secret.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FindRef {
    /// Optional name regex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<NameFilter>,

    /// Tags that must all be present with equal values
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

impl FindRef {
    /// Creates a filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the listing to names matching `regexp`.
    pub fn with_name_regexp(mut self, regexp: impl Into<String>) -> Self {
        self.name = Some(NameFilter {
            regexp: regexp.into(),
        });
        self
    }

    /// Requires tag `key` to be present with `value`.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Name regex, if one is configured and non-empty.
    pub fn name_regexp(&self) -> Option<&str> {
        self.name
            .as_ref()
            .map(|n| n.regexp.as_str())
            .filter(|r| !r.is_empty())
    }
}

/// Kind of vault object a reference addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A secret value
    Secret,
    /// An X.509 certificate, returned as DER
    Cert,
    /// A key, returned as a JSON web key
    Key,
}

impl ObjectKind {
    /// Tag used in reference keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Secret => "secret",
            Self::Cert => "cert",
            Self::Key => "key",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "secret" => Some(Self::Secret),
            "cert" => Some(Self::Cert),
            "key" => Some(Self::Key),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Splits a key on its first `/` into `(type tag, name)`.
///
/// Keys without a `/` are secret names.
pub fn split_key(key: &str) -> (&str, &str) {
    match key.split_once('/') {
        Some((tag, name)) => (tag, name),
        None => (DEFAULT_OBJECT_KIND.as_str(), key),
    }
}

/// Parses only the kind of a key, ignoring whether the name is empty.
///
/// # Errors
///
/// Returns [`ProviderError::UnknownObjectType`] for an unrecognized prefix.
pub fn parse_kind(key: &str) -> Result<ObjectKind> {
    let (tag, name) = split_key(key);
    ObjectKind::from_tag(tag).ok_or_else(|| ProviderError::UnknownObjectType(name.to_string()))
}

/// A reference key parsed into kind and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectRef {
    /// `secret/<name>` or a bare name
    Secret(String),
    /// `cert/<name>`
    Cert(String),
    /// `key/<name>`
    Key(String),
}

impl ObjectRef {
    /// Parses a reference key.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::UnknownObjectType`]: prefix is not secret, cert or key
    /// - [`ProviderError::EmptyName`]: nothing follows the prefix
    ///
    /// # Example
    ///
    /// ```
    /// use azkv_provider::ObjectRef;
    ///
    /// assert_eq!(ObjectRef::parse("db-pass").unwrap(), ObjectRef::Secret("db-pass".into()));
    /// assert_eq!(ObjectRef::parse("cert/tls").unwrap(), ObjectRef::Cert("tls".into()));
    /// let nested = ObjectRef::parse("secret/db/pass").unwrap();
    /// assert_eq!(nested, ObjectRef::Secret("db/pass".into()));
    /// assert!(ObjectRef::parse("key/").is_err());
    /// assert!(ObjectRef::parse("blob/x").is_err());
    /// ```
    pub fn parse(key: &str) -> Result<Self> {
        let kind = parse_kind(key)?;
        let (_, name) = split_key(key);
        if name.is_empty() {
            return Err(ProviderError::EmptyName(kind));
        }

        let name = name.to_string();
        Ok(match kind {
            ObjectKind::Secret => Self::Secret(name),
            ObjectKind::Cert => Self::Cert(name),
            ObjectKind::Key => Self::Key(name),
        })
    }

    /// Kind of the referenced object.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Secret(_) => ObjectKind::Secret,
            Self::Cert(_) => ObjectKind::Cert,
            Self::Key(_) => ObjectKind::Key,
        }
    }

    /// Object name inside the vault.
    pub fn name(&self) -> &str {
        match self {
            Self::Secret(name) | Self::Cert(name) | Self::Key(name) => name,
        }
    }
}
