//! Multi-account credential registry
//!
//! Skills that talk to several workspaces keep a map of account name to
//! credential. Resolution is a pure function of the registry and the
//! selectors, so it can be tested without mutating the environment.

use super::types::AuthConfig;
use crate::error::{Error, Result};
use crate::types::AuthScheme;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One configured account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEntry {
    /// How the credential is sent
    #[serde(default)]
    pub scheme: AuthScheme,
    /// Literal credential
    #[serde(default)]
    pub credential: Option<String>,
    /// Name of an environment variable holding the credential
    #[serde(default)]
    pub credential_env: Option<String>,
    /// Header name for the `header` scheme
    #[serde(default)]
    pub header_name: Option<String>,
    /// Endpoint override for this account
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl AccountEntry {
    /// Create an entry from a literal credential
    pub fn new(scheme: AuthScheme, credential: impl Into<String>) -> Self {
        Self {
            scheme,
            credential: Some(credential.into()),
            ..Default::default()
        }
    }

    /// Turn the entry into an auth config.
    ///
    /// `lookup` is consulted for `credential_env`; a literal `credential`
    /// takes precedence.
    pub fn auth_config<F>(&self, name: &str, lookup: F) -> Result<AuthConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credential = match (&self.credential, &self.credential_env) {
            (Some(value), _) => value.clone(),
            (None, Some(var)) => lookup(var).filter(|v| !v.is_empty()).ok_or_else(|| {
                Error::invalid_value(
                    format!("accounts.{name}.credential_env"),
                    format!("environment variable '{var}' is not set"),
                )
            })?,
            (None, None) => {
                return Err(Error::missing_field(format!("accounts.{name}.credential")));
            }
        };

        Ok(AuthConfig::from_scheme(
            self.scheme,
            credential,
            self.header_name.as_deref(),
        ))
    }
}

/// Named accounts with an optional default
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRegistry {
    /// Account used when no selector matches
    #[serde(default)]
    pub default: Option<String>,
    /// Accounts by name
    #[serde(default)]
    pub entries: BTreeMap<String, AccountEntry>,
}

impl AccountRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account
    #[must_use]
    pub fn with_account(mut self, name: impl Into<String>, entry: AccountEntry) -> Self {
        self.entries.insert(name.into(), entry);
        self
    }

    /// Set the default account
    #[must_use]
    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default = Some(name.into());
        self
    }

    /// Check if no accounts are configured
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Account names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Look up an account by name, ignoring ASCII case
    pub fn get(&self, name: &str) -> Option<(&str, &AccountEntry)> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(key, entry)| (key.as_str(), entry))
    }

    /// Pick an account.
    ///
    /// Order: explicit selector, inferred selector, configured default, the
    /// single configured account. An unknown explicit selector is an error;
    /// an unknown inferred selector is ignored.
    pub fn resolve(
        &self,
        explicit: Option<&str>,
        inferred: Option<&str>,
    ) -> Result<(&str, &AccountEntry)> {
        if let Some(selector) = explicit {
            return self.get(selector).ok_or_else(|| Error::UnknownAccount {
                selector: selector.to_string(),
                available: self.names(),
            });
        }

        if let Some(found) = inferred.and_then(|selector| self.get(selector)) {
            return Ok(found);
        }

        if let Some(default) = &self.default {
            return self.get(default).ok_or_else(|| {
                Error::invalid_value(
                    "accounts.default",
                    format!("'{default}' is not a configured account"),
                )
            });
        }

        let mut iter = self.entries.iter();
        match (iter.next(), iter.next()) {
            (Some((name, entry)), None) => Ok((name.as_str(), entry)),
            (None, _) => Err(Error::config("no accounts configured")),
            _ => Err(Error::AmbiguousAccount {
                available: self.names(),
            }),
        }
    }
}
