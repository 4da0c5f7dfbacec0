//! Run configuration, read from TOML.
//!
//! ```toml
//! project_id = "acme-dev"
//!
//! [store]
//! token_env = "DATASTORE_ACCESS_TOKEN"
//!
//! [[kinds]]
//! name = "Journey"
//! namespace = "tenant-a"
//! identity = "property:slug"
//!
//! [environments.prod]
//! project_id = "acme-prod"
//! ```

use crate::{SyncError, SyncResult};
use docstore_model::IdentityStrategy;
use docstore_storage::RestConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

fn default_identity() -> String {
    "key".to_string()
}

/// How to reach the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSettings {
    /// Overrides the default endpoint and `DATASTORE_EMULATOR_HOST`.
    pub endpoint: Option<String>,
    /// Environment variable holding a bearer token.
    pub token_env: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl StoreSettings {
    /// Builds the REST settings for `project_id`.
    ///
    /// A named token variable that is unset is a configuration error.
    pub fn rest_config(&self, project_id: &str) -> SyncResult<RestConfig> {
        let mut config = RestConfig::from_env(project_id);
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        if let Some(var) = &self.token_env {
            let token = std::env::var(var).map_err(|_| {
                SyncError::Config(format!("token variable {var} is not set"))
            })?;
            config.access_token = Some(token);
        }
        Ok(config)
    }
}

/// One kind to synchronise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KindConfig {
    pub name: String,
    /// `""` is the default namespace.
    pub namespace: String,
    /// Identity token: `key`, `property:<name>` or `parent:<kind>`.
    #[serde(default = "default_identity")]
    pub identity: String,
}

impl KindConfig {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            identity: default_identity(),
        }
    }

    #[must_use]
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    pub fn strategy(&self) -> SyncResult<IdentityStrategy> {
        IdentityStrategy::from_token(&self.identity)
            .map_err(|e| SyncError::Config(format!("kind {}: {e}", self.name)))
    }

    /// `namespace/kind`, or just the kind in the default namespace.
    pub fn label(&self) -> String {
        kind_label(&self.namespace, &self.name)
    }
}

/// A named environment for store-to-store reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    pub project_id: String,
    #[serde(default)]
    pub store: Option<StoreSettings>,
    /// Replaces the top-level kinds, matched by position.
    #[serde(default)]
    pub kinds: Option<Vec<KindConfig>>,
}

/// An environment with every default filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEnvironment {
    pub name: String,
    pub project_id: String,
    pub store: StoreSettings,
    pub kinds: Vec<KindConfig>,
}

/// The whole run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub project_id: String,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub kinds: Vec<KindConfig>,
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentConfig>,
}

impl RunConfig {
    /// Reads and validates a configuration file.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Parses and validates a configuration.
    pub fn from_toml_str(text: &str) -> SyncResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| SyncError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.project_id.trim().is_empty() {
            return Err(SyncError::Config("project_id is empty".into()));
        }
        if self.kinds.is_empty() {
            return Err(SyncError::Config("no kinds configured".into()));
        }
        validate_kinds(&self.kinds)?;

        for (name, env) in &self.environments {
            if env.project_id.trim().is_empty() {
                return Err(SyncError::Config(format!(
                    "environment {name}: project_id is empty"
                )));
            }
            if let Some(kinds) = &env.kinds {
                if kinds.len() != self.kinds.len() {
                    return Err(SyncError::Config(format!(
                        "environment {name}: {} kinds, expected {}",
                        kinds.len(),
                        self.kinds.len()
                    )));
                }
                validate_kinds(kinds).map_err(|e| match e {
                    SyncError::Config(msg) => {
                        SyncError::Config(format!("environment {name}: {msg}"))
                    }
                    other => other,
                })?;
            }
        }
        Ok(())
    }

    /// The configuration of `(namespace, kind)`, if listed.
    pub fn kind(&self, namespace: &str, kind: &str) -> Option<&KindConfig> {
        self.kinds
            .iter()
            .find(|k| k.namespace == namespace && k.name == kind)
    }

    /// The identity strategy for `(namespace, kind)`; `key` when unlisted.
    pub fn strategy_for(&self, namespace: &str, kind: &str) -> SyncResult<IdentityStrategy> {
        match self.kind(namespace, kind) {
            Some(k) => k.strategy(),
            None => Ok(IdentityStrategy::ByKey),
        }
    }

    /// Looks up a named environment and fills in defaults from the top level.
    pub fn environment(&self, name: &str) -> SyncResult<ResolvedEnvironment> {
        let env = self
            .environments
            .get(name)
            .ok_or_else(|| SyncError::Config(format!("unknown environment {name:?}")))?;
        Ok(ResolvedEnvironment {
            name: name.to_string(),
            project_id: env.project_id.clone(),
            store: env.store.clone().unwrap_or_else(|| self.store.clone()),
            kinds: env.kinds.clone().unwrap_or_else(|| self.kinds.clone()),
        })
    }
}

pub(crate) fn kind_label(namespace: &str, kind: &str) -> String {
    if namespace.is_empty() {
        kind.to_string()
    } else {
        format!("{namespace}/{kind}")
    }
}

fn validate_kinds(kinds: &[KindConfig]) -> SyncResult<()> {
    for kind in kinds {
        if kind.name.trim().is_empty() {
            return Err(SyncError::Config("kind with empty name".into()));
        }
        kind.strategy()?;
    }
    Ok(())
}
