use serde::{Deserialize, Serialize};

/// Prefix and suffix of the placeholder values shipped in sample configs
/// (e.g. `YOUR_GEMINI_API_KEY_HERE`). A credential equal to such a value
/// counts as unset.
pub const PLACEHOLDER_PREFIX: &str = "YOUR_";
pub const PLACEHOLDER_SUFFIX: &str = "_HERE";

/// Where a credential comes from.
///
/// Precedence when resolving: `key`, then the OS keychain
/// (`service` + `account`), then `env`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CredentialConfig {
    /// Env var containing the value.
    #[serde(default)]
    pub env: Option<String>,
    /// Direct value (for config-only setups; prefer env or keychain).
    #[serde(default)]
    pub key: Option<String>,
    /// Keychain service name (e.g., "gemrelay").
    #[serde(default)]
    pub service: Option<String>,
    /// Keychain account name (e.g., "gemini-api-key").
    #[serde(default)]
    pub account: Option<String>,
}

impl CredentialConfig {
    pub fn from_env(var: &str) -> Self {
        Self {
            env: Some(var.into()),
            ..Default::default()
        }
    }

    /// Human readable description of the source, for diagnostics.
    pub fn describe(&self) -> String {
        if self.key.is_some() {
            return "config key".into();
        }
        match (&self.service, &self.account, &self.env) {
            (Some(s), Some(a), _) => format!("keychain {s}/{a}"),
            (_, _, Some(env)) => format!("env {env}"),
            _ => "unset".into(),
        }
    }
}

/// Whether a raw credential value is absent for all practical purposes:
/// blank, or still the shipped placeholder.
pub fn is_unset_credential(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || (v.starts_with(PLACEHOLDER_PREFIX) && v.ends_with(PLACEHOLDER_SUFFIX))
}
