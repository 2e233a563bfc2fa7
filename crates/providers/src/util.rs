//! Shared utility functions for provider clients.

use gr_domain::config::{is_unset_credential, CredentialConfig};
use gr_domain::error::{Error, Result};
use serde_json::Value;

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`]. The request URL is dropped from the message since it
/// carries the `key=` query parameter.
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    let timeout = e.is_timeout();
    let message = redact_url_key(&error_chain(&e.without_url()));
    if timeout {
        Error::Timeout(message)
    } else {
        Error::Http(message)
    }
}

/// Display of an error followed by its sources, joined with `": "`.
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut out = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.ends_with(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}

/// Build the domain error for a non-2xx response, preferring the
/// provider's own `error.message` over the raw body.
pub(crate) fn transport_error(provider: &str, status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| truncate_chars(body.trim(), 300));
    Error::Transport {
        provider: provider.to_owned(),
        status,
        message,
    }
}

/// Redact API key from URL for safe logging.
pub(crate) fn redact_url_key(url: &str) -> String {
    if let Some(idx) = url.find("key=") {
        let prefix = &url[..idx + 4];
        let rest = &url[idx + 4..];
        let end = rest.find('&').unwrap_or(rest.len());
        format!("{prefix}[REDACTED]{}", &rest[end..])
    } else {
        url.to_string()
    }
}

/// First `max` characters of `s`, on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Resolve a credential from its [`CredentialConfig`].
///
/// Precedence:
/// 1. `key` field (plaintext; warn)
/// 2. `service` + `account` → OS keychain via `keyring`
/// 3. `env` field (reads environment variable)
///
/// Blank values and shipped placeholders (`YOUR_..._HERE`) count as
/// absent and fall through to the next source. `name` only labels log
/// lines and the returned error.
pub fn resolve_credential(cfg: &CredentialConfig, name: &str) -> Result<String> {
    if let Some(ref key) = cfg.key {
        if !is_unset_credential(key) {
            tracing::warn!(
                credential = name,
                "credential loaded from plaintext config field 'key'; prefer 'env' or keychain"
            );
            return Ok(key.clone());
        }
    }

    if let (Some(ref service), Some(ref account)) = (&cfg.service, &cfg.account) {
        match resolve_from_keychain(service, account) {
            Ok(secret) if !is_unset_credential(&secret) => return Ok(secret),
            Ok(_) => {
                tracing::warn!(credential = name, "keychain entry is blank, falling through to env");
            }
            Err(e) => {
                tracing::warn!(
                    credential = name,
                    service = %service,
                    account = %account,
                    error = %e,
                    "keychain lookup failed, falling through to env"
                );
            }
        }
    }

    if let Some(ref env_var) = cfg.env {
        if let Ok(value) = std::env::var(env_var) {
            if !is_unset_credential(&value) {
                return Ok(value);
            }
            tracing::warn!(credential = name, env_var = %env_var, "environment variable holds a placeholder");
        }
    }

    Err(Error::NotConfigured(format!("{name} ({})", cfg.describe())))
}

/// Like [`resolve_credential`] but logs and returns `None` when absent, for
/// clients that degrade at call time instead of failing to construct.
pub fn optional_credential(cfg: &CredentialConfig, name: &str) -> Option<String> {
    match resolve_credential(cfg, name) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(credential = name, error = %e, "credential missing, feature disabled");
            None
        }
    }
}

/// Try to read a secret from the OS keychain.
pub fn resolve_from_keychain(service: &str, account: &str) -> Result<String> {
    let entry = keyring::Entry::new(service, account)
        .map_err(|e| Error::NotConfigured(format!("keyring entry creation failed: {e}")))?;
    entry
        .get_password()
        .map_err(|e| Error::NotConfigured(format!("keyring get_password failed: {e}")))
}
