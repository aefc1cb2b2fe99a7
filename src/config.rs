//! Configuration management
//!
//! Loads exchange API credentials from a JSON file keyed by exchange name and
//! flattens them into one [`Account`] per set of keys. An exchange entry is
//! either a single `{apiKey, secret, password?}` object or a mapping of such
//! objects keyed by account label:
//!
//! ```json
//! {
//!   "binance": {"apiKey": "...", "secret": "..."},
//!   "bybit": {
//!     "main": {"apiKey": "...", "secret": "..."},
//!     "sub1": {"apiKey": "...", "secret": "..."}
//!   }
//! }
//! ```
//!
//! Credentials can also come from the environment (`.env` is loaded at
//! startup): `<EXCHANGE>_API_KEY` and `<EXCHANGE>_API_SECRET`, plus
//! `<EXCHANGE>_API_PASSWORD` for Bitget, replace or add that exchange's
//! `default` account.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::common::Credentials;
use crate::exchange::ExchangeKind;

/// Environment variable overriding the credentials file path
pub const API_KEYS_FILE_ENV: &str = "API_KEYS_FILE";

/// Label given to an exchange's only account
pub const DEFAULT_ACCOUNT_LABEL: &str = "default";

/// One set of exchange credentials
#[derive(Debug, Clone)]
pub struct Account {
    pub exchange: ExchangeKind,
    pub label: String,
    pub credentials: Credentials,
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.exchange, self.label)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CredentialEntry {
    Single(Credentials),
    Accounts(BTreeMap<String, Credentials>),
}

/// The credentials file path, honouring `API_KEYS_FILE`
pub fn resolve_api_keys_path(default: impl AsRef<Path>) -> PathBuf {
    std::env::var(API_KEYS_FILE_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| default.as_ref().to_path_buf())
}

/// Load every account from the credentials file, then apply env overrides
pub fn load_accounts(path: impl AsRef<Path>) -> Result<Vec<Account>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("API keys file not found: {}", path.display()))?;

    let mut accounts = parse_accounts(&contents)
        .with_context(|| format!("Failed to parse API keys file {}", path.display()))?;
    apply_env_overrides(&mut accounts, |name| std::env::var(name).ok());

    info!("Loaded {} exchange accounts from {}", accounts.len(), path.display());
    Ok(accounts)
}

/// Flatten the credentials JSON into a list of accounts
pub fn parse_accounts(json: &str) -> Result<Vec<Account>> {
    let entries: BTreeMap<String, CredentialEntry> =
        serde_json::from_str(json).context("Invalid API keys JSON")?;

    let mut accounts = Vec::new();
    for (name, entry) in entries {
        let exchange: ExchangeKind = name.parse().map_err(anyhow::Error::msg)?;
        match entry {
            CredentialEntry::Single(credentials) => accounts.push(Account {
                exchange,
                label: DEFAULT_ACCOUNT_LABEL.to_string(),
                credentials,
            }),
            CredentialEntry::Accounts(labelled) => {
                accounts.extend(labelled.into_iter().map(|(label, credentials)| Account {
                    exchange,
                    label,
                    credentials,
                }))
            }
        }
    }
    Ok(accounts)
}

/// Replace or add `default` accounts from `<EXCHANGE>_API_KEY`/`_API_SECRET`
pub fn apply_env_overrides(accounts: &mut Vec<Account>, lookup: impl Fn(&str) -> Option<String>) {
    for exchange in ExchangeKind::ALL {
        let prefix = exchange.env_prefix();
        let (Some(api_key), Some(secret)) = (
            lookup(&format!("{}_API_KEY", prefix)),
            lookup(&format!("{}_API_SECRET", prefix)),
        ) else {
            continue;
        };

        let mut credentials = Credentials::new(api_key, secret);
        if let Some(password) = lookup(&format!("{}_API_PASSWORD", prefix)) {
            credentials = credentials.with_password(password);
        }

        match accounts
            .iter_mut()
            .find(|a| a.exchange == exchange && a.label == DEFAULT_ACCOUNT_LABEL)
        {
            Some(account) => account.credentials = credentials,
            None => accounts.push(Account {
                exchange,
                label: DEFAULT_ACCOUNT_LABEL.to_string(),
                credentials,
            }),
        }
        info!("Using {} credentials from environment", exchange);
    }
}
