//! Configuration for notification accounts.
//!
//! This module defines the settings structs for webhook accounts and their
//! message defaults. It uses the `figment` crate to load configuration from
//! a TOML file and merge it with environment variables. Everything here is
//! loaded once at startup and immutable thereafter.

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Raised when an account's settings cannot produce a usable account.
/// Construction-time only; a constructed account never sees these.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("invalid slack account [{account}] settings. missing required [url] setting")]
    MissingUrl { account: String },

    #[error("invalid slack account [{account}] settings. invalid [url] setting: {reason}")]
    InvalidUrl { account: String, reason: String },
}

/// Top-level notification configuration: shared defaults plus named accounts.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct NotificationConfig {
    /// Settings applied when an account omits a value (currently the webhook
    /// URL).
    #[serde(default)]
    pub defaults: AccountConfig,
    /// Named delivery accounts.
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountConfig>,
}

/// Settings for a single delivery account.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AccountConfig {
    /// The incoming webhook URL for this account.
    pub url: Option<String>,
    /// Fallback values applied when a message template omits a field.
    #[serde(default)]
    pub message_defaults: MessageDefaults,
}

/// Account-scoped fallback values. These are concrete strings, never
/// templates; they are used verbatim at render time.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct MessageDefaults {
    /// Fallback sender name.
    pub from: Option<String>,
    /// Fallback channel list. Empty means "the webhook's own default channel".
    #[serde(default)]
    pub to: Vec<String>,
    /// Fallback icon (emoji name or image URL).
    pub icon: Option<String>,
    /// Fallback message body.
    pub text: Option<String>,
    /// Fallbacks for attachment fields.
    #[serde(default)]
    pub attachment: AttachmentDefaults,
}

/// Fallback values for attachment templates.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct AttachmentDefaults {
    pub fallback: Option<String>,
    pub color: Option<String>,
    pub pretext: Option<String>,
    pub title: Option<String>,
    pub title_link: Option<String>,
    pub text: Option<String>,
}

impl NotificationConfig {
    /// Loads the notification configuration from the specified TOML file,
    /// allowing overrides from `SLACKWIRE_`-prefixed environment variables.
    pub fn load(config_path: &str) -> Result<Self> {
        let config: NotificationConfig = Figment::new()
            .merge(Serialized::defaults(NotificationConfig::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("SLACKWIRE_").split("__"))
            .extract()?;
        Ok(config)
    }
}
