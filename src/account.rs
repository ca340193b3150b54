//! Delivery accounts: endpoint configuration plus the send fan-out.

use std::sync::Arc;

use reqwest::Url;
use tracing::error;

use crate::config::{AccountConfig, MessageDefaults, SettingsError};
use crate::message::SlackMessage;
use crate::sent::{SentMessage, SentMessages};
use crate::transport::{HttpTransport, JsonRequest};

/// One configured notification endpoint. The webhook URL is resolved and
/// validated at construction; a constructed account can always attempt
/// delivery.
pub struct Account {
    name: String,
    url: Url,
    transport: Arc<dyn HttpTransport>,
    message_defaults: MessageDefaults,
}

impl Account {
    /// Builds an account from its settings, falling back to the shared
    /// default settings for the webhook URL. Fails fast on a missing or
    /// unparseable URL.
    pub fn new(
        name: impl Into<String>,
        settings: &AccountConfig,
        default_settings: &AccountConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, SettingsError> {
        let name = name.into();
        let url = resolve_url(&name, settings, default_settings)?;
        Ok(Account {
            name,
            url,
            transport,
            message_defaults: settings.message_defaults.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message_defaults(&self) -> &MessageDefaults {
        &self.message_defaults
    }

    /// Delivers the message to every resolved destination, or once with no
    /// explicit channel when the destination list is empty.
    ///
    /// Destinations are attempted sequentially, in list order, and one
    /// failure never prevents the remaining attempts. This never returns an
    /// error; callers inspect each [`SentMessage`] for the per-destination
    /// outcome.
    pub async fn send(&self, message: &SlackMessage) -> SentMessages {
        if message.to.is_empty() {
            let sent = self.send_to(None, message).await;
            return SentMessages::new(self.name.clone(), vec![sent]);
        }

        let mut sent = Vec::with_capacity(message.to.len());
        for channel in &message.to {
            sent.push(self.send_to(Some(channel), message).await);
        }
        SentMessages::new(self.name.clone(), sent)
    }

    /// One delivery to one (possibly implicit) channel.
    async fn send_to(&self, channel: Option<&str>, message: &SlackMessage) -> SentMessage {
        let request = JsonRequest {
            url: self.url.clone(),
            body: message.payload(channel),
        };
        let channel = channel.map(str::to_string);

        match self.transport.execute(&request).await {
            Ok(response) => SentMessage::responded(channel, message.clone(), request, response),
            Err(e) => {
                error!(account = %self.name, error = %format!("{e:#}"), "failed to execute slack api http request");
                SentMessage::errored(channel, message.clone(), request, format!("{e:#}"))
            }
        }
    }
}

fn resolve_url(
    name: &str,
    settings: &AccountConfig,
    default_settings: &AccountConfig,
) -> Result<Url, SettingsError> {
    let raw = settings
        .url
        .as_deref()
        .or(default_settings.url.as_deref())
        .ok_or_else(|| SettingsError::MissingUrl {
            account: name.to_string(),
        })?;
    Url::parse(raw).map_err(|e| SettingsError::InvalidUrl {
        account: name.to_string(),
        reason: e.to_string(),
    })
}
