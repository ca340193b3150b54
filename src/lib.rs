//! slackwire - templated Slack webhook notifications
//!
//! This library renders a declarative message template against a runtime
//! context model (with account-level defaults and data-driven attachments)
//! and delivers the result to one or more channels over an incoming webhook,
//! reporting an isolated per-channel delivery outcome.
pub mod account;
pub mod config;
pub mod message;
pub mod sent;
pub mod template;
pub mod transport;

// Re-export the main entry points for convenience
pub use account::Account;
pub use config::{
    AccountConfig, AttachmentDefaults, MessageDefaults, NotificationConfig, SettingsError,
};
pub use message::{
    Attachment, AttachmentTemplate, DynamicAttachments, MessageTemplate, ParseError, SlackMessage,
};
pub use sent::{Delivery, SentMessage, SentMessages};
pub use template::{PlaceholderEngine, TemplateEngine, TemplateError, TextTemplate};
pub use transport::{HttpResponseData, HttpTransport, JsonRequest, ReqwestTransport};
