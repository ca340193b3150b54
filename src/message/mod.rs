//! The message template model, the renderer, and the resolved message.
//!
//! A [`MessageTemplate`] is parsed once from its document form and rendered
//! per event into a [`SlackMessage`]: field templates are substituted against
//! the context model, unset fields fall back to the account's
//! [`MessageDefaults`], and `from` falls back to the triggering watch id so
//! every outbound message identifies a sender.

pub mod attachment;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::trace;

use crate::config::MessageDefaults;
use crate::template::{TemplateEngine, TemplateError, TextTemplate};
pub use attachment::{Attachment, AttachmentTemplate, DynamicAttachments, Field, FieldTemplate};

/// Template parse failures. Every variant names enough context to point at
/// the offending part of the document.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("expected an object, found {0}")]
    ExpectedObject(String),

    #[error("unknown field [{0}]")]
    UnknownField(String),

    #[error("missing required [{field}] field")]
    MissingField { field: &'static str },

    #[error("[{field}] must be a {expected}")]
    InvalidFieldType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("failed to parse [{field}] field")]
    Field {
        field: &'static str,
        #[source]
        source: Box<ParseError>,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// A resolved, immutable message. Contains only literal values; construct
/// one through [`MessageTemplate::render`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlackMessage {
    /// Sender name. Always set by the renderer.
    pub from: Option<String>,
    /// Destination channels. Empty means "the webhook's default channel".
    pub to: Vec<String>,
    /// Emoji name or image URL.
    pub icon: Option<String>,
    /// Message body.
    pub text: Option<String>,
    /// Resolved attachments, `None` when neither static nor dynamic
    /// attachments produced anything.
    pub attachments: Option<Vec<Attachment>>,
}

impl SlackMessage {
    /// Audit serialization: the full message including its targets.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(from) = &self.from {
            map.insert("from".to_string(), Value::String(from.clone()));
        }
        if !self.to.is_empty() {
            map.insert(
                "to".to_string(),
                Value::Array(self.to.iter().cloned().map(Value::String).collect()),
            );
        }
        if let Some(icon) = &self.icon {
            map.insert("icon".to_string(), Value::String(icon.clone()));
        }
        if let Some(text) = &self.text {
            map.insert("text".to_string(), Value::String(text.clone()));
        }
        if let Some(attachments) = &self.attachments {
            map.insert(
                "attachments".to_string(),
                Value::Array(attachments.iter().map(Attachment::to_value).collect()),
            );
        }
        Value::Object(map)
    }

    /// Wire-body serialization for one delivery. The channel travels in the
    /// body (not in `to`, which only targets the fan-out), and the icon lands
    /// under `icon_url` or `icon_emoji` depending on a plain `"http"` prefix
    /// check, which is the contract the webhook endpoint expects.
    pub fn payload(&self, channel: Option<&str>) -> Value {
        let mut map = Map::new();
        if let Some(channel) = channel {
            map.insert("channel".to_string(), Value::String(channel.to_string()));
        }
        if let Some(from) = &self.from {
            map.insert("username".to_string(), Value::String(from.clone()));
        }
        if let Some(icon) = &self.icon {
            let key = if icon.starts_with("http") {
                "icon_url"
            } else {
                "icon_emoji"
            };
            map.insert(key.to_string(), Value::String(icon.clone()));
        }
        if let Some(text) = &self.text {
            map.insert("text".to_string(), Value::String(text.clone()));
        }
        if let Some(attachments) = &self.attachments {
            if !attachments.is_empty() {
                map.insert(
                    "attachments".to_string(),
                    Value::Array(attachments.iter().map(Attachment::to_value).collect()),
                );
            }
        }
        Value::Object(map)
    }
}

/// Declarative, possibly-parameterized description of a message. Immutable;
/// absent list fields stay `None` so the renderer can tell "not specified"
/// from "specified as empty".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageTemplate {
    from: Option<TextTemplate>,
    to: Option<Vec<TextTemplate>>,
    text: Option<TextTemplate>,
    icon: Option<TextTemplate>,
    attachments: Option<Vec<AttachmentTemplate>>,
    dynamic_attachments: Option<DynamicAttachments>,
}

impl MessageTemplate {
    pub fn builder() -> MessageTemplateBuilder {
        MessageTemplateBuilder::default()
    }

    /// Parses a message template from its document form.
    ///
    /// Recognized fields: `from`, `to` (scalar or array), `text`, `icon`,
    /// `attachments` (scalar or array), `dynamic_attachments`. Anything else
    /// fails with an error naming the field.
    pub fn parse(value: &Value) -> Result<Self, ParseError> {
        let object = value
            .as_object()
            .ok_or_else(|| ParseError::ExpectedObject(value.to_string()))?;

        let mut builder = MessageTemplate::builder();
        for (name, value) in object {
            match name.as_str() {
                "from" => builder = builder.from(parse_text(value, "from")?),
                "to" => match value {
                    Value::Array(items) => {
                        for item in items {
                            builder = builder.to(parse_text(item, "to")?);
                        }
                    }
                    other => builder = builder.to(parse_text(other, "to")?),
                },
                "text" => builder = builder.text(parse_text(value, "text")?),
                "icon" => builder = builder.icon(parse_text(value, "icon")?),
                "attachments" => match value {
                    Value::Array(items) => {
                        for item in items {
                            builder = builder.attachment(wrap_field(
                                "attachments",
                                AttachmentTemplate::parse(item),
                            )?);
                        }
                    }
                    other => {
                        builder = builder.attachment(wrap_field(
                            "attachments",
                            AttachmentTemplate::parse(other),
                        )?)
                    }
                },
                "dynamic_attachments" => {
                    builder = builder.dynamic_attachments(wrap_field(
                        "dynamic_attachments",
                        DynamicAttachments::parse(value),
                    )?)
                }
                unknown => return Err(ParseError::UnknownField(unknown.to_string())),
            }
        }
        Ok(builder.build())
    }

    /// Renders this template into a concrete [`SlackMessage`].
    ///
    /// Per-field precedence: a declared template is substituted against the
    /// model; otherwise the defaults' value is used verbatim; otherwise the
    /// field stays absent. `from` additionally falls back to `watch_id`.
    pub fn render(
        &self,
        watch_id: &str,
        action_id: &str,
        engine: &dyn TemplateEngine,
        model: &Value,
        defaults: &MessageDefaults,
    ) -> Result<SlackMessage, TemplateError> {
        trace!(watch_id, action_id, "rendering slack message");

        let from = match &self.from {
            Some(template) => engine.render(template, model)?,
            None => defaults
                .from
                .clone()
                .unwrap_or_else(|| watch_id.to_string()),
        };

        let to = match &self.to {
            Some(templates) => {
                let mut to = Vec::with_capacity(templates.len());
                for template in templates {
                    to.push(engine.render(template, model)?);
                }
                to
            }
            None => defaults.to.clone(),
        };

        let text = match &self.text {
            Some(template) => Some(engine.render(template, model)?),
            None => defaults.text.clone(),
        };

        let icon = match &self.icon {
            Some(template) => Some(engine.render(template, model)?),
            None => defaults.icon.clone(),
        };

        // Static attachments first, dynamic ones appended after; the order
        // decides display order downstream.
        let mut attachments = Vec::new();
        if let Some(templates) = &self.attachments {
            for template in templates {
                attachments.push(template.render(engine, model, &defaults.attachment)?);
            }
        }
        if let Some(dynamic) = &self.dynamic_attachments {
            attachments.extend(dynamic.render(engine, model, &defaults.attachment)?);
        }
        let attachments = if attachments.is_empty() {
            None
        } else {
            Some(attachments)
        };

        Ok(SlackMessage {
            from: Some(from),
            to,
            icon,
            text,
            attachments,
        })
    }

    /// The document form of this template; the inverse of [`Self::parse`].
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(from) = &self.from {
            map.insert("from".to_string(), from.to_value());
        }
        if let Some(to) = &self.to {
            map.insert(
                "to".to_string(),
                Value::Array(to.iter().map(TextTemplate::to_value).collect()),
            );
        }
        if let Some(text) = &self.text {
            map.insert("text".to_string(), text.to_value());
        }
        if let Some(icon) = &self.icon {
            map.insert("icon".to_string(), icon.to_value());
        }
        if let Some(attachments) = &self.attachments {
            map.insert(
                "attachments".to_string(),
                Value::Array(attachments.iter().map(AttachmentTemplate::to_value).collect()),
            );
        }
        if let Some(dynamic) = &self.dynamic_attachments {
            map.insert("dynamic_attachments".to_string(), dynamic.to_value());
        }
        Value::Object(map)
    }
}

/// Accumulates optional template fields. Lists left empty become `None` at
/// [`build`](Self::build), preserving the absence-vs-empty distinction.
#[derive(Debug, Default)]
pub struct MessageTemplateBuilder {
    from: Option<TextTemplate>,
    to: Vec<TextTemplate>,
    text: Option<TextTemplate>,
    icon: Option<TextTemplate>,
    attachments: Vec<AttachmentTemplate>,
    dynamic_attachments: Option<DynamicAttachments>,
}

impl MessageTemplateBuilder {
    pub fn from(mut self, from: impl Into<TextTemplate>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn to(mut self, to: impl Into<TextTemplate>) -> Self {
        self.to.push(to.into());
        self
    }

    pub fn text(mut self, text: impl Into<TextTemplate>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<TextTemplate>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn attachment(mut self, attachment: AttachmentTemplate) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn dynamic_attachments(mut self, dynamic: DynamicAttachments) -> Self {
        self.dynamic_attachments = Some(dynamic);
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate {
            from: self.from,
            to: if self.to.is_empty() {
                None
            } else {
                Some(self.to)
            },
            text: self.text,
            icon: self.icon,
            attachments: if self.attachments.is_empty() {
                None
            } else {
                Some(self.attachments)
            },
            dynamic_attachments: self.dynamic_attachments,
        }
    }
}

pub(crate) fn parse_text(value: &Value, field: &'static str) -> Result<TextTemplate, ParseError> {
    TextTemplate::parse(value).map_err(|e| ParseError::Field {
        field,
        source: Box::new(e.into()),
    })
}

pub(crate) fn wrap_field<T>(
    field: &'static str,
    result: Result<T, ParseError>,
) -> Result<T, ParseError> {
    result.map_err(|e| ParseError::Field {
        field,
        source: Box::new(e),
    })
}
