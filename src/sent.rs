//! Per-destination delivery results.

use serde_json::{Map, Value};

use crate::message::SlackMessage;
use crate::transport::{HttpResponseData, JsonRequest};

/// Outcome of one delivery attempt. "Responded" means any HTTP response was
/// obtained, whatever its status; callers inspect the status themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Responded(HttpResponseData),
    Errored(String),
}

/// One delivery attempt: which channel was targeted (if any), what was
/// rendered, the request actually sent, and how the exchange ended.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    to: Option<String>,
    message: SlackMessage,
    request: JsonRequest,
    delivery: Delivery,
}

impl SentMessage {
    pub fn responded(
        to: Option<String>,
        message: SlackMessage,
        request: JsonRequest,
        response: HttpResponseData,
    ) -> Self {
        SentMessage {
            to,
            message,
            request,
            delivery: Delivery::Responded(response),
        }
    }

    pub fn errored(
        to: Option<String>,
        message: SlackMessage,
        request: JsonRequest,
        reason: String,
    ) -> Self {
        SentMessage {
            to,
            message,
            request,
            delivery: Delivery::Errored(reason),
        }
    }

    pub fn to(&self) -> Option<&str> {
        self.to.as_deref()
    }

    pub fn message(&self) -> &SlackMessage {
        &self.message
    }

    pub fn request(&self) -> &JsonRequest {
        &self.request
    }

    pub fn delivery(&self) -> &Delivery {
        &self.delivery
    }

    /// Whether any response was obtained for this attempt.
    pub fn is_responded(&self) -> bool {
        matches!(self.delivery, Delivery::Responded(_))
    }

    /// The captured error detail, if the exchange failed.
    pub fn error(&self) -> Option<&str> {
        match &self.delivery {
            Delivery::Errored(reason) => Some(reason),
            Delivery::Responded(_) => None,
        }
    }

    /// Audit serialization for logging and history.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(to) = &self.to {
            map.insert("to".to_string(), Value::String(to.clone()));
        }
        map.insert("message".to_string(), self.message.to_value());
        map.insert(
            "request".to_string(),
            Value::String(self.request.url.to_string()),
        );
        match &self.delivery {
            Delivery::Responded(response) => {
                map.insert("status".to_string(), Value::from(response.status));
            }
            Delivery::Errored(reason) => {
                map.insert("error".to_string(), Value::String(reason.clone()));
            }
        }
        Value::Object(map)
    }
}

/// All results of one logical `send` call, in destination order.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessages {
    account: String,
    messages: Vec<SentMessage>,
}

impl SentMessages {
    pub fn new(account: String, messages: Vec<SentMessage>) -> Self {
        SentMessages { account, messages }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn count(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SentMessage> {
        self.messages.iter()
    }
}

impl<'a> IntoIterator for &'a SentMessages {
    type Item = &'a SentMessage;
    type IntoIter = std::slice::Iter<'a, SentMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

impl IntoIterator for SentMessages {
    type Item = SentMessage;
    type IntoIter = std::vec::IntoIter<SentMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}
