//! Text templates and the variable-substitution seam.
//!
//! A [`TextTemplate`] is a string that is either a literal value or contains
//! `{{variable}}` placeholders that are resolved at render time against a
//! JSON context model. The substitution engine itself sits behind the
//! [`TemplateEngine`] trait so callers can plug in their own expression
//! engine; [`PlaceholderEngine`] is the bundled implementation.

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("unresolved variable [{0}]")]
    UnresolvedVariable(String),

    #[error("template context model must be a JSON object")]
    InvalidModel,

    #[error("malformed text template: {0}")]
    Malformed(String),

    #[error("list path [{0}] does not resolve to an array")]
    PathNotAList(String),
}

/// An immutable string template. Whether it needs substitution is decided by
/// the engine at render time; a literal simply contains no placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTemplate(String);

impl TextTemplate {
    pub fn inline(source: impl Into<String>) -> Self {
        TextTemplate(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses a template from its document form: either a bare JSON string or
    /// an object of the shape `{"source": "..."}`.
    pub fn parse(value: &Value) -> Result<Self, TemplateError> {
        match value {
            Value::String(s) => Ok(TextTemplate(s.clone())),
            Value::Object(map) => {
                let mut source = None;
                for (key, val) in map {
                    match key.as_str() {
                        "source" => match val {
                            Value::String(s) => source = Some(s.clone()),
                            other => {
                                return Err(TemplateError::Malformed(format!(
                                    "[source] must be a string, found {other}"
                                )))
                            }
                        },
                        unknown => {
                            return Err(TemplateError::Malformed(format!(
                                "unknown field [{unknown}]"
                            )))
                        }
                    }
                }
                source.map(TextTemplate).ok_or_else(|| {
                    TemplateError::Malformed("missing required [source] field".to_string())
                })
            }
            other => Err(TemplateError::Malformed(format!(
                "expected a string or an object, found {other}"
            ))),
        }
    }

    /// The document form of this template; the inverse of [`Self::parse`].
    pub fn to_value(&self) -> Value {
        Value::String(self.0.clone())
    }
}

impl From<&str> for TextTemplate {
    fn from(source: &str) -> Self {
        TextTemplate::inline(source)
    }
}

/// The substitution seam. Rendering is pure; implementations must be safe to
/// share across tasks.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, template: &TextTemplate, model: &Value) -> Result<String, TemplateError>;
}

/// Resolves `{{dotted.path}}` placeholders by looking the path up in the
/// context model. Scalars are stringified; arrays and objects are emitted as
/// compact JSON. A placeholder that resolves to nothing is an error rather
/// than being silently dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderEngine;

impl TemplateEngine for PlaceholderEngine {
    fn render(&self, template: &TextTemplate, model: &Value) -> Result<String, TemplateError> {
        let source = template.as_str();
        if !source.contains("{{") {
            return Ok(source.to_string());
        }
        if !model.is_object() {
            return Err(TemplateError::InvalidModel);
        }

        let mut out = String::with_capacity(source.len());
        let mut rest = source;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                // Unterminated opener is treated as literal text.
                out.push_str(&rest[start..]);
                rest = "";
                break;
            };
            let name = after[..end].trim();
            let value = lookup(model, name)
                .ok_or_else(|| TemplateError::UnresolvedVariable(name.to_string()))?;
            out.push_str(&stringify(value));
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// Walks a dotted path (`ctx.payload.total`) through nested JSON objects.
pub(crate) fn lookup<'a>(model: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = model;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
