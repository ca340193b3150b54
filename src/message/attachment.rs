//! Rich message attachments: resolved values, their templates, and
//! data-driven attachment generation.

use serde_json::{Map, Value};

use super::{parse_text, wrap_field, ParseError};
use crate::config::AttachmentDefaults;
use crate::template::{lookup, TemplateEngine, TemplateError, TextTemplate};

/// A fully-resolved attachment, ready for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attachment {
    pub fallback: Option<String>,
    pub color: Option<String>,
    pub pretext: Option<String>,
    pub title: Option<String>,
    pub title_link: Option<String>,
    pub text: Option<String>,
    pub fields: Option<Vec<Field>>,
}

impl Attachment {
    /// Serializes the attachment. Absent fields are omitted, never null.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        put_str(&mut map, "fallback", &self.fallback);
        put_str(&mut map, "color", &self.color);
        put_str(&mut map, "pretext", &self.pretext);
        put_str(&mut map, "title", &self.title);
        put_str(&mut map, "title_link", &self.title_link);
        put_str(&mut map, "text", &self.text);
        if let Some(fields) = &self.fields {
            map.insert(
                "fields".to_string(),
                Value::Array(fields.iter().map(Field::to_value).collect()),
            );
        }
        Value::Object(map)
    }
}

/// A short key/value entry displayed inside an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub title: String,
    pub value: String,
    pub short: bool,
}

impl Field {
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("title".to_string(), Value::String(self.title.clone()));
        map.insert("value".to_string(), Value::String(self.value.clone()));
        map.insert("short".to_string(), Value::Bool(self.short));
        Value::Object(map)
    }
}

/// Template counterpart of [`Attachment`]; every text field may need
/// substitution at render time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttachmentTemplate {
    pub fallback: Option<TextTemplate>,
    pub color: Option<TextTemplate>,
    pub pretext: Option<TextTemplate>,
    pub title: Option<TextTemplate>,
    pub title_link: Option<TextTemplate>,
    pub text: Option<TextTemplate>,
    pub fields: Option<Vec<FieldTemplate>>,
}

impl AttachmentTemplate {
    /// Parses an attachment template from its document form. Unknown fields
    /// are rejected by name.
    pub fn parse(value: &Value) -> Result<Self, ParseError> {
        let object = value
            .as_object()
            .ok_or_else(|| ParseError::ExpectedObject(value.to_string()))?;

        let mut template = AttachmentTemplate::default();
        for (name, value) in object {
            match name.as_str() {
                "fallback" => template.fallback = Some(parse_text(value, "fallback")?),
                "color" => template.color = Some(parse_text(value, "color")?),
                "pretext" => template.pretext = Some(parse_text(value, "pretext")?),
                "title" => template.title = Some(parse_text(value, "title")?),
                "title_link" => template.title_link = Some(parse_text(value, "title_link")?),
                "text" => template.text = Some(parse_text(value, "text")?),
                "fields" => {
                    let mut fields = Vec::new();
                    match value {
                        Value::Array(items) => {
                            for item in items {
                                fields.push(wrap_field("fields", FieldTemplate::parse(item))?);
                            }
                        }
                        other => fields.push(wrap_field("fields", FieldTemplate::parse(other))?),
                    }
                    template.fields = Some(fields);
                }
                unknown => return Err(ParseError::UnknownField(unknown.to_string())),
            }
        }
        Ok(template)
    }

    /// Renders this template against the context model, filling unset fields
    /// from the account's attachment defaults.
    pub fn render(
        &self,
        engine: &dyn TemplateEngine,
        model: &Value,
        defaults: &AttachmentDefaults,
    ) -> Result<Attachment, TemplateError> {
        let fields = match &self.fields {
            Some(templates) => {
                let mut fields = Vec::with_capacity(templates.len());
                for template in templates {
                    fields.push(template.render(engine, model)?);
                }
                Some(fields)
            }
            None => None,
        };

        Ok(Attachment {
            fallback: render_or_default(engine, &self.fallback, model, &defaults.fallback)?,
            color: render_or_default(engine, &self.color, model, &defaults.color)?,
            pretext: render_or_default(engine, &self.pretext, model, &defaults.pretext)?,
            title: render_or_default(engine, &self.title, model, &defaults.title)?,
            title_link: render_or_default(engine, &self.title_link, model, &defaults.title_link)?,
            text: render_or_default(engine, &self.text, model, &defaults.text)?,
            fields,
        })
    }

    /// The document form of this template; the inverse of [`Self::parse`].
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        put_template(&mut map, "fallback", &self.fallback);
        put_template(&mut map, "color", &self.color);
        put_template(&mut map, "pretext", &self.pretext);
        put_template(&mut map, "title", &self.title);
        put_template(&mut map, "title_link", &self.title_link);
        put_template(&mut map, "text", &self.text);
        if let Some(fields) = &self.fields {
            map.insert(
                "fields".to_string(),
                Value::Array(fields.iter().map(FieldTemplate::to_value).collect()),
            );
        }
        Value::Object(map)
    }
}

/// Template counterpart of [`Field`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTemplate {
    pub title: TextTemplate,
    pub value: TextTemplate,
    pub short: bool,
}

impl FieldTemplate {
    pub fn parse(value: &Value) -> Result<Self, ParseError> {
        let object = value
            .as_object()
            .ok_or_else(|| ParseError::ExpectedObject(value.to_string()))?;

        let mut title = None;
        let mut field_value = None;
        let mut short = false;
        for (name, value) in object {
            match name.as_str() {
                "title" => title = Some(parse_text(value, "title")?),
                "value" => field_value = Some(parse_text(value, "value")?),
                "short" => {
                    short = value.as_bool().ok_or(ParseError::InvalidFieldType {
                        field: "short",
                        expected: "boolean",
                    })?
                }
                unknown => return Err(ParseError::UnknownField(unknown.to_string())),
            }
        }

        Ok(FieldTemplate {
            title: title.ok_or(ParseError::MissingField { field: "title" })?,
            value: field_value.ok_or(ParseError::MissingField { field: "value" })?,
            short,
        })
    }

    pub fn render(
        &self,
        engine: &dyn TemplateEngine,
        model: &Value,
    ) -> Result<Field, TemplateError> {
        Ok(Field {
            title: engine.render(&self.title, model)?,
            value: engine.render(&self.value, model)?,
            short: self.short,
        })
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("title".to_string(), self.title.to_value());
        map.insert("value".to_string(), self.value.to_value());
        map.insert("short".to_string(), Value::Bool(self.short));
        Value::Object(map)
    }
}

/// Attachments generated from runtime data instead of static declarations.
/// `list_path` points at an array inside the context model; each element is
/// rendered through `attachment_template` with the element as its own model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicAttachments {
    list_path: String,
    attachment_template: AttachmentTemplate,
}

impl DynamicAttachments {
    pub fn new(list_path: impl Into<String>, attachment_template: AttachmentTemplate) -> Self {
        DynamicAttachments {
            list_path: list_path.into(),
            attachment_template,
        }
    }

    pub fn parse(value: &Value) -> Result<Self, ParseError> {
        let object = value
            .as_object()
            .ok_or_else(|| ParseError::ExpectedObject(value.to_string()))?;

        let mut list_path = None;
        let mut attachment_template = None;
        for (name, value) in object {
            match name.as_str() {
                "list_path" => {
                    list_path = Some(
                        value
                            .as_str()
                            .ok_or(ParseError::InvalidFieldType {
                                field: "list_path",
                                expected: "string",
                            })?
                            .to_string(),
                    )
                }
                "attachment_template" => {
                    attachment_template = Some(wrap_field(
                        "attachment_template",
                        AttachmentTemplate::parse(value),
                    )?)
                }
                unknown => return Err(ParseError::UnknownField(unknown.to_string())),
            }
        }

        Ok(DynamicAttachments {
            list_path: list_path.ok_or(ParseError::MissingField { field: "list_path" })?,
            attachment_template: attachment_template
                .ok_or(ParseError::MissingField { field: "attachment_template" })?,
        })
    }

    /// Renders one attachment per element of the list the path points at,
    /// preserving the list's order.
    pub fn render(
        &self,
        engine: &dyn TemplateEngine,
        model: &Value,
        defaults: &AttachmentDefaults,
    ) -> Result<Vec<Attachment>, TemplateError> {
        let items = lookup(model, &self.list_path)
            .and_then(Value::as_array)
            .ok_or_else(|| TemplateError::PathNotAList(self.list_path.clone()))?;

        let mut attachments = Vec::with_capacity(items.len());
        for item in items {
            attachments.push(self.attachment_template.render(engine, item, defaults)?);
        }
        Ok(attachments)
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            "list_path".to_string(),
            Value::String(self.list_path.clone()),
        );
        map.insert(
            "attachment_template".to_string(),
            self.attachment_template.to_value(),
        );
        Value::Object(map)
    }
}

fn render_or_default(
    engine: &dyn TemplateEngine,
    template: &Option<TextTemplate>,
    model: &Value,
    default: &Option<String>,
) -> Result<Option<String>, TemplateError> {
    match template {
        Some(template) => engine.render(template, model).map(Some),
        None => Ok(default.clone()),
    }
}

fn put_str(map: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::String(value.clone()));
    }
}

fn put_template(map: &mut Map<String, Value>, key: &str, value: &Option<TextTemplate>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value.to_value());
    }
}
