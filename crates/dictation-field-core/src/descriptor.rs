//! Registration metadata for the speech-to-text field.
//!
//! The host reads this once when the extension is registered. It names the
//! field, the value types it can bind to, and every option with its editing
//! widget and default.

use serde::Serialize;
use serde_json::{json, Value};

use crate::errors::Result;
use crate::options::{FieldOptions, FieldType, Language, LineSeparator};

pub const FIELD_ID: &str = "speech-to-text";

const PREVIEW_SVG: &str = concat!(
    r#"<svg width="156" height="96" fill="none" xmlns="http://www.w3.org/2000/svg">"#,
    r#"<rect x="18" y="15" width="120" height="66" rx="6" fill="var(--theme--background)" class="glow" />"#,
    r#"<rect x="19" y="16" width="118" height="64" rx="5" stroke="var(--theme--primary)" stroke-width="2" />"#,
    r#"<circle cx="40" cy="48" r="12" fill="var(--theme--primary)" fill-opacity=".25" />"#,
    r#"<circle cx="40" cy="48" r="8" fill="var(--theme--primary)" />"#,
    r#"<rect x="60" y="40" width="60" height="6" rx="2" fill="var(--theme--primary)" fill-opacity=".25" />"#,
    r#"<rect x="60" y="50" width="40" height="6" rx="2" fill="var(--theme--primary)" fill-opacity=".25" />"#,
    r#"</svg>"#,
);

#[derive(Debug, Clone, Serialize)]
pub struct FieldDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub types: Vec<FieldType>,
    pub group: &'static str,
    pub options: Vec<OptionSpec>,
    pub preview: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Width {
    Half,
    Full,
}

/// Widget the host uses to edit an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Widget {
    Input,
    SelectDropdown,
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Boolean,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionSpec {
    pub field: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: ValueKind,
    pub meta: OptionMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<OptionSchema>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionMeta {
    pub width: Width,
    pub interface: Widget,
    /// Widget settings: placeholder text, masking, dropdown choices.
    pub options: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionSchema {
    pub default_value: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct Choice {
    pub text: &'static str,
    pub value: &'static str,
}

impl OptionSpec {
    pub fn default_value(&self) -> Option<&Value> {
        self.schema.as_ref().map(|s| &s.default_value)
    }

    pub fn is_masked(&self) -> bool {
        self.meta.options.get("masked") == Some(&Value::Bool(true))
    }

    pub fn choice_values(&self) -> Vec<&str> {
        self.meta
            .options
            .get("choices")
            .and_then(Value::as_array)
            .map(|choices| {
                choices
                    .iter()
                    .filter_map(|c| c.get("value").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl FieldDescriptor {
    pub fn option(&self, field: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.field == field)
    }

    /// Options object made of the declared defaults, as a host would resolve it
    /// for a field nobody configured.
    pub fn default_options(&self) -> Value {
        let map = self
            .options
            .iter()
            .filter_map(|o| o.default_value().map(|v| (o.field.to_string(), v.clone())))
            .collect::<serde_json::Map<_, _>>();
        Value::Object(map)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn choices<T: Copy>(
    items: &[T],
    text: fn(&T) -> &'static str,
    value: fn(&T) -> &'static str,
) -> Value {
    let list: Vec<Choice> = items
        .iter()
        .map(|item| Choice {
            text: text(item),
            value: value(item),
        })
        .collect();
    json!({ "choices": list })
}

/// The descriptor handed to the host at registration time.
pub fn descriptor() -> FieldDescriptor {
    let defaults = FieldOptions::default();

    let options = vec![
        OptionSpec {
            field: "placeholder",
            name: "Placeholder",
            kind: ValueKind::String,
            meta: OptionMeta {
                width: Width::Half,
                interface: Widget::Input,
                options: json!({ "placeholder": "Enter placeholder text..." }),
            },
            schema: Some(OptionSchema {
                default_value: json!(defaults.placeholder),
            }),
        },
        OptionSpec {
            field: "openai_api_key",
            name: "OpenAI API Key",
            kind: ValueKind::String,
            meta: OptionMeta {
                width: Width::Full,
                interface: Widget::Input,
                options: json!({ "masked": true }),
            },
            schema: None,
        },
        OptionSpec {
            field: "language",
            name: "Language",
            kind: ValueKind::String,
            meta: OptionMeta {
                width: Width::Half,
                interface: Widget::SelectDropdown,
                options: choices(&Language::ALL, Language::label, Language::code),
            },
            schema: Some(OptionSchema {
                default_value: json!(defaults.language.code()),
            }),
        },
        OptionSpec {
            field: "append_mode",
            name: "Append Mode",
            kind: ValueKind::Boolean,
            meta: OptionMeta {
                width: Width::Half,
                interface: Widget::Boolean,
                options: json!({ "label": "Append to existing text (instead of replacing)" }),
            },
            schema: Some(OptionSchema {
                default_value: json!(defaults.append_mode),
            }),
        },
        OptionSpec {
            field: "line_separator",
            name: "Text Separator",
            kind: ValueKind::String,
            meta: OptionMeta {
                width: Width::Half,
                interface: Widget::SelectDropdown,
                options: choices(&LineSeparator::ALL, LineSeparator::label, LineSeparator::code),
            },
            schema: Some(OptionSchema {
                default_value: json!(defaults.line_separator.code()),
            }),
        },
    ];

    FieldDescriptor {
        id: FIELD_ID,
        name: "Speech to Text",
        description: "Text input with speech-to-text functionality using OpenAI Whisper",
        icon: "mic",
        types: FieldType::ALL.to_vec(),
        group: "standard",
        options,
        preview: PREVIEW_SVG,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_and_types() {
        let d = descriptor();
        assert_eq!(d.id, "speech-to-text");
        assert_eq!(d.icon, "mic");
        assert_eq!(d.types, vec![FieldType::String, FieldType::Text]);
        assert!(d.preview.starts_with("<svg") && d.preview.ends_with("</svg>"));
    }

    #[test]
    fn declared_defaults_match_runtime_defaults() {
        let d = descriptor();
        let parsed = FieldOptions::from_json(d.default_options()).unwrap();
        assert_eq!(parsed, FieldOptions::default());
    }

    #[test]
    fn api_key_is_masked_and_has_no_default() {
        let d = descriptor();
        let key = d.option("openai_api_key").expect("api key option");
        assert!(key.is_masked());
        assert!(key.default_value().is_none());
        assert_eq!(key.meta.width, Width::Full);
    }

    #[test]
    fn choices_cover_every_variant() {
        let d = descriptor();
        let langs = d.option("language").unwrap().choice_values();
        let expected: Vec<&str> = Language::ALL.iter().map(Language::code).collect();
        assert_eq!(langs, expected);

        let seps = d.option("line_separator").unwrap().choice_values();
        assert_eq!(seps, vec!["auto", "space", "newline", "none"]);
    }

    #[test]
    fn serializes_in_host_shape() {
        let json: Value = serde_json::from_str(&descriptor().to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["types"], json!(["string", "text"]));
        let append = &json["options"][3];
        assert_eq!(append["field"], "append_mode");
        assert_eq!(append["type"], "boolean");
        assert_eq!(append["meta"]["interface"], "boolean");
        assert_eq!(append["schema"]["default_value"], true);
        assert_eq!(json["options"][2]["meta"]["interface"], "select-dropdown");
        assert!(json["options"][1].get("schema").is_none());
    }
}
