//! Conversation items exchanged with the model API.
//!
//! Items are a tagged union on the `type` field. Kinds this crate does not
//! understand are preserved verbatim in [`ResponseItem::Other`] so rollouts
//! round-trip without loss.

use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};
use std::path::Path;

use crate::error::AgentError;

/// One unit of conversation or tool output.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseItem {
    Message(MessageItem),
    FunctionCall(FunctionCallItem),
    FunctionCallOutput(FunctionCallOutputItem),
    Reasoning(ReasoningItem),
    /// Unknown item kinds, kept as raw JSON.
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: String,
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub call_id: String,
    pub name: String,
    /// JSON-encoded argument object, as sent by the model.
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallOutputItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub call_id: String,
    /// Either plain text or a JSON string `{output, metadata}`.
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `None` when the field was absent; `Some(vec![])` when present and empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Vec<Value>>,
}

/// A piece of message content.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    InputText { text: String },
    OutputText { text: String },
    InputImage { image_url: String },
    InputFile { filename: String },
    Refusal { refusal: String },
    Other(Value),
}

/// Execution details attached to a command's output.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ExecMetadata {
    pub exit_code: i32,
    pub duration_seconds: f64,
}

/// Display grouping of items.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEntry {
    Item(ResponseItem),
    Group { name: String, items: Vec<ResponseItem> },
}

/// Group each function call with the output that immediately answers it.
///
/// The group is named after the called function. Everything else, including
/// a call with no adjacent output, stays a single item.
pub fn group_batch(items: &[ResponseItem]) -> Vec<BatchEntry> {
    let mut entries = Vec::with_capacity(items.len());
    let mut rest = items;
    while let Some((first, tail)) = rest.split_first() {
        if let (ResponseItem::FunctionCall(call), Some(ResponseItem::FunctionCallOutput(output))) =
            (first, tail.first())
        {
            if output.call_id == call.call_id {
                entries.push(BatchEntry::Group {
                    name: call.name.clone(),
                    items: vec![first.clone(), tail[0].clone()],
                });
                rest = &tail[1..];
                continue;
            }
        }
        entries.push(BatchEntry::Item(first.clone()));
        rest = tail;
    }
    entries
}

impl ResponseItem {
    /// Item id, when the API assigned one.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Message(item) => item.id.as_deref(),
            Self::FunctionCall(item) => item.id.as_deref(),
            Self::FunctionCallOutput(item) => item.id.as_deref(),
            Self::Reasoning(item) => item.id.as_deref(),
            Self::Other(raw) => raw.get("id").and_then(Value::as_str),
        }
    }

    /// The `type` discriminant.
    pub fn kind(&self) -> &str {
        match self {
            Self::Message(_) => "message",
            Self::FunctionCall(_) => "function_call",
            Self::FunctionCallOutput(_) => "function_call_output",
            Self::Reasoning(_) => "reasoning",
            Self::Other(raw) => raw.get("type").and_then(Value::as_str).unwrap_or("unknown"),
        }
    }

    /// Plain user text message.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::Message(MessageItem {
            id: None,
            role: "user".to_string(),
            content: vec![ContentPart::InputText { text: text.into() }],
        })
    }

    /// Assistant text message.
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::Message(MessageItem {
            id: None,
            role: "assistant".to_string(),
            content: vec![ContentPart::OutputText { text: text.into() }],
        })
    }

    pub fn to_value(&self) -> Value {
        let (kind, body) = match self {
            Self::Message(item) => ("message", serde_json::to_value(item)),
            Self::FunctionCall(item) => ("function_call", serde_json::to_value(item)),
            Self::FunctionCallOutput(item) => ("function_call_output", serde_json::to_value(item)),
            Self::Reasoning(item) => ("reasoning", serde_json::to_value(item)),
            Self::Other(raw) => return raw.clone(),
        };
        let mut body = body.unwrap_or_else(|_| json!({}));
        if let Value::Object(map) = &mut body {
            map.insert("type".to_string(), Value::String(kind.to_string()));
        }
        body
    }

    /// Parse a raw item, falling back to [`ResponseItem::Other`].
    pub fn from_value(value: Value) -> Self {
        let parsed = match value.get("type").and_then(Value::as_str) {
            Some("message") => serde_json::from_value(value.clone()).map(Self::Message),
            Some("function_call") => serde_json::from_value(value.clone()).map(Self::FunctionCall),
            Some("function_call_output") => {
                serde_json::from_value(value.clone()).map(Self::FunctionCallOutput)
            }
            Some("reasoning") => serde_json::from_value(value.clone()).map(Self::Reasoning),
            _ => return Self::Other(value),
        };
        parsed.unwrap_or(Self::Other(value))
    }
}

impl Serialize for ResponseItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResponseItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

impl ContentPart {
    fn to_value(&self) -> Value {
        match self {
            Self::InputText { text } => json!({"type": "input_text", "text": text}),
            Self::OutputText { text } => json!({"type": "output_text", "text": text}),
            Self::InputImage { image_url } => json!({"type": "input_image", "image_url": image_url}),
            Self::InputFile { filename } => json!({"type": "input_file", "filename": filename}),
            Self::Refusal { refusal } => json!({"type": "refusal", "refusal": refusal}),
            Self::Other(raw) => raw.clone(),
        }
    }

    fn from_value(value: Value) -> Self {
        let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);
        let part = match value.get("type").and_then(Value::as_str) {
            Some("input_text") => field("text").map(|text| Self::InputText { text }),
            Some("output_text") => field("text").map(|text| Self::OutputText { text }),
            Some("input_image") => field("image_url").map(|image_url| Self::InputImage { image_url }),
            Some("input_file") => field("filename").map(|filename| Self::InputFile { filename }),
            Some("refusal") => field("refusal").map(|refusal| Self::Refusal { refusal }),
            _ => None,
        };
        part.unwrap_or(Self::Other(value))
    }
}

impl Serialize for ContentPart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ContentPart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

impl FunctionCallOutputItem {
    /// Split the output into its text and optional execution metadata.
    pub fn parsed(&self) -> (String, Option<ExecMetadata>) {
        #[derive(Deserialize)]
        struct Wrapped {
            output: String,
            #[serde(default)]
            metadata: Option<ExecMetadata>,
        }
        match serde_json::from_str::<Wrapped>(&self.output) {
            Ok(wrapped) => (wrapped.output, wrapped.metadata),
            Err(_) => (self.output.clone(), None),
        }
    }
}

/// Build the user message for a prompt plus attached images.
///
/// Images are inlined as base64 data URLs.
pub fn create_input_item(prompt: &str, images: &[impl AsRef<Path>]) -> Result<ResponseItem, AgentError> {
    let mut content = vec![ContentPart::InputText {
        text: prompt.to_string(),
    }];
    for path in images {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|err| AgentError::Input(format!("{}: {err}", path.display())))?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        content.push(ContentPart::InputImage {
            image_url: format!("data:{};base64,{encoded}", image_mime_type(path)),
        });
    }
    Ok(ResponseItem::Message(MessageItem {
        id: None,
        role: "user".to_string(),
        content,
    }))
}

fn image_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}
