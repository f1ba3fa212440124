//! Message types for chat requests and provider payloads

use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message (sets behavior)
    System,
    /// User message
    #[default]
    User,
    /// Assistant message
    Assistant,
}

impl MessageRole {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Kind of a user-supplied attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Document,
}

/// A file attached to a chat message, carried inline as base64
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: AttachmentKind,

    pub mime_type: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Base64 payload (older clients send it as `base64`)
    #[serde(alias = "base64")]
    pub data: String,
}

impl Attachment {
    /// Create an image attachment
    pub fn image(mime_type: impl Into<String>, name: impl Into<String>, data: impl Into<String>) -> Self {
        Attachment {
            kind: AttachmentKind::Image,
            mime_type: mime_type.into(),
            name: name.into(),
            data: data.into(),
        }
    }

    /// Create a document attachment
    pub fn document(mime_type: impl Into<String>, name: impl Into<String>, data: impl Into<String>) -> Self {
        Attachment {
            kind: AttachmentKind::Document,
            mime_type: mime_type.into(),
            name: name.into(),
            data: data.into(),
        }
    }
}

/// A chat message as sent by the client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: MessageRole,

    /// Text content of the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Attached files, in the order the user added them
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub attachments: Vec<Attachment>,
}

impl ChatMessage {
    /// Create a new message
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        ChatMessage {
            role,
            content: Some(content.into()),
            attachments: Vec::new(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Attach a file to this message
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Message text, or `""` when absent
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// True when the message carries neither text nor attachments
    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty() && self.attachments.is_empty()
    }
}

/// Image detail level requested from vision models; resolution is left to the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    #[default]
    Auto,
}

/// Image reference inside a multimodal message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
    #[serde(default)]
    pub detail: ImageDetail,
}

impl ImageUrl {
    /// Split a `data:<mime>;base64,<data>` URL into mime type and payload.
    /// Returns `None` for remote URLs.
    pub fn data_parts(&self) -> Option<(&str, &str)> {
        let rest = self.url.strip_prefix("data:")?;
        let (mime_type, data) = rest.split_once(";base64,")?;
        Some((mime_type, data))
    }
}

/// One typed part of a multimodal message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Text of a text part, `None` for images
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text { text } => Some(text),
            ContentPart::ImageUrl { .. } => None,
        }
    }
}

/// Content of a structured message: a plain string or a list of parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// A message in the structured (chat-completion) payload shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredMessage {
    pub role: MessageRole,
    pub content: MessageContent,
}

/// Request payload handed to a provider binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderRequestPayload {
    /// Persona and conversation flattened into one prompt
    TextPrompt(String),
    /// System persona followed by role-tagged, possibly multimodal messages
    StructuredMessages(Vec<StructuredMessage>),
}
