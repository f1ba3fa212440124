//! Conversation normalization
//!
//! Picks the payload shape for a whole request: a flat text prompt when no
//! message carries attachments, otherwise a structured message list whose
//! first entry is the persona as a system message.

use crate::attachment;
use crate::message::{
    ChatMessage, ContentPart, MessageContent, MessageRole, ProviderRequestPayload,
    StructuredMessage,
};
use crate::persona::Persona;

/// Text part inserted when a multimodal message has nothing to say itself
pub const DEFAULT_ANALYSIS_PROMPT: &str = "Please analyze this.";

/// True when any message carries at least one attachment
pub fn has_attachments(messages: &[ChatMessage]) -> bool {
    messages.iter().any(ChatMessage::has_attachments)
}

/// Build the provider payload for a conversation
pub fn normalize(messages: &[ChatMessage], persona: &Persona) -> ProviderRequestPayload {
    if has_attachments(messages) {
        ProviderRequestPayload::StructuredMessages(structured_messages(messages, persona))
    } else {
        ProviderRequestPayload::TextPrompt(text_prompt(messages, persona))
    }
}

fn text_prompt(messages: &[ChatMessage], persona: &Persona) -> String {
    let conversation = messages
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.text()))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}\n\n{}", persona.as_str(), conversation)
}

fn structured_messages(messages: &[ChatMessage], persona: &Persona) -> Vec<StructuredMessage> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    out.push(StructuredMessage {
        role: MessageRole::System,
        content: MessageContent::Text(persona.as_str().to_string()),
    });
    out.extend(messages.iter().map(structured_message));
    out
}

fn structured_message(message: &ChatMessage) -> StructuredMessage {
    if !message.has_attachments() {
        return StructuredMessage {
            role: message.role,
            content: MessageContent::Text(message.text().to_string()),
        };
    }

    let mut parts = Vec::with_capacity(message.attachments.len() + 1);
    if !message.text().is_empty() {
        parts.push(ContentPart::text(message.text()));
    }
    parts.extend(message.attachments.iter().map(attachment::encode));

    // Vision endpoints reject messages without any text
    let has_text = parts
        .iter()
        .any(|p| p.as_text().is_some_and(|t| !t.is_empty()));
    if !has_text {
        parts.insert(0, ContentPart::text(DEFAULT_ANALYSIS_PROMPT));
    }

    StructuredMessage {
        role: message.role,
        content: MessageContent::Parts(parts),
    }
}
