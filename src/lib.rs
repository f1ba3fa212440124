//! Chat relay core: attachment encoding, conversation normalization,
//! provider dispatch and reply formatting.
mod attachment;
mod chat;
mod client;
mod config;
mod format;
mod message;
mod normalize;
mod persona;
mod provider;

#[cfg(feature = "gate")]
pub mod gate;

#[cfg(test)]
mod mock_server;

use thiserror::Error;

/// Result type for riko-gate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for riko-gate operations
#[derive(Debug, Error)]
pub enum Error {
    /// The client sent an unusable conversation
    #[error("{0}")]
    InvalidRequest(String),

    /// Upstream provider failed or answered with something unusable;
    /// the message already names the provider
    #[error("{0}")]
    Api(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for errors caused by the client's input rather than the upstream call
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidRequest(_))
    }
}

pub use attachment::{encode as encode_attachment, MAX_TEXT_ATTACHMENT_CHARS};
pub use chat::{ChatReply, ChatService, MESSAGES_REQUIRED};
pub use client::Client;
pub use config::{ProviderConfig, ProviderType};
pub use format::{format_reply, ListStyle};
pub use message::{
    Attachment, AttachmentKind, ChatMessage, ContentPart, ImageDetail, ImageUrl, MessageContent,
    MessageRole, ProviderRequestPayload, StructuredMessage,
};
pub use normalize::{has_attachments, normalize, DEFAULT_ANALYSIS_PROMPT};
pub use persona::{Persona, RIKO_PERSONA};
pub use provider::create_client;
