//! Chat pipeline: validate, normalize, dispatch, format

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::client::Client;
use crate::format::{format_reply, ListStyle};
use crate::message::ChatMessage;
use crate::normalize::{has_attachments, normalize};
use crate::persona::Persona;
use crate::{Error, Result};

/// Error text for an empty or missing conversation
pub const MESSAGES_REQUIRED: &str = "Messages are required";

/// Successful reply returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub success: bool,
    pub response: String,
    /// ISO-8601 UTC time the reply was produced
    pub timestamp: String,
}

impl ChatReply {
    pub fn new(response: String) -> Self {
        ChatReply {
            success: true,
            response,
            timestamp: now_iso8601(),
        }
    }
}

/// Current UTC time as `2024-01-01T12:00:00.000Z`
pub(crate) fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Runs the chat pipeline against one upstream provider.
///
/// Holds only immutable state, so a single instance serves all requests.
#[derive(Clone)]
pub struct ChatService {
    client: Arc<dyn Client>,
    persona: Persona,
    list_style: ListStyle,
}

impl ChatService {
    pub fn new(client: Arc<dyn Client>, persona: Persona, list_style: ListStyle) -> Self {
        ChatService {
            client,
            persona,
            list_style,
        }
    }

    /// Answer a conversation
    pub async fn reply(&self, messages: &[ChatMessage]) -> Result<ChatReply> {
        validate(messages)?;

        let payload = normalize(messages, &self.persona);
        info!(
            "Forwarding {} message(s) to {} (attachments: {})",
            messages.len(),
            self.client.provider().display_name(),
            has_attachments(messages)
        );

        let raw = self.client.generate(&payload).await.map_err(|e| {
            error!("{} call failed: {}", self.client.provider().display_name(), e);
            e
        })?;

        Ok(ChatReply::new(format_reply(&raw, self.list_style)))
    }
}

fn validate(messages: &[ChatMessage]) -> Result<()> {
    if messages.is_empty() {
        return Err(Error::InvalidRequest(MESSAGES_REQUIRED.to_string()));
    }
    if let Some(index) = messages.iter().position(ChatMessage::is_blank) {
        return Err(Error::InvalidRequest(format!(
            "Message {} has no content or attachments",
            index + 1
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderType;
    use crate::message::{Attachment, ProviderRequestPayload};
    use std::sync::Mutex;

    /// Records payloads and answers with a fixed reply
    struct StubClient {
        reply: std::result::Result<String, String>,
        seen: Mutex<Vec<ProviderRequestPayload>>,
    }

    impl StubClient {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(StubClient {
                reply: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(StubClient {
                reply: Err(message.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl Client for StubClient {
        async fn generate(&self, payload: &ProviderRequestPayload) -> Result<String> {
            self.seen.lock().unwrap().push(payload.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(message) => Err(Error::Api(message.clone())),
            }
        }

        fn provider(&self) -> ProviderType {
            ProviderType::OpenAI
        }
    }

    fn service(client: Arc<StubClient>) -> ChatService {
        ChatService::new(client, Persona::new("persona"), ListStyle::Numbered)
    }

    #[tokio::test]
    async fn test_reply_is_formatted() {
        let stub = StubClient::replying("Hi **there**");
        let reply = service(stub.clone()).reply(&[ChatMessage::user("Hello")]).await.unwrap();

        assert!(reply.success);
        assert_eq!(reply.response, "Hi there");
        assert!(chrono::DateTime::parse_from_rfc3339(&reply.timestamp).is_ok());
        assert!(reply.timestamp.ends_with('Z'));

        let seen = stub.seen.lock().unwrap();
        assert_eq!(
            seen.as_slice(),
            &[ProviderRequestPayload::TextPrompt("persona\n\nuser: Hello".to_string())]
        );
    }

    #[tokio::test]
    async fn test_attachments_use_structured_payload() {
        let stub = StubClient::replying("Nice layout");
        let message = ChatMessage::user("Thoughts?")
            .with_attachment(Attachment::image("image/png", "ui.png", "iVBORw0KGgo="));
        service(stub.clone()).reply(&[message]).await.unwrap();

        let seen = stub.seen.lock().unwrap();
        assert!(matches!(seen[0], ProviderRequestPayload::StructuredMessages(_)));
    }

    #[tokio::test]
    async fn test_empty_conversation_is_rejected_before_dispatch() {
        let stub = StubClient::replying("unused");
        let err = service(stub.clone()).reply(&[]).await.unwrap_err();

        assert!(err.is_client_error());
        assert_eq!(err.to_string(), MESSAGES_REQUIRED);
        assert!(stub.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected() {
        let stub = StubClient::replying("unused");
        let messages = [ChatMessage::user("ok"), ChatMessage::default()];
        let err = service(stub).reply(&messages).await.unwrap_err();
        assert_eq!(err.to_string(), "Message 2 has no content or attachments");
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let stub = StubClient::failing("OpenAI API error (500): boom");
        let err = service(stub).reply(&[ChatMessage::user("Hello")]).await.unwrap_err();
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("boom"));
    }
}
