//! Mock HTTP servers for testing provider bindings offline
//!
//! Wiremock-based stand-ins for the OpenAI, Anthropic and Gemini APIs, so the
//! clients can be exercised without real API keys.

use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

/// OpenAI mock server for testing
pub struct OpenAIMockServer {
    server: MockServer,
}

impl OpenAIMockServer {
    /// Create a new OpenAI mock server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Get the base URL of this mock server
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Requests received so far, as JSON bodies
    pub async fn received_bodies(&self) -> Vec<serde_json::Value> {
        received_bodies(&self.server).await
    }

    /// Setup a mock response for the multimodal chat completion endpoint
    pub async fn mock_chat_completion(&self, content: Option<&str>) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-mock",
                "object": "chat.completion",
                "created": 1234567890,
                "model": "gpt-4o-mini",
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": content
                    },
                    "finish_reason": "stop"
                }]
            })))
            .mount(&self.server)
            .await;
    }

    /// Setup a mock response for the text-only responses endpoint
    pub async fn mock_response(&self, text: &str) {
        Mock::given(method("POST"))
            .and(path("/responses"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "resp-mock",
                "object": "response",
                "status": "completed",
                "model": "gpt-4o-mini",
                "output": [{
                    "type": "message",
                    "id": "msg-mock",
                    "role": "assistant",
                    "content": [{"type": "output_text", "text": text, "annotations": []}]
                }]
            })))
            .mount(&self.server)
            .await;
    }

    /// Setup an error response on every endpoint
    pub async fn mock_error(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }
}

/// Anthropic mock server for testing
pub struct AnthropicMockServer {
    server: MockServer,
}

impl AnthropicMockServer {
    /// Create a new Anthropic mock server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Get the base URL of this mock server
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    pub async fn received_bodies(&self) -> Vec<serde_json::Value> {
        received_bodies(&self.server).await
    }

    /// Setup a mock response for the messages endpoint
    pub async fn mock_message(&self, content: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg-mock",
                "type": "message",
                "role": "assistant",
                "content": [{
                    "type": "text",
                    "text": content
                }],
                "stop_reason": "end_turn",
                "model": "claude-3-5-haiku-latest",
                "usage": {
                    "input_tokens": 10,
                    "output_tokens": 20
                }
            })))
            .mount(&self.server)
            .await;
    }
}

/// Gemini mock server for testing
pub struct GeminiMockServer {
    server: MockServer,
}

impl GeminiMockServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    pub async fn received_bodies(&self) -> Vec<serde_json::Value> {
        received_bodies(&self.server).await
    }

    /// Setup a mock response for `models/{model}:generateContent`
    pub async fn mock_generate_content(&self, model: &str, parts: &[&str]) {
        let parts: Vec<serde_json::Value> = parts
            .iter()
            .map(|text| serde_json::json!({ "text": text }))
            .collect();

        Mock::given(method("POST"))
            .and(path(format!("/models/{}:generateContent", model)))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"role": "model", "parts": parts},
                    "finishReason": "STOP"
                }]
            })))
            .mount(&self.server)
            .await;
    }

    /// Setup a response without candidates (e.g. a blocked prompt)
    pub async fn mock_no_candidates(&self) {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&self.server)
            .await;
    }
}

async fn received_bodies(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| serde_json::from_slice(&request.body).unwrap_or_default())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        create_client, normalize, Attachment, ChatMessage, Error, Persona, ProviderConfig,
        ProviderRequestPayload,
    };

    fn text_payload() -> ProviderRequestPayload {
        normalize(&[ChatMessage::user("Say hello")], &Persona::new("persona"))
    }

    fn image_payload() -> ProviderRequestPayload {
        let message = ChatMessage::user("What is this?")
            .with_attachment(Attachment::image("image/png", "a.png", "iVBORw0KGgo="));
        normalize(&[message], &Persona::new("persona"))
    }

    #[tokio::test]
    async fn test_openai_text_prompt_uses_responses() {
        let mock = OpenAIMockServer::start().await;
        mock.mock_response("Hello, world!").await;

        let client = create_client(ProviderConfig::openai(mock.base_url(), "test-key".to_string())).unwrap();
        let reply = client.generate(&text_payload()).await.unwrap();
        assert_eq!(reply, "Hello, world!");

        let bodies = mock.received_bodies().await;
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["model"], "gpt-4o-mini");
        assert_eq!(bodies[0]["input"], "persona\n\nuser: Say hello");
    }

    #[tokio::test]
    async fn test_openai_attachments_use_chat_completions() {
        let mock = OpenAIMockServer::start().await;
        mock.mock_chat_completion(Some("A screenshot")).await;

        let client = create_client(ProviderConfig::openai(mock.base_url(), "test-key".to_string())).unwrap();
        let reply = client.generate(&image_payload()).await.unwrap();
        assert_eq!(reply, "A screenshot");

        let bodies = mock.received_bodies().await;
        assert_eq!(bodies[0]["max_tokens"], 1024);
        assert_eq!(bodies[0]["messages"][0]["role"], "system");
        assert_eq!(
            bodies[0]["messages"][1]["content"][1]["image_url"]["url"],
            "data:image/png;base64,iVBORw0KGgo="
        );
        assert_eq!(bodies[0]["messages"][1]["content"][1]["image_url"]["detail"], "auto");
    }

    #[tokio::test]
    async fn test_openai_empty_choice_falls_back() {
        let mock = OpenAIMockServer::start().await;
        mock.mock_chat_completion(None).await;

        let client = create_client(ProviderConfig::openai(mock.base_url(), "test-key".to_string())).unwrap();
        let reply = client.generate(&image_payload()).await.unwrap();
        assert_eq!(reply, "No response from OpenAI");
    }

    #[tokio::test]
    async fn test_openai_error_status_is_reported() {
        let mock = OpenAIMockServer::start().await;
        mock.mock_error(401, r#"{"error":{"message":"Incorrect API key provided"}}"#).await;

        let client = create_client(ProviderConfig::openai(mock.base_url(), "test-key".to_string())).unwrap();
        let err = client.generate(&text_payload()).await.unwrap_err();
        assert!(matches!(err, Error::Api(_)));
        assert!(err.to_string().starts_with("OpenAI API error (401"));
        assert!(err.to_string().contains("Incorrect API key provided"));

        // No retries
        assert_eq!(mock.received_bodies().await.len(), 1);
    }

    #[tokio::test]
    async fn test_anthropic_generate() {
        let mock = AnthropicMockServer::start().await;
        mock.mock_message("Hello from Anthropic!").await;

        let client =
            create_client(ProviderConfig::anthropic(mock.base_url(), "test-key".to_string())).unwrap();
        let reply = client.generate(&image_payload()).await.unwrap();
        assert_eq!(reply, "Hello from Anthropic!");

        let bodies = mock.received_bodies().await;
        assert_eq!(bodies[0]["system"], "persona");
        assert_eq!(bodies[0]["messages"][0]["content"][1]["source"]["media_type"], "image/png");
    }

    #[tokio::test]
    async fn test_gemini_generate_joins_parts() {
        let mock = GeminiMockServer::start().await;
        mock.mock_generate_content("gemini-1.5-flash", &["Hello", " from Gemini"]).await;

        let client = create_client(ProviderConfig::gemini(mock.base_url(), "test-key".to_string())).unwrap();
        let reply = client.generate(&text_payload()).await.unwrap();
        assert_eq!(reply, "Hello from Gemini");

        let bodies = mock.received_bodies().await;
        assert_eq!(bodies[0]["contents"][0]["parts"][0]["text"], "persona\n\nuser: Say hello");
    }

    #[tokio::test]
    async fn test_gemini_without_candidates_falls_back() {
        let mock = GeminiMockServer::start().await;
        mock.mock_no_candidates().await;

        let client = create_client(ProviderConfig::gemini(mock.base_url(), "test-key".to_string())).unwrap();
        let reply = client.generate(&image_payload()).await.unwrap();
        assert_eq!(reply, "No response from Gemini");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_http_error() {
        // Nothing listens on port 9 (discard) on test machines
        let config = ProviderConfig::openai("http://127.0.0.1:9".to_string(), "test-key".to_string());
        let client = create_client(config).unwrap();
        let err = client.generate(&text_payload()).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
