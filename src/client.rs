//! LLM client implementations
//!
//! Every provider binding turns a [`ProviderRequestPayload`] into one upstream
//! HTTP call and returns the raw reply text. There are no retries: a failed
//! call surfaces as an error for the caller to report.

use super::{
    config::{ProviderConfig, ProviderType},
    message::{ContentPart, MessageContent, MessageRole, ProviderRequestPayload, StructuredMessage},
    Error, Result,
};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

/// Build an HTTP client, applying the configured timeout if any
fn build_http_client(config: &ProviderConfig) -> std::result::Result<HttpClient, reqwest::Error> {
    let mut builder = HttpClient::builder();
    if let Some(timeout) = config.timeout() {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Read the body of a response, failing with the upstream's error text on non-success
async fn read_body(response: reqwest::Response, provider: ProviderType) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(Error::Api(format!(
            "{} API error ({}): {}",
            provider.display_name(),
            status,
            body
        )));
    }

    Ok(body)
}

fn parse_body<T: for<'de> Deserialize<'de>>(body: &str, provider: ProviderType) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        Error::Api(format!(
            "Failed to parse {} response: {}. Body: {}",
            provider.display_name(),
            e,
            body
        ))
    })
}

/// Replace an empty reply with the fixed fallback text
fn reply_or_fallback(text: Option<String>, provider: ProviderType) -> String {
    match text {
        Some(text) if !text.trim().is_empty() => text,
        _ => {
            tracing::warn!("{} returned an empty reply", provider.display_name());
            format!("No response from {}", provider.display_name())
        }
    }
}

/// Trait for LLM clients
#[async_trait::async_trait]
pub trait Client: Send + Sync {
    /// Send the payload upstream and return the raw reply text
    async fn generate(&self, payload: &ProviderRequestPayload) -> Result<String>;

    /// Provider this client talks to
    fn provider(&self) -> ProviderType;
}

// ---------------------------------------------------------------------------
// OpenAI
// ---------------------------------------------------------------------------

/// OpenAI client implementation
///
/// Structured payloads go to `/chat/completions` with the vision model,
/// text prompts to `/responses`.
pub struct OpenAIClient {
    config: ProviderConfig,
    http_client: HttpClient,
}

impl OpenAIClient {
    /// Create a new OpenAI client
    pub fn new(config: ProviderConfig) -> Result<Self> {
        Ok(OpenAIClient {
            http_client: build_http_client(&config)?,
            config,
        })
    }

    async fn post<T: Serialize + ?Sized>(&self, endpoint: &str, request: &T) -> Result<String> {
        let url = format!("{}/{}", self.config.api_base(), endpoint);
        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .json(request)
            .send()
            .await?;
        read_body(response, ProviderType::OpenAI).await
    }

    async fn chat_completion(&self, messages: &[StructuredMessage]) -> Result<String> {
        let request = ChatRequest {
            model: self.config.vision_model(),
            messages,
            max_tokens: self.config.max_tokens(),
        };
        let body = self.post("chat/completions", &request).await?;
        let response: ChatResponse = parse_body(&body, ProviderType::OpenAI)?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);
        Ok(reply_or_fallback(content, ProviderType::OpenAI))
    }

    async fn respond(&self, prompt: &str) -> Result<String> {
        let request = ResponsesRequest {
            model: self.config.model(),
            input: prompt,
        };
        let body = self.post("responses", &request).await?;
        let response: ResponsesResponse = parse_body(&body, ProviderType::OpenAI)?;
        Ok(reply_or_fallback(response.text(), ProviderType::OpenAI))
    }
}

#[async_trait::async_trait]
impl Client for OpenAIClient {
    async fn generate(&self, payload: &ProviderRequestPayload) -> Result<String> {
        match payload {
            ProviderRequestPayload::StructuredMessages(messages) => self.chat_completion(messages).await,
            ProviderRequestPayload::TextPrompt(prompt) => self.respond(prompt).await,
        }
    }

    fn provider(&self) -> ProviderType {
        ProviderType::OpenAI
    }
}

// ---------------------------------------------------------------------------
// Anthropic
// ---------------------------------------------------------------------------

/// Anthropic client implementation
pub struct AnthropicClient {
    config: ProviderConfig,
    http_client: HttpClient,
}

impl AnthropicClient {
    /// Create a new Anthropic client
    pub fn new(config: ProviderConfig) -> Result<Self> {
        Ok(AnthropicClient {
            http_client: build_http_client(&config)?,
            config,
        })
    }

    fn build_request(&self, payload: &ProviderRequestPayload) -> AnthropicMessageRequest {
        match payload {
            ProviderRequestPayload::TextPrompt(prompt) => AnthropicMessageRequest {
                model: self.config.model().to_string(),
                messages: vec![AnthropicMessage {
                    role: "user",
                    content: vec![AnthropicBlock::Text { text: prompt.clone() }],
                }],
                system: None,
                max_tokens: self.config.max_tokens(),
            },
            ProviderRequestPayload::StructuredMessages(messages) => {
                // Extract system messages into the top-level field
                let (system, others): (Vec<_>, Vec<_>) = messages
                    .iter()
                    .partition(|m| m.role == MessageRole::System);

                let system_content = system
                    .iter()
                    .map(|m| content_text(&m.content))
                    .collect::<Vec<_>>()
                    .join("\n\n");

                AnthropicMessageRequest {
                    model: self.config.vision_model().to_string(),
                    messages: others
                        .into_iter()
                        .map(|m| AnthropicMessage {
                            role: if m.role == MessageRole::Assistant { "assistant" } else { "user" },
                            content: anthropic_blocks(&m.content),
                        })
                        .collect(),
                    system: (!system_content.is_empty()).then_some(system_content),
                    max_tokens: self.config.max_tokens(),
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl Client for AnthropicClient {
    async fn generate(&self, payload: &ProviderRequestPayload) -> Result<String> {
        let url = format!("{}/v1/messages", self.config.api_base());
        let request = self.build_request(payload);

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let body = read_body(response, ProviderType::Anthropic).await?;
        let response: AnthropicMessageResponse = parse_body(&body, ProviderType::Anthropic)?;

        let text = response
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        Ok(reply_or_fallback(Some(text), ProviderType::Anthropic))
    }

    fn provider(&self) -> ProviderType {
        ProviderType::Anthropic
    }
}

fn anthropic_blocks(content: &MessageContent) -> Vec<AnthropicBlock> {
    match content {
        MessageContent::Text(text) => vec![AnthropicBlock::Text { text: text.clone() }],
        MessageContent::Parts(parts) => parts
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => AnthropicBlock::Text { text: text.clone() },
                ContentPart::ImageUrl { image_url } => match image_url.data_parts() {
                    Some((media_type, data)) => AnthropicBlock::Image {
                        source: AnthropicImageSource::Base64 {
                            media_type: media_type.to_string(),
                            data: data.to_string(),
                        },
                    },
                    None => AnthropicBlock::Image {
                        source: AnthropicImageSource::Url {
                            url: image_url.url.clone(),
                        },
                    },
                },
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Gemini
// ---------------------------------------------------------------------------

/// Gemini client implementation
///
/// Both payload shapes go through `models/{model}:generateContent`.
pub struct GeminiClient {
    config: ProviderConfig,
    http_client: HttpClient,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: ProviderConfig) -> Result<Self> {
        Ok(GeminiClient {
            http_client: build_http_client(&config)?,
            config,
        })
    }

    fn build_request(&self, payload: &ProviderRequestPayload) -> (String, GenerateContentRequest) {
        match payload {
            ProviderRequestPayload::TextPrompt(prompt) => (
                self.config.model().to_string(),
                GenerateContentRequest {
                    contents: vec![GeminiContent {
                        role: Some("user".to_string()),
                        parts: vec![GeminiPart::Text { text: prompt.clone() }],
                    }],
                    system_instruction: None,
                    generation_config: None,
                },
            ),
            ProviderRequestPayload::StructuredMessages(messages) => {
                let mut system_parts = Vec::new();
                let mut contents = Vec::new();

                for message in messages {
                    match message.role {
                        MessageRole::System => system_parts.push(GeminiPart::Text {
                            text: content_text(&message.content),
                        }),
                        MessageRole::User => contents.push(GeminiContent {
                            role: Some("user".to_string()),
                            parts: gemini_parts(&message.content),
                        }),
                        MessageRole::Assistant => contents.push(GeminiContent {
                            role: Some("model".to_string()),
                            parts: gemini_parts(&message.content),
                        }),
                    }
                }

                (
                    self.config.vision_model().to_string(),
                    GenerateContentRequest {
                        contents,
                        system_instruction: (!system_parts.is_empty()).then(|| GeminiContent {
                            role: None,
                            parts: system_parts,
                        }),
                        generation_config: Some(GenerationConfig {
                            max_output_tokens: self.config.max_tokens(),
                        }),
                    },
                )
            }
        }
    }
}

#[async_trait::async_trait]
impl Client for GeminiClient {
    async fn generate(&self, payload: &ProviderRequestPayload) -> Result<String> {
        let (model, request) = self.build_request(payload);
        let url = format!("{}/models/{}:generateContent", self.config.api_base(), model);

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", self.config.api_key())
            .json(&request)
            .send()
            .await?;

        let body = read_body(response, ProviderType::Gemini).await?;
        let response: GenerateContentResponse = parse_body(&body, ProviderType::Gemini)?;

        let text = response.candidates.into_iter().next().map(|candidate| {
            candidate
                .content
                .parts
                .into_iter()
                .filter_map(|part| match part {
                    GeminiPart::Text { text } => Some(text),
                    GeminiPart::InlineData { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("")
        });
        Ok(reply_or_fallback(text, ProviderType::Gemini))
    }

    fn provider(&self) -> ProviderType {
        ProviderType::Gemini
    }
}

fn gemini_parts(content: &MessageContent) -> Vec<GeminiPart> {
    match content {
        MessageContent::Text(text) => vec![GeminiPart::Text { text: text.clone() }],
        MessageContent::Parts(parts) => parts
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => GeminiPart::Text { text: text.clone() },
                ContentPart::ImageUrl { image_url } => match image_url.data_parts() {
                    Some((mime_type, data)) => GeminiPart::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: data.to_string(),
                        },
                    },
                    None => GeminiPart::Text {
                        text: format!("Image URL: {}", image_url.url),
                    },
                },
            })
            .collect(),
    }
}

/// Flatten message content to text, dropping images
fn content_text(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Parts(parts) => parts
            .iter()
            .filter_map(ContentPart::as_text)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

// OpenAI types

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [StructuredMessage],
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<ResponsesOutputItem>,
}

impl ResponsesResponse {
    /// `output_text` when the server includes it, otherwise the joined
    /// `output_text` blocks of all message items
    fn text(self) -> Option<String> {
        if let Some(text) = self.output_text.filter(|t| !t.is_empty()) {
            return Some(text);
        }
        let text = self
            .output
            .into_iter()
            .flat_map(|item| item.content)
            .filter(|block| block.type_ == "output_text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct ResponsesOutputItem {
    #[serde(default)]
    content: Vec<ResponsesContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponsesContentBlock {
    #[serde(rename = "type")]
    type_: String,
    #[serde(default)]
    text: Option<String>,
}

// Anthropic types

#[derive(Debug, Serialize)]
struct AnthropicMessageRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum AnthropicBlock {
    Text { text: String },
    Image { source: AnthropicImageSource },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum AnthropicImageSource {
    Base64 { media_type: String, data: String },
    Url { url: String },
}

#[derive(Debug, Deserialize)]
struct AnthropicMessageResponse {
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: Option<String>,
}

// Gemini types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// Variant order matters for untagged decoding
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    // Absent when the candidate was blocked
    #[serde(default)]
    content: GeminiContent,
}
