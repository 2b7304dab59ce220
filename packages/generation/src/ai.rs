// Text generation using the Anthropic Messages API
//
// This is the infrastructure implementation of TextGenerator.
// Prompt content (what to ask for) lives in prompt.rs.

use async_trait::async_trait;
use tracing::{debug, info};

use anthropic_client::{AnthropicClient, AnthropicError, ContentBlock, Message, MessagesRequest};

use crate::error::{GenerationError, Result};
use crate::prompt::{GenerationRequest, RequestContent};
use crate::traits::TextGenerator;

const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
const DEFAULT_MAX_TOKENS: u32 = 6000;

/// Anthropic implementation of article generation
#[derive(Clone)]
pub struct AnthropicGenerator {
    client: AnthropicClient,
    model: String,
    max_tokens: u32,
}

impl AnthropicGenerator {
    pub fn new(client: AnthropicClient) -> Self {
        Self {
            client,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn to_messages_request(&self, request: &GenerationRequest) -> MessagesRequest {
        let blocks = request
            .content
            .iter()
            .map(|block| match block {
                RequestContent::Text(text) => ContentBlock::text(text),
                RequestContent::Image(image) => {
                    ContentBlock::image(&image.media_type, &image.data)
                }
            })
            .collect();

        MessagesRequest::new(&self.model)
            .max_tokens(self.max_tokens)
            .system(&request.system)
            .message(Message::user_blocks(blocks))
    }
}

fn map_api_error(error: AnthropicError) -> GenerationError {
    match error {
        AnthropicError::Auth(message) => GenerationError::Auth(message),
        AnthropicError::RateLimited(message) => GenerationError::RateLimited(message),
        other => GenerationError::Service(other.to_string()),
    }
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        debug!(
            model = %self.model,
            image_count = request.image_count(),
            "Calling Anthropic messages API"
        );

        let response = self
            .client
            .messages(self.to_messages_request(request))
            .await
            .map_err(map_api_error)?;

        let text = response.text();
        if text.is_empty() {
            return Err(GenerationError::Service(
                "empty response from model".to_string(),
            ));
        }

        info!(
            model = %self.model,
            response_chars = text.chars().count(),
            "Anthropic response received"
        );

        Ok(text)
    }
}
