//! OpenAI chat-completion backend.

use super::{LanguageModel, PromptMessage, PromptRole};
use crate::config::LlmSettings;
use crate::error::{Result, TubetalkError};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Chat model backed by the OpenAI API, always in JSON mode.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    pub fn from_settings(settings: &LlmSettings) -> Self {
        Self {
            client: create_client_with_timeout(Duration::from_secs(settings.timeout_secs)),
            model: settings.model.clone(),
            temperature: settings.temperature,
        }
    }

    fn to_request_message(message: &PromptMessage) -> Result<ChatCompletionRequestMessage> {
        let built: ChatCompletionRequestMessage = match message.role {
            PromptRole::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map_err(|e| TubetalkError::Chat(e.to_string()))?
                .into(),
            PromptRole::User => ChatCompletionRequestUserMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map_err(|e| TubetalkError::Chat(e.to_string()))?
                .into(),
            PromptRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map_err(|e| TubetalkError::Chat(e.to_string()))?
                .into(),
        };
        Ok(built)
    }
}

impl Default for OpenAIChatModel {
    fn default() -> Self {
        Self::from_settings(&LlmSettings::default())
    }
}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String> {
        let request_messages = messages
            .iter()
            .map(Self::to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(request_messages)
            .temperature(self.temperature)
            .response_format(ResponseFormat::JsonObject)
            .build()
            .map_err(|e| TubetalkError::Chat(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TubetalkError::OpenAI(format!("Failed to generate response: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| TubetalkError::MalformedResponse("Empty response from LLM".to_string()))?
            .clone();

        debug!("Model replied with {} characters", content.len());
        Ok(content)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
