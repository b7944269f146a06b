//! Review Requester: one chat completion per review.

use crate::error::{ReviewError, Result};
use crate::models::{CandidateLevel, RepositorySnapshot};
use crate::prompts::{review_user_message, CODE_REVIEW_SYSTEM};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
};
use async_openai::Client;
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;
use tracing::debug;

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gpt-4-turbo";

/// Something that can turn repository artifacts into review text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewModel: Send + Sync {
    /// Returns the review for `snapshot`, written for `level`
    async fn review(&self, snapshot: &RepositorySnapshot, level: CandidateLevel) -> Result<String>;
}

/// Chat-completion backed reviewer
#[derive(Clone)]
pub struct OpenAIReviewer {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIReviewer {
    /// Creates a reviewer with `api_key`; `api_base` overrides the default endpoint
    pub fn new(api_key: &str, api_base: Option<&str>, model: impl Into<String>) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = api_base {
            config = config.with_api_base(base);
        }

        Self {
            client: Client::with_config(config).with_backoff(no_retry()),
            model: model.into(),
        }
    }

    /// Model name sent with each request
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(
        &self,
        snapshot: &RepositorySnapshot,
        level: CandidateLevel,
    ) -> Result<CreateChatCompletionRequest> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(CODE_REVIEW_SYSTEM)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(review_user_message(level, snapshot))
                    .build()?
                    .into(),
            ])
            .build()?;
        Ok(request)
    }
}

#[async_trait]
impl ReviewModel for OpenAIReviewer {
    async fn review(&self, snapshot: &RepositorySnapshot, level: CandidateLevel) -> Result<String> {
        let request = self.build_request(snapshot, level)?;
        debug!(model = %self.model, "Requesting review");

        let response = self.client.chat().create(request).await?;
        first_choice_text(response)
    }
}

/// Backoff that gives up on the first failure.
///
/// The client otherwise retries 5xx and 429 answers for minutes.
fn no_retry() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

/// Text of the first choice, or [`ReviewError::UnexpectedResponse`]
pub fn first_choice_text(response: CreateChatCompletionResponse) -> Result<String> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ReviewError::UnexpectedResponse("response has no choices".into()))?;

    choice
        .message
        .content
        .ok_or_else(|| ReviewError::UnexpectedResponse("first choice has no message content".into()))
}
