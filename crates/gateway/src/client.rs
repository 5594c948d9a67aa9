use async_trait::async_trait;
use preprocess::{clean_questions, pair_questions, parse_entities, Entity};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{Endpoint, GatewayConfig, SummarizationContract};
use crate::error::GatewayError;
use crate::wire::{
    ExtractionRequest, ExtractionResponse, GenerationKwargs, QuestionGenerationRequest,
    QuestionGenerationResponse, SearchConfig, SummarizationRequest, SummarizationResponse,
};

/// Inputs of one summarization call, as the interface hands them over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeInput {
    pub content: String,
    /// `"Name (TYPE)"` display strings of the selected entities.
    pub entities: Vec<String>,
    /// Generated-questions text block, possibly empty.
    pub questions: String,
    pub model: String,
    pub max_new_tokens: u32,
}

/// The remote inference operations the interaction layer depends on.
#[async_trait]
pub trait Inference: Send + Sync {
    async fn summarize(&self, input: &SummarizeInput) -> Result<String, GatewayError>;

    async fn extract_entities(&self, content: &str) -> Result<Vec<Entity>, GatewayError>;

    async fn generate_questions(
        &self,
        content: &str,
        selected_entities: &[String],
    ) -> Result<Vec<String>, GatewayError>;
}

/// HTTP client for the summarization, entity extraction and question
/// generation services. Every call is a single attempt bounded by the
/// configured timeouts.
#[derive(Clone)]
pub struct InferenceGateway {
    config: Arc<GatewayConfig>,
    client: reqwest::Client,
}

impl InferenceGateway {
    pub fn new(config: Arc<GatewayConfig>) -> Result<Self, reqwest::Error> {
        let timeouts = config.timeouts;
        let client = reqwest::Client::builder()
            .connect_timeout(timeouts.connect())
            .read_timeout(timeouts.read())
            .pool_idle_timeout(timeouts.pool())
            .timeout(timeouts.total())
            .build()?;

        Ok(Self { config, client })
    }

    async fn post_json<B, R>(&self, endpoint: Endpoint, body: &B) -> Result<R, GatewayError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self
            .config
            .endpoint_url(endpoint)
            .ok_or(GatewayError::EndpointNotConfigured(endpoint))?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|source| GatewayError::Transport { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| GatewayError::Transport { endpoint, source })?;

        serde_json::from_slice(&bytes).map_err(|source| GatewayError::Decode { endpoint, source })
    }
}

fn log_failure(err: &GatewayError) {
    match err {
        GatewayError::EndpointNotConfigured(_) => {
            warn!(endpoint = %err.endpoint(), "Endpoint not configured")
        }
        _ => warn!(
            endpoint = %err.endpoint(),
            timeout = err.is_timeout(),
            error = %err,
            "Inference request failed"
        ),
    }
}

#[async_trait]
impl Inference for InferenceGateway {
    async fn summarize(&self, input: &SummarizeInput) -> Result<String, GatewayError> {
        let entities = parse_entities(&input.entities);
        let questions = clean_questions(&input.questions);

        info!(
            model = %input.model,
            max_new_tokens = input.max_new_tokens,
            entities = entities.len(),
            questions = questions.len(),
            "Summarizing content"
        );

        let request = match self.config.summarization_contract {
            SummarizationContract::QuestionAnswerPairs => {
                SummarizationRequest::QuestionAnswerPairs {
                    content: &input.content,
                    question_answer_pairs: pair_questions(&questions, &entities),
                    summarization_model_name: &input.model,
                    search_config: SearchConfig {
                        kwargs: GenerationKwargs {
                            max_new_tokens: input.max_new_tokens,
                        },
                    },
                }
            }
            SummarizationContract::Entities => SummarizationRequest::Entities {
                content: &input.content,
                entities,
            },
        };
        debug!(request = ?request, "Summarization request body");

        let response: SummarizationResponse = self
            .post_json(Endpoint::Summarization, &request)
            .await
            .inspect_err(log_failure)?;

        Ok(response.summary)
    }

    async fn extract_entities(&self, content: &str) -> Result<Vec<Entity>, GatewayError> {
        info!(content_len = content.len(), "Starting entity extraction");

        let response: ExtractionResponse = self
            .post_json(Endpoint::EntityExtraction, &ExtractionRequest { content })
            .await
            .inspect_err(log_failure)?;

        info!(entities = response.entities.len(), "Extracted entities");
        Ok(response.entities)
    }

    async fn generate_questions(
        &self,
        content: &str,
        selected_entities: &[String],
    ) -> Result<Vec<String>, GatewayError> {
        let entities = parse_entities(selected_entities);

        let response: QuestionGenerationResponse = self
            .post_json(
                Endpoint::QuestionGeneration,
                &QuestionGenerationRequest {
                    content,
                    entities: &entities,
                },
            )
            .await
            .inspect_err(log_failure)?;

        info!(questions = response.questions.len(), "Generated questions");
        Ok(response.questions.into_iter().map(|q| q.question).collect())
    }
}
