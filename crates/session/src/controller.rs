use gateway::{GatewayError, Inference, SummarizeInput};
use preprocess::{format_question_block, join_question_blocks};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::state::{SessionState, Transition};

pub const SUMMARY_FALLBACK: &str = "Error occurred while summarizing the text.";
pub const QUESTIONS_FALLBACK: &str = "Error occurred while generating questions.";
pub const NO_SELECTION_WARNING: &str = "Please select at least one entity.";

pub const DEFAULT_MODEL: &str = "BARTpho";
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 256;

/// Problems with the user's input, rejected before any remote call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("Please select at least one entity.")]
    NoEntitiesSelected,
    #[error("unknown summarization model `{0}`")]
    UnknownModel(String),
    #[error("max_new_tokens must be greater than zero")]
    InvalidTokenLimit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Cap on the number of entity choices kept after an extract.
    pub max_entity_choices: Option<usize>,
    /// Models the user may pick from. Empty means any name is passed through.
    pub models: Vec<String>,
    pub default_model: String,
    pub default_max_new_tokens: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_entity_choices: None,
            models: vec![DEFAULT_MODEL.to_string()],
            default_model: DEFAULT_MODEL.to_string(),
            default_max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractCommand {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractResponse {
    pub entity_choices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateCommand {
    pub text: String,
    #[serde(default)]
    pub selected_entities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateResponse {
    pub questions_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummarizeCommand {
    pub text: String,
    #[serde(default)]
    pub selected_entities: Vec<String>,
    #[serde(default)]
    pub questions_text: String,
    pub model: Option<String>,
    pub max_new_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummarizeResponse {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearResponse {
    pub text: String,
    pub entity_choices: Vec<String>,
    pub summary: String,
    pub questions_text: String,
}

/// Response to the caller plus the state change to apply to the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<R> {
    pub response: R,
    pub transition: Transition,
}

/// Runs the extract / generate / summarize / clear actions for a session.
///
/// Remote actions never touch the session while their call is in flight:
/// they return an [`Outcome`] whose transition the caller applies once the
/// call has resolved. Gateway failures are rendered with the fixed fallback
/// texts and the reason is returned alongside in `failure`.
pub struct InteractionController<I: Inference> {
    inference: Arc<I>,
    config: ControllerConfig,
}

impl<I: Inference> InteractionController<I> {
    pub fn new(inference: Arc<I>, config: ControllerConfig) -> Self {
        Self { inference, config }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub async fn extract(&self, cmd: ExtractCommand) -> Outcome<ExtractResponse> {
        let result = self.inference.extract_entities(&cmd.text).await;

        let (entity_choices, failure) = match result {
            Ok(entities) => {
                let cap = self.config.max_entity_choices.unwrap_or(usize::MAX);
                let choices: Vec<String> =
                    entities.iter().take(cap).map(|e| e.to_string()).collect();
                if choices.len() < entities.len() {
                    info!(
                        extracted = entities.len(),
                        kept = choices.len(),
                        "Entity choices capped"
                    );
                }
                (choices, None)
            }
            Err(e) => (Vec::new(), Some(failure_reason(&e))),
        };

        Outcome {
            transition: Transition::Extracted {
                text: cmd.text,
                entity_choices: entity_choices.clone(),
            },
            response: ExtractResponse {
                entity_choices,
                failure,
            },
        }
    }

    pub async fn generate(
        &self,
        cmd: GenerateCommand,
    ) -> Result<Outcome<GenerateResponse>, ActionError> {
        // Blank entries are dropped before the call so that question i lines
        // up with the i-th entity the question service actually received.
        let selected: Vec<String> = cmd
            .selected_entities
            .into_iter()
            .filter(|e| !e.trim().is_empty())
            .collect();
        if selected.is_empty() {
            warn!("Generate requested without selected entities");
            return Err(ActionError::NoEntitiesSelected);
        }

        let result = self.inference.generate_questions(&cmd.text, &selected).await;

        let (questions_text, failure) = match result {
            Ok(questions) => {
                let blocks: Vec<String> = questions
                    .iter()
                    .zip(&selected)
                    .map(|(question, entity)| format_question_block(question, entity))
                    .collect();
                (join_question_blocks(&blocks), None)
            }
            Err(e) => (QUESTIONS_FALLBACK.to_string(), Some(failure_reason(&e))),
        };

        Ok(Outcome {
            transition: Transition::Generated {
                text: cmd.text,
                selected_entities: selected,
                questions_text: questions_text.clone(),
            },
            response: GenerateResponse {
                questions_text,
                failure,
            },
        })
    }

    pub async fn summarize(
        &self,
        cmd: SummarizeCommand,
    ) -> Result<Outcome<SummarizeResponse>, ActionError> {
        let model = cmd
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.config.default_model.clone());
        if !self.config.models.is_empty() && !self.config.models.contains(&model) {
            return Err(ActionError::UnknownModel(model));
        }

        let max_new_tokens = cmd
            .max_new_tokens
            .unwrap_or(self.config.default_max_new_tokens);
        if max_new_tokens == 0 {
            return Err(ActionError::InvalidTokenLimit);
        }

        let input = SummarizeInput {
            content: cmd.text,
            entities: cmd.selected_entities,
            questions: cmd.questions_text,
            model,
            max_new_tokens,
        };

        let (summary, failure) = match self.inference.summarize(&input).await {
            Ok(summary) => (summary, None),
            Err(e) => (SUMMARY_FALLBACK.to_string(), Some(failure_reason(&e))),
        };

        Ok(Outcome {
            transition: Transition::Summarized {
                text: input.content,
                selected_entities: input.entities,
                questions_text: input.questions,
                summary: summary.clone(),
            },
            response: SummarizeResponse { summary, failure },
        })
    }

    pub fn clear(&self, state: &mut SessionState) -> ClearResponse {
        state.clear();

        ClearResponse {
            text: String::new(),
            entity_choices: Vec::new(),
            summary: String::new(),
            questions_text: String::new(),
        }
    }
}

fn failure_reason(err: &GatewayError) -> String {
    err.to_string()
}
