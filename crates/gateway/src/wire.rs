//! Request and response bodies of the three remote services.

use preprocess::{Entity, QuestionAnswerPair};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct GenerationKwargs {
    pub max_new_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct SearchConfig {
    pub kwargs: GenerationKwargs,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SummarizationRequest<'a> {
    QuestionAnswerPairs {
        content: &'a str,
        question_answer_pairs: Vec<QuestionAnswerPair>,
        summarization_model_name: &'a str,
        search_config: SearchConfig,
    },
    Entities {
        content: &'a str,
        entities: Vec<Entity>,
    },
}

#[derive(Debug, Deserialize)]
pub struct SummarizationResponse {
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractionRequest<'a> {
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ExtractionResponse {
    #[serde(default)]
    pub entities: Vec<Entity>,
}

#[derive(Debug, Serialize)]
pub struct QuestionGenerationRequest<'a> {
    pub content: &'a str,
    pub entities: &'a [Entity],
}

#[derive(Debug, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct QuestionGenerationResponse {
    #[serde(default)]
    pub questions: Vec<GeneratedQuestion>,
}
