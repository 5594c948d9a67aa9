use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TIMEOUT_SECS: u64 = 180;
/// Largest accepted value for any single timeout: one day.
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

pub const SUMMARIZATION_API_URL: &str = "SUMMARIZATION_API_URL";
pub const EXTRACT_ENTITIES_API_URL: &str = "EXTRACT_ENTITIES_API_URL";
pub const QUESTION_GENERATION_API_URL: &str = "QUESTION_GENERATION_API_URL";
pub const MAX_TIMEOUT_CONNECT: &str = "MAX_TIMEOUT_CONNECT";
pub const MAX_TIMEOUT_READ: &str = "MAX_TIMEOUT_READ";
pub const MAX_TIMEOUT_WRITE: &str = "MAX_TIMEOUT_WRITE";
pub const MAX_TIMEOUT_POOL: &str = "MAX_TIMEOUT_POOL";
pub const SUMMARIZATION_CONTRACT: &str = "SUMMARIZATION_CONTRACT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a number of seconds between 1 and 86400, got {value:?}")]
    InvalidTimeout { key: &'static str, value: String },
    #[error("{key} must be `question_answer_pairs` or `entities`, got {value:?}")]
    InvalidContract { key: &'static str, value: String },
}

/// The three remote services the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Summarization,
    EntityExtraction,
    QuestionGeneration,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Endpoint::Summarization => "summarization",
            Endpoint::EntityExtraction => "entity_extraction",
            Endpoint::QuestionGeneration => "question_generation",
        };
        f.write_str(name)
    }
}

/// Which request body the summarization service expects. A deployment
/// speaks exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarizationContract {
    /// `{ content, question_answer_pairs, summarization_model_name, search_config }`
    #[default]
    QuestionAnswerPairs,
    /// `{ content, entities }`
    Entities,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub connect_secs: u64,
    pub read_secs: u64,
    pub write_secs: u64,
    pub pool_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: DEFAULT_TIMEOUT_SECS,
            read_secs: DEFAULT_TIMEOUT_SECS,
            write_secs: DEFAULT_TIMEOUT_SECS,
            pool_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }

    pub fn pool(&self) -> Duration {
        Duration::from_secs(self.pool_secs)
    }

    /// Upper bound for one whole request: connect, send the body, read the reply.
    pub fn total(&self) -> Duration {
        Duration::from_secs(
            self.connect_secs
                .saturating_add(self.write_secs)
                .saturating_add(self.read_secs),
        )
    }
}

/// Endpoints and timeouts, loaded once at startup and shared read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub summarization_url: Option<String>,
    pub extract_entities_url: Option<String>,
    pub question_generation_url: Option<String>,
    pub timeouts: TimeoutConfig,
    pub summarization_contract: SummarizationContract,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let timeout = |key: &'static str| -> Result<u64, ConfigError> {
            match lookup(key) {
                None => Ok(DEFAULT_TIMEOUT_SECS),
                Some(value) => match value.trim().parse::<u64>() {
                    Ok(secs) if (1..=MAX_TIMEOUT_SECS).contains(&secs) => Ok(secs),
                    _ => Err(ConfigError::InvalidTimeout { key, value }),
                },
            }
        };

        let summarization_contract = match lookup(SUMMARIZATION_CONTRACT) {
            None => SummarizationContract::default(),
            Some(value) => match value.trim() {
                "" | "question_answer_pairs" => SummarizationContract::QuestionAnswerPairs,
                "entities" => SummarizationContract::Entities,
                _ => {
                    return Err(ConfigError::InvalidContract {
                        key: SUMMARIZATION_CONTRACT,
                        value,
                    });
                }
            },
        };

        Ok(Self {
            summarization_url: url(SUMMARIZATION_API_URL),
            extract_entities_url: url(EXTRACT_ENTITIES_API_URL),
            question_generation_url: url(QUESTION_GENERATION_API_URL),
            timeouts: TimeoutConfig {
                connect_secs: timeout(MAX_TIMEOUT_CONNECT)?,
                read_secs: timeout(MAX_TIMEOUT_READ)?,
                write_secs: timeout(MAX_TIMEOUT_WRITE)?,
                pool_secs: timeout(MAX_TIMEOUT_POOL)?,
            },
            summarization_contract,
        })
    }

    pub fn endpoint_url(&self, endpoint: Endpoint) -> Option<&str> {
        match endpoint {
            Endpoint::Summarization => self.summarization_url.as_deref(),
            Endpoint::EntityExtraction => self.extract_entities_url.as_deref(),
            Endpoint::QuestionGeneration => self.question_generation_url.as_deref(),
        }
    }
}
