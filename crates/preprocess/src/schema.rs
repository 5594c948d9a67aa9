use serde::{Deserialize, Serialize};
use std::fmt;

/// Type label used when a display string carries no `(TYPE)` suffix.
pub const UNKNOWN_ENTITY_TYPE: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    entity_name: String,
    entity_type: String,
}

impl Entity {
    pub fn new(entity_name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            entity_type: entity_type.into(),
        }
    }

    pub fn unknown(entity_name: impl Into<String>) -> Self {
        Self::new(entity_name, UNKNOWN_ENTITY_TYPE)
    }

    pub fn name(&self) -> &str {
        &self.entity_name
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }
}

/// Renders the `"name (type)"` string shown as an entity choice.
impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.entity_name, self.entity_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswerPair {
    pub question: String,
    pub entity: Entity,
}

/// Pair questions with entities by position. The shorter side wins.
pub fn pair_questions(questions: &[String], entities: &[Entity]) -> Vec<QuestionAnswerPair> {
    questions
        .iter()
        .zip(entities)
        .map(|(question, entity)| QuestionAnswerPair {
            question: question.clone(),
            entity: entity.clone(),
        })
        .collect()
}
