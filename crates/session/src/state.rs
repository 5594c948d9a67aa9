use serde::{Deserialize, Serialize};

/// Transient state of one user's session. Only the controller's actions
/// write to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub text: String,
    /// `"name (type)"` strings offered for selection after the last extract.
    pub entity_choices: Vec<String>,
    /// Chosen entity display strings, in the order they were selected.
    pub selected_entities: Vec<String>,
    pub questions_text: String,
    pub summary: String,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Extracted {
                text,
                entity_choices,
            } => {
                self.text = text;
                self.entity_choices = entity_choices;
                self.selected_entities.clear();
            }
            Transition::Generated {
                text,
                selected_entities,
                questions_text,
            } => {
                self.text = text;
                self.selected_entities = selected_entities;
                self.questions_text = questions_text;
            }
            Transition::Summarized {
                text,
                selected_entities,
                questions_text,
                summary,
            } => {
                self.text = text;
                self.selected_entities = selected_entities;
                self.questions_text = questions_text;
                self.summary = summary;
            }
        }
    }
}

/// State change produced by a finished action. Nothing is written to the
/// session until the remote call behind it has resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// New entity choices; the previous selection is dropped.
    Extracted {
        text: String,
        entity_choices: Vec<String>,
    },
    Generated {
        text: String,
        selected_entities: Vec<String>,
        questions_text: String,
    },
    Summarized {
        text: String,
        selected_entities: Vec<String>,
        questions_text: String,
        summary: String,
    },
}
