pub mod parser;
pub mod questions;
pub mod schema;

pub use parser::{parse_entities, parse_entity};
pub use questions::{clean_questions, format_question_block, join_question_blocks};
pub use schema::{pair_questions, Entity, QuestionAnswerPair, UNKNOWN_ENTITY_TYPE};
