pub mod controller;
pub mod state;

pub use controller::{
    ActionError, ClearResponse, ControllerConfig, ExtractCommand, ExtractResponse,
    GenerateCommand, GenerateResponse, InteractionController, Outcome, SummarizeCommand,
    SummarizeResponse, DEFAULT_MAX_NEW_TOKENS, DEFAULT_MODEL, NO_SELECTION_WARNING,
    QUESTIONS_FALLBACK, SUMMARY_FALLBACK,
};
pub use state::{SessionState, Transition};
