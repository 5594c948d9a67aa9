pub mod client;
pub mod config;
pub mod error;
pub mod wire;

pub use client::{Inference, InferenceGateway, SummarizeInput};
pub use config::{ConfigError, Endpoint, GatewayConfig, SummarizationContract, TimeoutConfig};
pub use error::GatewayError;
