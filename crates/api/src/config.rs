use anyhow::{Context, Result};
use gateway::GatewayConfig;
use serde::Serialize;
use session::{ControllerConfig, DEFAULT_MAX_NEW_TOKENS, DEFAULT_MODEL};
use std::net::SocketAddr;

use crate::sessions::DEFAULT_MAX_SESSIONS;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:7860";

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Live sessions kept before the least recently used one is evicted.
    pub max_sessions: usize,
    pub gateway: GatewayConfig,
    pub controller: ControllerConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_addr = value("APP_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("APP_BIND_ADDR must be a socket address such as 0.0.0.0:7860")?;

        let gateway = GatewayConfig::from_lookup(&lookup)?;

        let models: Vec<String> = value("SUMMARIZATION_MODELS")
            .map(|v| {
                v.split(',')
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec![DEFAULT_MODEL.to_string()]);

        let default_model = value("DEFAULT_SUMMARIZATION_MODEL")
            .or_else(|| models.first().cloned())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        if !models.is_empty() && !models.contains(&default_model) {
            anyhow::bail!(
                "DEFAULT_SUMMARIZATION_MODEL `{}` is not one of SUMMARIZATION_MODELS",
                default_model
            );
        }

        let default_max_new_tokens = match value("DEFAULT_MAX_NEW_TOKENS") {
            Some(v) => v
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .with_context(|| format!("DEFAULT_MAX_NEW_TOKENS must be a positive integer, got {v:?}"))?,
            None => DEFAULT_MAX_NEW_TOKENS,
        };

        let max_entity_choices = value("MAX_ENTITY_CHOICES")
            .map(|v| {
                v.parse::<usize>()
                    .with_context(|| format!("MAX_ENTITY_CHOICES must be an integer, got {v:?}"))
            })
            .transpose()?;

        let max_sessions = match value("MAX_SESSIONS") {
            Some(v) => v
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .with_context(|| format!("MAX_SESSIONS must be a positive integer, got {v:?}"))?,
            None => DEFAULT_MAX_SESSIONS,
        };

        Ok(Self {
            bind_addr,
            max_sessions,
            gateway,
            controller: ControllerConfig {
                max_entity_choices,
                models,
                default_model,
                default_max_new_tokens,
            },
        })
    }
}
