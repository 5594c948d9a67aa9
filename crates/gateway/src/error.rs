use crate::config::Endpoint;
use thiserror::Error;

/// Why a call to one of the remote services produced no usable result.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no URL configured for the {0} endpoint")]
    EndpointNotConfigured(Endpoint),

    #[error("request to the {endpoint} endpoint failed: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} endpoint returned {status}: {body}")]
    Status {
        endpoint: Endpoint,
        status: u16,
        body: String,
    },

    #[error("unexpected response from the {endpoint} endpoint: {source}")]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },
}

impl GatewayError {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            GatewayError::EndpointNotConfigured(endpoint) => *endpoint,
            GatewayError::Transport { endpoint, .. }
            | GatewayError::Status { endpoint, .. }
            | GatewayError::Decode { endpoint, .. } => *endpoint,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Transport { source, .. } if source.is_timeout())
    }
}
