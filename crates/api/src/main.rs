use anyhow::{Context, Result};
use api::{create_app, AppConfig, AppState};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before reading any settings
    dotenvy::dotenv().ok();

    init_tracing();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    for (name, url) in [
        ("summarization", &config.gateway.summarization_url),
        ("entity_extraction", &config.gateway.extract_entities_url),
        ("question_generation", &config.gateway.question_generation_url),
    ] {
        match url {
            Some(url) => tracing::info!(endpoint = name, url = %url, "Endpoint configured"),
            None => tracing::warn!(endpoint = name, "Endpoint not configured, its action will fall back"),
        }
    }

    let state = AppState::new(&config).context("Failed to build HTTP client")?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    tracing::info!("Server listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
