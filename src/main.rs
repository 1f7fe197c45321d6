use std::{env, sync::Arc};

use ai_llm_service::{profiles_from_env, telemetry};
use anyhow::Context;
use api::core::app_state::AppState;
use contract_search::{LlmGenerator, SearchConfig, TaskSearch};
use task_store::{LlmEmbedder, TaskStore, TaskStoreConfig};
use tracing::{Level, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_API_ADDRESS: &str = "0.0.0.0:8000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the process environment is used as is.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("info", Level::INFO))
        .with(telemetry::layer())
        .init();

    let llm = Arc::new(profiles_from_env().context("LLM profiles")?);

    let store_cfg = TaskStoreConfig::from_env().context("task store config")?;
    let embedder = Arc::new(LlmEmbedder::new(llm.clone(), store_cfg.embedding_dim));
    let store = TaskStore::from_config(store_cfg, embedder).context("task store")?;

    let search_cfg = SearchConfig::from_env();
    info!(
        default_top_n = search_cfg.default_top_n,
        max_top_n = search_cfg.max_top_n,
        max_in_flight = search_cfg.max_in_flight,
        "search configured"
    );
    let search = TaskSearch::new(
        Arc::new(store),
        Arc::new(LlmGenerator::new(llm.clone())),
        search_cfg,
    );

    let address = env::var("API_ADDRESS").unwrap_or_else(|_| DEFAULT_API_ADDRESS.to_string());
    let state = Arc::new(AppState::new(Arc::new(search), llm));

    api::start(state, &address).await?;
    Ok(())
}
