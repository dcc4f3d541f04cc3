// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::Context;
use clap::Parser;
use search_sync_agent::app::{create_router, AppState, AGENT_NAME, VERSION};
use search_sync_agent::models::config::PluginConfig;
use search_sync_agent::services::documents::{DocumentStore, RestDocumentStore};
use search_sync_agent::services::hooks::HookBus;
use search_sync_agent::services::logging::{init_tracing, mask_secret};
use search_sync_agent::services::orchestrator::SearchService;
use search_sync_agent::services::search::create_engine;
use search_sync_agent::services::sync::CollectionSync;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Keeps a search engine in sync with CMS collections and serves search over HTTP
#[derive(Debug, Parser)]
#[command(name = "search-sync-agent", version = VERSION)]
struct Args {
    /// Plugin config file; overrides SEARCH_CONFIG_PATH
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Do not create schemas or backfill documents at startup
    #[arg(long)]
    skip_init: bool,
}

fn load_config(args: &Args) -> anyhow::Result<PluginConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let mut config = PluginConfig::from_file(path)?;
            config.apply_env_overrides();
            config
        }
        None => PluginConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = Arc::new(load_config(&args).context("Failed to load search configuration")?);
    tracing::info!(
        host = %config.engine.url(),
        api_key = %config.engine.api_key.as_deref().map(mask_secret).unwrap_or_default(),
        collections = config.enabled_collections().count(),
        "Loaded search configuration"
    );

    let engine = create_engine(&config.engine)?;
    let store: Option<Arc<dyn DocumentStore>> = RestDocumentStore::from_env()?
        .map(|store| Arc::new(store) as Arc<dyn DocumentStore>);
    if store.is_none() {
        tracing::warn!("CMS_API_URL is not set; existing documents will not be backfilled");
    }

    let hooks = Arc::new(HookBus::new());
    let sync = Arc::new(CollectionSync::new(engine.clone(), config.clone()));
    if config.settings.auto_sync {
        sync.register_hooks(hooks.as_ref());
    } else {
        tracing::info!("Auto sync disabled; lifecycle hooks not registered");
    }

    if args.skip_init {
        tracing::info!("Skipping collection initialization");
    } else {
        tokio::spawn(async move {
            match sync.initialize_collections(store.as_deref()).await {
                Ok(report) if !report.engine_reachable => {
                    tracing::warn!("Search engine unreachable; collections not initialized");
                }
                Ok(report) => {
                    for result in &report.collections {
                        tracing::info!(
                            collection = %result.collection,
                            created = result.created,
                            synced = result.synced,
                            failed = result.failed,
                            error = result.error.as_deref().unwrap_or(""),
                            "Collection initialized"
                        );
                    }
                }
                Err(e) => tracing::error!(error = %e, "Collection initialization failed"),
            }
        });
    }

    let search = Arc::new(SearchService::new(engine, config.clone()));
    let state = AppState::new(search, hooks).with_hook_secret(env::var("HOOK_SECRET").ok());
    let app = create_router(state, &config.settings.base_path);

    // Bind to 0.0.0.0 to accept connections from any network interface (required for Docker)
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(
        "{AGENT_NAME} v{VERSION} listening on {addr}, API under {}",
        config.settings.base_path
    );

    axum::serve(listener, app).await?;
    Ok(())
}
