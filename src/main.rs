use anyhow::{Context, Result};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use scam_guard::analysis::{GatewayClassifier, UrlAnalyzer};
use scam_guard::api::{self, ApiState};
use scam_guard::config::Config;
use scam_guard::guard::{ProtectionStore, SqliteProtectionStore};
use scam_guard::init::{init_data_source, init_db, setup_logging};
use scam_guard::logger::AnalysisLogger;
use scam_guard::stats::StatsCollector;
use scam_guard::store::{BlocklistStore, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load Config
    let config_path = std::env::args().nth(1).unwrap_or("config.toml".to_string());
    let config = if std::path::Path::new(&config_path).exists() {
        Config::load(&config_path).await?
    } else {
        Config::default()
    };

    // 2. Setup Logging
    setup_logging(&config);
    info!("Starting scam-guard...");

    if !std::path::Path::new(&config_path).exists() {
        info!("Config file not found, using defaults.");
    }

    // 3. Init Stats
    let stats = StatsCollector::new(if config.stats.enable {
        config.stats.log_interval_seconds
    } else {
        0
    });

    // 4. Init DB
    let db = init_db(&config)?;

    // 5. Init Data Source & Analysis Logger
    let (memory_sink, data_source) = init_data_source(&config, stats.clone(), db.clone());
    let mut extra_sinks = Vec::new();
    if let Some(sink) = memory_sink {
        extra_sinks.push(sink);
    }
    let logger = AnalysisLogger::new(config.logging.clone(), extra_sinks, Some(db.clone()));

    // 6. Blocklist Store, Gateway Classifier & Analyzer
    let store: Arc<dyn BlocklistStore> = Arc::new(SqliteStore::new(db.clone()));
    let gateway = Arc::new(GatewayClassifier::new(config.classifier.clone()));
    let analyzer = Arc::new(UrlAnalyzer::new(
        store.clone(),
        gateway,
        stats.clone(),
        logger,
    ));

    // 7. Protection State
    let protection: Arc<dyn ProtectionStore> = Arc::new(SqliteProtectionStore::new(db.clone()));

    // 8. Serve API until shutdown
    let host: IpAddr = config.host.parse().context("Invalid host address")?;
    let addr = SocketAddr::new(host, config.port);
    let state = Arc::new(ApiState::new(analyzer, store, protection, data_source));

    tokio::select! {
        result = api::start_api_server(state, addr) => result?,
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received.");
        }
    }

    Ok(())
}
