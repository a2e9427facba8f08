pub mod console_sink;
pub mod memory_sink;
pub mod sqlite_sink;
pub mod types;

pub use self::console_sink::ConsoleLogSink;
pub use self::memory_sink::MemoryLogSink;
pub use self::sqlite_sink::SqliteLogSink;
pub use self::types::{AnalysisAction, AnalysisLogEntry, AnalysisLogSink};

use crate::config::LoggingConfig;
use crate::db::DbClient;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::error;

/// Fans analysis log entries out to the configured sinks. Each sink runs
/// behind a bounded channel; a full buffer drops entries rather than
/// stalling the analysis path.
pub struct AnalysisLogger {
    sinks: Vec<mpsc::Sender<AnalysisLogEntry>>,
}

impl AnalysisLogger {
    pub fn new(
        config: LoggingConfig,
        extra_sinks: Vec<Box<dyn AnalysisLogSink>>,
        db_client: Option<Arc<DbClient>>,
    ) -> Arc<Self> {
        let mut sinks = Vec::new();

        for sink_type in &config.sinks {
            if sink_type == "console" {
                let sink = Box::new(ConsoleLogSink::new(config.clone()));
                sinks.push(Self::spawn_sink(sink));
            } else if sink_type == "sqlite" {
                match db_client.as_ref().map(|db| db.create_log_writer()) {
                    Some(Ok(writer)) => {
                        let sink = Box::new(SqliteLogSink::new(writer, config.clone()));
                        sinks.push(Self::spawn_sink(sink));
                    }
                    Some(Err(e)) => error!("Failed to create SQLite log writer: {}", e),
                    None => error!("SQLite sink configured without a database client"),
                }
            } else {
                error!("Unknown log sink type: {}", sink_type);
            }
        }

        for sink in extra_sinks {
            sinks.push(Self::spawn_sink(sink));
        }

        Arc::new(Self { sinks })
    }

    fn spawn_sink(sink: Box<dyn AnalysisLogSink>) -> mpsc::Sender<AnalysisLogEntry> {
        let (tx, mut rx) = mpsc::channel(1000);
        tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                sink.log(&entry);
            }
        });
        tx
    }

    pub async fn log(&self, entry: AnalysisLogEntry) {
        let len = self.sinks.len();
        for (i, sink) in self.sinks.iter().enumerate() {
            // Fire and forget, don't block caller if buffer full
            if i == len - 1 {
                let _ = sink.try_send(entry);
                break;
            }
            let _ = sink.try_send(entry.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::RiskLevel;
    use std::sync::Mutex;

    struct TestLogSink {
        logs: Arc<Mutex<Vec<AnalysisLogEntry>>>,
    }

    impl AnalysisLogSink for TestLogSink {
        fn log(&self, entry: &AnalysisLogEntry) {
            self.logs.lock().unwrap().push(entry.clone());
        }
    }

    #[tokio::test]
    async fn fans_out_to_extra_sinks() {
        let logs = Arc::new(Mutex::new(Vec::new()));
        let sink = TestLogSink { logs: logs.clone() };
        let logger = AnalysisLogger::new(
            LoggingConfig {
                sinks: vec![],
                ..LoggingConfig::default()
            },
            vec![Box::new(sink)],
            None,
        );

        logger
            .log(AnalysisLogEntry {
                url: "https://a.example/x".to_string(),
                domain: "a.example".to_string(),
                action: AnalysisAction::Classified,
                risk_level: Some(RiskLevel::Low),
                category: Some("Legitimate".to_string()),
                blocked: false,
                latency_ms: 12,
            })
            .await;

        // Allow the sink task to drain the channel
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let logs = logs.lock().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].domain, "a.example");
        assert_eq!(logs[0].action, AnalysisAction::Classified);
    }
}
