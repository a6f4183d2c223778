//! Best-effort query logging.

use std::sync::{Arc, Mutex};

use askgrc_core::traits::QueryLog;
use askgrc_core::types::LogRecord;
use async_trait::async_trait;

/// Bound on the answer text carried into a log record.
pub const PREVIEW_LENGTH: usize = 200;

/// Fire-and-forget write. This is the sole point where a logging failure
/// is discarded; it never reaches the caller or delays the response.
pub(crate) fn spawn_record(log: Arc<dyn QueryLog>, record: LogRecord) {
    tokio::spawn(async move {
        if let Err(e) = log.record(record).await {
            tracing::warn!(error = %e, "query log write failed; ignoring");
        }
    });
}

/// In-memory log, used by tests and the offline CLI.
#[derive(Default)]
pub struct MemoryQueryLog {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryQueryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl QueryLog for MemoryQueryLog {
    async fn record(&self, record: LogRecord) -> anyhow::Result<()> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).push(record);
        Ok(())
    }
}
