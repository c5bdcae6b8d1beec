//! Cycle reports
//!
//! Each cycle collects log lines and result snapshots in a [`ReportBuffer`], which is
//! flushed to a [`ReportSink`] (email, or the log) when the cycle ends.

mod email;

pub use email::EmailReporter;

use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Ordered report entries for exactly one cycle
#[derive(Debug, Default)]
pub struct ReportBuffer {
    entries: Vec<Value>,
}

impl ReportBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, line: impl Into<String>) {
        self.entries.push(Value::String(line.into()));
    }

    pub fn push<T: Serialize>(&mut self, entry: &T) {
        match serde_json::to_value(entry) {
            Ok(value) => self.entries.push(value),
            Err(e) => self.line(format!("<unserializable report entry: {}>", e)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pretty JSON array of all entries
    pub fn body(&self) -> String {
        serde_json::to_string_pretty(&self.entries).unwrap_or_else(|e| e.to_string())
    }

    /// Send the report, then clear the buffer. Delivery errors are logged only.
    pub async fn flush<S: ReportSink + ?Sized>(&mut self, sink: &S, utc_offset_hours: i32) {
        let subject = subject(Utc::now(), utc_offset_hours);
        let body = self.body();
        if let Err(e) = sink.send(&subject, &body).await {
            tracing::error!(error = %e, "Failed to deliver report");
        }
        self.entries.clear();
    }
}

/// `Trade Report: dd/mm/yyyy, HH:MM:SS` in the given UTC offset
pub fn subject(now: DateTime<Utc>, utc_offset_hours: i32) -> String {
    let offset = FixedOffset::east_opt(utc_offset_hours.clamp(-23, 23) * 3600)
        .unwrap_or_else(|| Utc.fix());
    format!(
        "Trade Report: {}",
        now.with_timezone(&offset).format("%d/%m/%Y, %H:%M:%S")
    )
}

/// Destination of cycle reports
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<()>;
}

#[async_trait]
impl<T: ReportSink + ?Sized> ReportSink for Arc<T> {
    async fn send(&self, subject: &str, body: &str) -> Result<()> {
        (**self).send(subject, body).await
    }
}

/// Writes reports to the log
#[derive(Debug, Default)]
pub struct LogReporter;

#[async_trait]
impl ReportSink for LogReporter {
    async fn send(&self, subject: &str, body: &str) -> Result<()> {
        tracing::info!(%subject, "{}", body);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MemorySink;
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_subject_uses_offset() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 20, 5, 9).unwrap();
        assert_eq!(subject(now, 8), "Trade Report: 19/10/2026, 04:05:09");
        assert_eq!(subject(now, 0), "Trade Report: 18/10/2026, 20:05:09");
    }

    #[tokio::test]
    async fn test_flush_sends_and_clears() {
        let sink = MemorySink::default();
        let mut report = ReportBuffer::new();
        report.line("--- AMMTrade Report ---");
        report.push(&json!({ "count": 1 }));

        report.flush(&sink, 8).await;

        assert!(report.is_empty());
        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].0.starts_with("Trade Report: "));
        assert_eq!(sent[0].1, json!(["--- AMMTrade Report ---", { "count": 1 }]));
    }

    #[tokio::test]
    async fn test_flush_failure_still_clears() {
        let sink = MemorySink {
            fail: true,
            ..Default::default()
        };
        let mut report = ReportBuffer::new();
        report.line("lost");

        report.flush(&sink, 8).await;
        assert!(report.is_empty());
    }
}
