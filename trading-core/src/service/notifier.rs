use super::ServiceError;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;
use trading_common::backtest::EngineEvent;

/// Receives engine events and free-form run notes
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &EngineEvent) -> Result<(), ServiceError> {
        self.note(&event.to_string()).await
    }

    async fn note(&self, message: &str) -> Result<(), ServiceError>;
}

/// Appends `[YYYY-MM-DD HH:MM:SS] message` lines to a log file
#[derive(Debug)]
pub struct TradeLogNotifier {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TradeLogNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format_line(at: DateTime<Local>, message: &str) -> String {
        format!("[{}] {}\n", at.format("%Y-%m-%d %H:%M:%S"), message)
    }
}

#[async_trait]
impl Notifier for TradeLogNotifier {
    async fn note(&self, message: &str) -> Result<(), ServiceError> {
        info!("{}", message);
        let line = Self::format_line(Local::now(), message);

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_line_format() {
        let at = Local.with_ymd_and_hms(2024, 2, 5, 9, 45, 7).unwrap();
        assert_eq!(
            TradeLogNotifier::format_line(at, "AAPL signal: buy"),
            "[2024-02-05 09:45:07] AAPL signal: buy\n"
        );
    }

    #[tokio::test]
    async fn test_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = TradeLogNotifier::new(dir.path().join("bot_log.txt"));
        notifier.note("first").await.unwrap();
        notifier.note("second").await.unwrap();

        let contents = std::fs::read_to_string(notifier.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('[') && lines[0].ends_with("] first"));
        assert!(lines[1].ends_with("] second"));
    }
}
