use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use crate::mailer::is_valid_address;

/// Append-only subscriber list, one address per line.
pub struct SubscriberStore {
    path: PathBuf,
    // Serializes the read-then-append in `add`.
    write_lock: Mutex<()>,
}

impl SubscriberStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Appends `email` unless it is already listed. Returns whether it was added.
    pub async fn add(&self, email: &str) -> Result<bool> {
        let email = email.trim();
        ensure!(is_valid_address(email), "refusing to store invalid address {:?}", email);
        let _guard = self.write_lock.lock().await;

        if self.list().await?.iter().any(|known| known.eq_ignore_ascii_case(email)) {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening subscriber list {}", self.path.display()))?;
        file.write_all(format!("{email}\n").as_bytes()).await?;
        file.flush().await?;

        info!("New subscriber: {}", email);
        Ok(true)
    }

    /// Listed addresses in subscription order, blank lines and repeats dropped.
    pub async fn list(&self) -> Result<Vec<String>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => {
                return Err(e).with_context(|| format!("reading subscriber list {}", self.path.display()));
            }
        };

        let mut seen = HashSet::new();
        Ok(raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| seen.insert(line.to_ascii_lowercase()))
            .map(str::to_string)
            .collect())
    }
}
