//! Log of queries that produced no fragments.
//!
//! The log is a JSON array of `{ "date": <rfc3339>, "message": <query> }`
//! that the wiki maintainers read to find gaps in the corpus. A missing
//! or corrupt file is started over rather than treated as an error.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnansweredEntry {
    pub date: DateTime<Utc>,
    pub message: String,
}

/// Read every logged entry. A missing file is an empty log.
pub async fn read_log(path: &Path) -> Result<Vec<UnansweredEntry>> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => serde_json::from_str(&raw)
            .with_context(|| format!("Corrupt unanswered log: {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e).with_context(|| format!("Failed to read unanswered log: {}", path.display())),
    }
}

/// Append `message` to the log at `path`.
pub async fn record(path: &Path, message: &str) -> Result<()> {
    let mut entries = match read_log(path).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "starting a new unanswered log");
            Vec::new()
        }
    };

    entries.push(UnansweredEntry {
        date: Utc::now(),
        message: message.to_string(),
    });

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    tokio::fs::write(path, serde_json::to_string_pretty(&entries)?)
        .await
        .with_context(|| format!("Failed to write unanswered log: {}", path.display()))?;

    Ok(())
}
