//! Source health listing for `kh sources` and `GET /sources`.

use anyhow::Result;
use serde::Serialize;

use crate::models::SourceKind;
use crate::traits::SourceRegistry;

#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub name: String,
    pub kind: SourceKind,
    pub healthy: bool,
    /// Readiness summary, or the error that makes the source unavailable.
    pub detail: String,
}

/// Probe every registered source, in registration order.
pub async fn source_statuses(registry: &SourceRegistry) -> Vec<SourceStatus> {
    let mut statuses = Vec::with_capacity(registry.len());
    for source in registry.sources() {
        let (healthy, detail) = match source.health().await {
            Ok(detail) => (true, detail),
            Err(e) => (false, format!("{:#}", e)),
        };
        statuses.push(SourceStatus {
            name: source.name().to_string(),
            kind: source.kind(),
            healthy,
            detail,
        });
    }
    statuses
}

pub async fn list_sources(registry: &SourceRegistry) -> Result<()> {
    println!("{:<12} {:<12} {:<8} DETAIL", "SOURCE", "KIND", "HEALTHY");
    for status in source_statuses(registry).await {
        println!(
            "{:<12} {:<12} {:<8} {}",
            status.name, status.kind, status.healthy, status.detail
        );
    }
    Ok(())
}
