pub mod aggregator;
pub mod config;
pub mod db;
pub mod error;
pub mod fetcher;
pub mod mapping;
pub mod registry;
pub mod settings;
pub mod storage;
pub mod stream;
pub mod types;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use wallpaper_provider_interface::{SourceType, WallpaperCallback, WallpaperEntry};
    pub use crate::config::ProviderConfig;
    pub use crate::error::{FetchError, ProviderError};
    pub use crate::settings::{FormWarning, SourceForm};
    pub use crate::types::CustomSourceRecord;
    pub use crate::stream::ResolvedStream;
    pub use crate::types::{StreamKind, StreamOrigin};
    pub use crate::{Provider, RefreshReport};
}

use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use wallpaper_provider_interface::{SourceType, WallpaperEntry};

use crate::aggregator::Aggregator;
use crate::config::ProviderConfig;
use crate::db::Database;
use crate::error::{ProviderError, Result};
use crate::fetcher::{BingFetcher, WallpaperSource};
use crate::registry::CustomSourceRegistry;
use crate::settings::{FormWarning, SourceForm};
use crate::storage::PreferenceStore;
use crate::stream::{ResolvedStream, StreamResolver};
use crate::types::CustomSourceRecord;

/// Snapshot of every stored preference, used to move settings between devices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesExport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_bing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_sources: Option<Vec<CustomSourceRecord>>,
}

/// Outcome of one pass over expired stream sources, by record id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub refreshed: Vec<String>,
    /// Direct links, which cannot be extracted again.
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Library entry point. Owns the preference store, the remote fetcher and the aggregator.
pub struct Provider {
    config: ProviderConfig,
    registry: Arc<CustomSourceRegistry>,
    aggregator: Aggregator,
}

impl Provider {
    /// Open the configured SQLite store (running migrations) and build the Bing fetcher.
    pub async fn connect(config: ProviderConfig) -> anyhow::Result<Self> {
        let db = Database::connect(config.database_url.as_deref()).await?;
        db.run_migrations().await?;
        let remote = BingFetcher::new(&config).context("building image feed client")?;
        Ok(Self::with_parts(config, Arc::new(db), Arc::new(remote)))
    }

    /// Assemble from an arbitrary store and remote source.
    pub fn with_parts(config: ProviderConfig, store: Arc<dyn PreferenceStore>, remote: Arc<dyn WallpaperSource>) -> Self {
        let registry = Arc::new(CustomSourceRegistry::new(store));
        let aggregator = Aggregator::new(remote, registry.clone());
        Self { config, registry, aggregator }
    }

    pub fn config(&self) -> &ProviderConfig { &self.config }

    pub async fn get_wallpapers(&self) -> Result<Vec<WallpaperEntry>> {
        self.aggregator.get_wallpapers().await
    }

    pub async fn list_custom_sources(&self) -> Vec<WallpaperEntry> { self.registry.list().await }

    pub async fn custom_records(&self) -> Result<Vec<CustomSourceRecord>> { self.registry.records().await }

    pub async fn add_custom_source(&self, record: CustomSourceRecord) -> Result<()> {
        self.registry.add(record).await
    }

    /// Validate a settings form and store it under a fresh `custom_<millis>` id.
    pub async fn add_from_form(&self, form: SourceForm) -> Result<(CustomSourceRecord, Vec<FormWarning>)> {
        let (record, warnings) = form.into_record(settings::now_millis())?;
        let record = self.registry.add_unique(record).await?;
        Ok((record, warnings))
    }

    /// Like [`Provider::add_from_form`], but first resolves a YouTube, Rutube or direct link
    /// to a playable stream and remembers where it came from.
    pub async fn add_stream_source(&self, form: SourceForm) -> Result<(CustomSourceRecord, Vec<FormWarning>)> {
        let resolver = self.stream_resolver()?;
        self.add_stream_source_with(&resolver, form, settings::now_millis()).await
    }

    pub async fn add_stream_source_with(
        &self,
        resolver: &StreamResolver,
        mut form: SourceForm,
        now: u64,
    ) -> Result<(CustomSourceRecord, Vec<FormWarning>)> {
        form.source_type = SourceType::Video;
        form.validate()?;
        let ResolvedStream { url, origin } = resolver.resolve_stream(&form.url, now).await?;
        form.url = url;
        let (mut record, warnings) = form.into_record(now)?;
        record.stream = origin;
        let record = self.registry.add_unique(record).await?;
        Ok((record, warnings))
    }

    /// Stream sources whose extracted URL is past its lifetime at `now`.
    pub async fn expired_sources(&self, now: u64) -> Result<Vec<CustomSourceRecord>> {
        let records = self.registry.records().await?;
        Ok(records.into_iter().filter(|r| r.stream.as_ref().is_some_and(|o| o.is_expired(now))).collect())
    }

    pub async fn refresh_expired_sources(&self) -> Result<RefreshReport> {
        let resolver = self.stream_resolver()?;
        self.refresh_expired_sources_with(&resolver, settings::now_millis()).await
    }

    /// Re-extracts every expired YouTube or Rutube source and stores the new URLs.
    /// A thumbnail that pointed at the old stream URL follows it.
    pub async fn refresh_expired_sources_with(&self, resolver: &StreamResolver, now: u64) -> Result<RefreshReport> {
        let mut records = self.registry.records().await?;
        let mut report = RefreshReport::default();
        for rec in records.iter_mut() {
            let Some(origin) = rec.stream.clone().filter(|o| o.is_expired(now)) else { continue };
            if !origin.is_refreshable() {
                report.skipped.push(rec.id.clone());
                continue;
            }
            match resolver.refresh(&origin, now).await {
                Ok(fresh) => {
                    if rec.thumbnail.as_deref() == Some(rec.url.as_str()) {
                        rec.thumbnail = Some(fresh.url.clone());
                    }
                    rec.url = fresh.url;
                    rec.stream = fresh.origin;
                    report.refreshed.push(rec.id.clone());
                }
                Err(e) => {
                    tracing::warn!(id = %rec.id, error = %e, "stream refresh failed");
                    report.failed.push((rec.id.clone(), e.to_string()));
                }
            }
        }
        if !report.refreshed.is_empty() {
            self.registry.replace_all(&records).await?;
        }
        Ok(report)
    }

    pub async fn remove_custom_source(&self, id: &str) -> Result<usize> { self.registry.remove(id).await }

    pub async fn include_bing(&self) -> bool { self.registry.include_bing().await }

    pub async fn set_include_bing(&self, include: bool) -> Result<()> { self.registry.set_include_bing(include).await }

    pub fn stream_resolver(&self) -> Result<StreamResolver> { StreamResolver::new(&self.config.user_agent) }

    pub async fn export_preferences(&self) -> Result<String> {
        let export = PreferencesExport {
            include_bing: Some(self.include_bing().await),
            // Left out when unreadable, so importing the export keeps the stored value.
            custom_sources: match self.registry.records().await {
                Ok(records) => Some(records),
                Err(e) => {
                    tracing::warn!(error = %e, "exporting without unreadable custom sources");
                    None
                }
            },
        };
        serde_json::to_string(&export).map_err(ProviderError::persistence)
    }

    /// Keys absent from `json` keep their current values.
    pub async fn import_preferences(&self, json: &str) -> Result<()> {
        let import: PreferencesExport = serde_json::from_str(json)
            .map_err(|e| ProviderError::InvalidSource(format!("invalid preferences: {}", e)))?;
        if let Some(sources) = &import.custom_sources {
            let mut seen = std::collections::HashSet::new();
            if let Some(dup) = sources.iter().find(|r| !seen.insert(r.id.as_str())) {
                return Err(ProviderError::DuplicateSource(dup.id.clone()));
            }
            self.registry.replace_all(sources).await?;
        }
        if let Some(include) = import.include_bing {
            self.registry.set_include_bing(include).await?;
        }
        tracing::info!("imported preferences");
        Ok(())
    }
}
