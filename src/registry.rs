use std::sync::Arc;

use wallpaper_provider_interface::WallpaperEntry;

use crate::error::{ProviderError, Result};
use crate::mapping::entry_from_record;
use crate::storage::PreferenceStore;
use crate::types::CustomSourceRecord;

pub const KEY_CUSTOM_SOURCES: &str = "custom_sources";
pub const KEY_INCLUDE_BING: &str = "include_bing";

/// User-added sources and the remote toggle, kept in a [`PreferenceStore`].
///
/// The whole source list lives in one JSON array under [`KEY_CUSTOM_SOURCES`]
/// and is rewritten on every mutation.
pub struct CustomSourceRegistry {
    store: Arc<dyn PreferenceStore>,
}

impl CustomSourceRegistry {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self { Self { store } }

    /// Entries for every stored record, in insertion order. Unreadable data yields none.
    pub async fn list(&self) -> Vec<WallpaperEntry> {
        match self.records().await {
            Ok(records) => records
                .iter()
                .map(|r| {
                    tracing::debug!(title = %r.title, "added custom wallpaper");
                    entry_from_record(r)
                })
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable custom sources");
                Vec::new()
            }
        }
    }

    /// Stored records as-is, without defaults applied.
    pub async fn records(&self) -> Result<Vec<CustomSourceRecord>> {
        let raw = self
            .store
            .get_string(KEY_CUSTOM_SOURCES)
            .await
            .map_err(ProviderError::persistence)?;
        match raw {
            None => Ok(Vec::new()),
            Some(s) => serde_json::from_str(&s).map_err(|e| ProviderError::CorruptSources(e.to_string())),
        }
    }

    pub async fn add(&self, record: CustomSourceRecord) -> Result<()> {
        let mut records = self.records().await?;
        if records.iter().any(|r| r.id == record.id) {
            return Err(ProviderError::DuplicateSource(record.id));
        }
        let title = record.title.clone();
        records.push(record);
        self.write(&records).await?;
        tracing::info!(%title, "added custom source");
        Ok(())
    }

    /// Stores `record`, suffixing its id with `_<n>` if it is already taken.
    /// Returns the record as stored.
    pub async fn add_unique(&self, mut record: CustomSourceRecord) -> Result<CustomSourceRecord> {
        let mut records = self.records().await?;
        let taken = |id: &str| records.iter().any(|r| r.id == id);
        if taken(&record.id) {
            let base = record.id.clone();
            let n = (1..).find(|n| !taken(&format!("{}_{}", base, n))).unwrap_or_default();
            record.id = format!("{}_{}", base, n);
        }
        records.push(record.clone());
        self.write(&records).await?;
        tracing::info!(title = %record.title, id = %record.id, "added custom source");
        Ok(record)
    }

    /// Drops every record with `id`. Returns how many were removed; zero is not an error.
    pub async fn remove(&self, id: &str) -> Result<usize> {
        let records = self.records().await?;
        let before = records.len();
        let kept: Vec<_> = records.into_iter().filter(|r| r.id != id).collect();
        let removed = before - kept.len();
        self.write(&kept).await?;
        tracing::info!(%id, removed, "removed custom source");
        Ok(removed)
    }

    /// Replaces the full record list.
    pub async fn replace_all(&self, records: &[CustomSourceRecord]) -> Result<()> {
        self.write(records).await
    }

    pub async fn include_bing(&self) -> bool {
        match self.store.get_bool(KEY_INCLUDE_BING, true).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read include_bing, using default");
                true
            }
        }
    }

    pub async fn set_include_bing(&self, include: bool) -> Result<()> {
        self.store
            .put_bool(KEY_INCLUDE_BING, include)
            .await
            .map_err(ProviderError::persistence)?;
        tracing::info!(include, "include bing updated");
        Ok(())
    }

    async fn write(&self, records: &[CustomSourceRecord]) -> Result<()> {
        let payload = serde_json::to_string(records).map_err(ProviderError::persistence)?;
        self.store
            .put_string(KEY_CUSTOM_SOURCES, &payload)
            .await
            .map_err(ProviderError::persistence)
    }
}
