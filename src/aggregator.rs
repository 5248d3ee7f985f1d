use std::sync::Arc;

use wallpaper_provider_interface::WallpaperEntry;

use crate::error::{ProviderError, Result};
use crate::fetcher::WallpaperSource;
use crate::registry::CustomSourceRegistry;

/// Combines the remote feed with the user's custom sources.
pub struct Aggregator {
    remote: Arc<dyn WallpaperSource>,
    registry: Arc<CustomSourceRegistry>,
}

impl Aggregator {
    pub fn new(remote: Arc<dyn WallpaperSource>, registry: Arc<CustomSourceRegistry>) -> Self {
        Self { remote, registry }
    }

    pub fn registry(&self) -> &CustomSourceRegistry { &self.registry }

    /// Remote entries first, then custom ones. A failed fetch contributes nothing;
    /// only an empty result is an error.
    pub async fn get_wallpapers(&self) -> Result<Vec<WallpaperEntry>> {
        let mut all = Vec::new();
        if self.registry.include_bing().await {
            match self.remote.fetch().await {
                Ok(list) => all.extend(list),
                Err(e) => tracing::error!(error = %e, "error fetching remote wallpapers"),
            }
        } else {
            tracing::debug!("remote wallpapers disabled");
        }
        all.extend(self.registry.list().await);
        if all.is_empty() {
            return Err(ProviderError::NoWallpapers);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::storage::MemoryStore;
    use crate::types::CustomSourceRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wallpaper_provider_interface::SourceType;

    struct FakeRemote {
        ok: bool,
        calls: AtomicUsize,
    }

    impl FakeRemote {
        fn new(ok: bool) -> Arc<Self> { Arc::new(Self { ok, calls: AtomicUsize::new(0) }) }
    }

    #[async_trait]
    impl WallpaperSource for FakeRemote {
        async fn fetch(&self) -> Result<Vec<WallpaperEntry>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.ok {
                return Err(FetchError::Parse("missing field `copyright`".into()));
            }
            Ok((0..2)
                .map(|i| WallpaperEntry {
                    id: format!("bing_{i}"),
                    title: format!("remote {i}"),
                    description: "Bing - x".into(),
                    image_url: format!("https://www.bing.com/{i}.jpg"),
                    thumbnail_url: format!("https://www.bing.com/{i}.jpg"),
                    source_type: SourceType::Image,
                })
                .collect())
        }
    }

    async fn setup(remote_ok: bool, custom: &[&str]) -> (Arc<FakeRemote>, Aggregator) {
        let registry = Arc::new(CustomSourceRegistry::new(Arc::new(MemoryStore::new())));
        for id in custom {
            registry
                .add(CustomSourceRecord::new(*id, *id, format!("http://c/{id}"), SourceType::Image))
                .await
                .unwrap();
        }
        let remote = FakeRemote::new(remote_ok);
        let agg = Aggregator::new(remote.clone(), registry);
        (remote, agg)
    }

    fn ids(entries: &[WallpaperEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[tokio::test]
    async fn remote_entries_come_before_custom() {
        let (_, agg) = setup(true, &["c1", "c2"]).await;
        let all = agg.get_wallpapers().await.unwrap();
        assert_eq!(ids(&all), vec!["bing_0", "bing_1", "c1", "c2"]);
    }

    #[tokio::test]
    async fn failed_fetch_degrades_to_custom_only() {
        let (_, agg) = setup(false, &["c1"]).await;
        assert_eq!(ids(&agg.get_wallpapers().await.unwrap()), vec!["c1"]);
    }

    #[tokio::test]
    async fn disabled_remote_is_not_called() {
        let (remote, agg) = setup(true, &["c1"]).await;
        agg.registry().set_include_bing(false).await.unwrap();
        assert_eq!(ids(&agg.get_wallpapers().await.unwrap()), vec!["c1"]);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn nothing_available_is_an_error() {
        let (_, agg) = setup(true, &[]).await;
        agg.registry().set_include_bing(false).await.unwrap();
        let err = agg.get_wallpapers().await.unwrap_err();
        assert!(matches!(err, ProviderError::NoWallpapers));
        assert_eq!(err.to_string(), "No wallpapers available");
    }

    #[tokio::test]
    async fn failed_fetch_and_no_custom_is_an_error() {
        let (_, agg) = setup(false, &[]).await;
        assert!(matches!(agg.get_wallpapers().await, Err(ProviderError::NoWallpapers)));
    }
}
