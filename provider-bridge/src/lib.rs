//! Host bridge for the wallpaper provider.
//! Exposes the callback-style surface the launcher's plugin runtime calls into.

use std::sync::Arc;

use anyhow::Result;
use wallpaper_provider::prelude::*;

pub struct ProviderBridge {
    inner: Arc<Provider>,
}

impl ProviderBridge {
    /// Open the provider from config; `None` uses defaults plus environment overrides.
    pub async fn new(config: Option<ProviderConfig>) -> Result<Self> {
        let config = match config {
            Some(c) => c,
            None => ProviderConfig::load(None)?,
        };
        let p = Provider::connect(config).await?;
        Ok(Self { inner: Arc::new(p) })
    }

    pub fn from_provider(provider: Arc<Provider>) -> Self { Self { inner: provider } }

    /// Answer a host wallpaper request through its callback.
    pub async fn on_get_wallpapers(&self, callback: &dyn WallpaperCallback) {
        tracing::debug!("on_get_wallpapers called");
        match self.inner.get_wallpapers().await {
            Ok(list) => callback.on_success(list),
            Err(e) => callback.on_error(&e.to_string()),
        }
    }

    pub async fn get_preferences(&self) -> Result<String> {
        Ok(self.inner.export_preferences().await?)
    }

    pub async fn set_preferences(&self, params: String) -> Result<()> {
        Ok(self.inner.import_preferences(&params).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        success: Mutex<Option<Vec<WallpaperEntry>>>,
        error: Mutex<Option<String>>,
    }

    impl WallpaperCallback for Recorder {
        fn on_success(&self, wallpapers: Vec<WallpaperEntry>) {
            *self.success.lock().unwrap() = Some(wallpapers);
        }
        fn on_error(&self, message: &str) {
            *self.error.lock().unwrap() = Some(message.to_string());
        }
    }

    async fn offline_bridge(dir: &tempfile::TempDir) -> ProviderBridge {
        let config = ProviderConfig {
            // Nothing listens here; the remote fetch fails fast.
            endpoint: "http://127.0.0.1:9/feed".into(),
            database_url: Some(wallpaper_provider::db::sqlite_url_for(&dir.path().join("prefs.db"))),
            ..ProviderConfig::default()
        };
        ProviderBridge::new(Some(config)).await.unwrap()
    }

    #[tokio::test]
    async fn empty_provider_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = offline_bridge(&dir).await;
        let rec = Recorder::default();
        bridge.on_get_wallpapers(&rec).await;
        assert_eq!(rec.error.lock().unwrap().as_deref(), Some("No wallpapers available"));
        assert!(rec.success.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn imported_sources_are_delivered() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = offline_bridge(&dir).await;
        bridge
            .set_preferences(r#"{"include_bing":false,"custom_sources":[{"id":"custom_1","title":"Cam","url":"https://c/live.m3u8","type":"video"}]}"#.into())
            .await
            .unwrap();
        let rec = Recorder::default();
        bridge.on_get_wallpapers(&rec).await;
        let list = rec.success.lock().unwrap().take().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].description, "Custom Source");
        assert_eq!(list[0].source_type, SourceType::Video);
    }
}
