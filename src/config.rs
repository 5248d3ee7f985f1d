use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_ENDPOINT: &str = "https://www.bing.com/HPImageArchive.aspx";
pub const DEFAULT_ORIGIN: &str = "https://www.bing.com";
pub const DEFAULT_MARKET: &str = "en-US";
pub const DEFAULT_COUNT: u32 = 8;

/// Runtime settings. Every field may be omitted from the TOML file.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    pub endpoint: String,
    /// Prefix joined to the relative image paths returned by the feed.
    pub origin: String,
    pub market: String,
    pub count: u32,
    pub database_url: Option<String>,
    pub user_agent: String,
    /// No timeout unless set; the HTTP client default applies.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            market: DEFAULT_MARKET.to_string(),
            count: DEFAULT_COUNT,
            database_url: None,
            user_agent: concat!("wallpaper-provider/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: None,
        }
    }
}

impl ProviderConfig {
    /// Defaults, then the optional TOML file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        cfg.apply_env(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config: {}", path.display()))
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("WALLPAPER_PROVIDER_ENDPOINT").filter(|s| !s.trim().is_empty()) { self.endpoint = v; }
        if let Some(v) = lookup("WALLPAPER_PROVIDER_MARKET").filter(|s| !s.trim().is_empty()) { self.market = v; }
        if let Some(v) = lookup("WALLPAPER_PROVIDER_COUNT").and_then(|s| s.trim().parse().ok()) { self.count = v; }
        if let Some(v) = lookup("WALLPAPER_PROVIDER_DATABASE_URL").filter(|s| !s.trim().is_empty()) { self.database_url = Some(v); }
    }

    /// Full feed URL with market and result count in the query string.
    pub fn feed_url(&self) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.endpoint)
            .with_context(|| format!("invalid feed endpoint: {}", self.endpoint))?;
        url.query_pairs_mut()
            .append_pair("format", "js")
            .append_pair("idx", "0")
            .append_pair("n", &self.count.to_string())
            .append_pair("mkt", &self.market);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_feed_url_matches_bing_archive() {
        let url = ProviderConfig::default().feed_url().unwrap();
        assert_eq!(url.as_str(), "https://www.bing.com/HPImageArchive.aspx?format=js&idx=0&n=8&mkt=en-US");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: ProviderConfig = toml::from_str("market = \"de-DE\"\ncount = 3\n").unwrap();
        assert_eq!(cfg.market, "de-DE");
        assert_eq!(cfg.count, 3);
        assert_eq!(cfg.origin, DEFAULT_ORIGIN);
        assert!(cfg.request_timeout_secs.is_none());
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("WALLPAPER_PROVIDER_MARKET", "ja-JP"),
            ("WALLPAPER_PROVIDER_COUNT", "not-a-number"),
            ("WALLPAPER_PROVIDER_DATABASE_URL", "sqlite::memory:"),
        ]
        .into_iter()
        .collect();
        let mut cfg = ProviderConfig::default();
        cfg.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.market, "ja-JP");
        assert_eq!(cfg.count, DEFAULT_COUNT);
        assert_eq!(cfg.database_url.as_deref(), Some("sqlite::memory:"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("provider.toml");
        std::fs::write(&path, "origin = \"https://img.example\"\nrequest_timeout_secs = 15\n").unwrap();
        let cfg = ProviderConfig::from_file(&path).unwrap();
        assert_eq!(cfg.origin, "https://img.example");
        assert_eq!(cfg.request_timeout_secs, Some(15));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(ProviderConfig::from_file(Path::new("/definitely/not/here.toml")).is_err());
    }
}
