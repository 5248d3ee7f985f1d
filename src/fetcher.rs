use std::time::Duration;

use async_trait::async_trait;
use wallpaper_provider_interface::WallpaperEntry;

use crate::config::ProviderConfig;
use crate::error::FetchError;
use crate::mapping::entry_from_feed_image;
use crate::types::FeedResponse;

/// Remote supplier of wallpaper entries.
#[async_trait]
pub trait WallpaperSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<WallpaperEntry>, FetchError>;
}

/// Fetches the daily image list from the Bing image archive.
pub struct BingFetcher {
    client: reqwest::Client,
    feed_url: url::Url,
    origin: String,
}

impl BingFetcher {
    pub fn new(cfg: &ProviderConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(cfg.user_agent.clone());
        if let Some(secs) = cfg.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self { client: builder.build()?, feed_url: cfg.feed_url()?, origin: cfg.origin.clone() })
    }

    pub fn feed_url(&self) -> &url::Url { &self.feed_url }
}

#[async_trait]
impl WallpaperSource for BingFetcher {
    async fn fetch(&self) -> Result<Vec<WallpaperEntry>, FetchError> {
        let resp = self.client.get(self.feed_url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = resp.text().await?;
        let entries = parse_feed(&body, &self.origin)?;
        tracing::info!(count = entries.len(), "fetched remote wallpapers");
        Ok(entries)
    }
}

/// All-or-nothing: one malformed image fails the whole feed.
pub fn parse_feed(body: &str, origin: &str) -> Result<Vec<WallpaperEntry>, FetchError> {
    let feed: FeedResponse = serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;
    Ok(feed
        .images
        .into_iter()
        .enumerate()
        .map(|(i, img)| {
            let entry = entry_from_feed_image(i, origin, img);
            tracing::debug!(title = %entry.title, "added remote wallpaper");
            entry
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    const ORIGIN: &str = "https://www.bing.com";

    const FEED: &str = r#"{"images":[
        {"url":"/th?id=OHR.One.jpg","title":"One","copyright":"A (c) B","hsh":"x"},
        {"url":"/th?id=OHR.Two.jpg","title":"Two","copyright":"C"}
    ],"tooltips":{}}"#;

    #[test]
    fn parses_every_image_in_order() {
        let entries = parse_feed(FEED, ORIGIN).unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["bing_0", "bing_1"]);
        assert_eq!(entries[1].image_url, "https://www.bing.com/th?id=OHR.Two.jpg");
        assert_eq!(entries[0].description, "Bing - A (c) B");
    }

    #[test]
    fn missing_field_fails_whole_feed() {
        let body = r#"{"images":[{"url":"/a.jpg","title":"ok","copyright":"c"},{"url":"/b.jpg","title":"no copyright"}]}"#;
        assert!(matches!(parse_feed(body, ORIGIN), Err(FetchError::Parse(_))));
    }

    #[test]
    fn wrong_type_and_missing_images_fail() {
        assert!(parse_feed(r#"{"images":[{"url":1,"title":"t","copyright":"c"}]}"#, ORIGIN).is_err());
        assert!(parse_feed(r#"{"other":[]}"#, ORIGIN).is_err());
        assert!(parse_feed("not json", ORIGIN).is_err());
    }

    #[test]
    fn empty_image_list_is_ok() {
        assert!(parse_feed(r#"{"images":[]}"#, ORIGIN).unwrap().is_empty());
    }

    // Serves a single canned HTTP response and returns the endpoint URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = sock.read(&mut buf).await;
            let resp = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = sock.write_all(resp.as_bytes()).await;
            let _ = sock.shutdown().await;
        });
        format!("http://{}/HPImageArchive.aspx", addr)
    }

    fn fetcher_for(endpoint: String) -> BingFetcher {
        let cfg = ProviderConfig { endpoint, ..ProviderConfig::default() };
        BingFetcher::new(&cfg).unwrap()
    }

    #[tokio::test]
    async fn fetch_maps_successful_response() {
        let endpoint = serve_once("200 OK", FEED).await;
        let entries = fetcher_for(endpoint).fetch().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "One");
    }

    #[tokio::test]
    async fn fetch_rejects_non_success_status() {
        let endpoint = serve_once("503 Service Unavailable", "{}").await;
        let err = fetcher_for(endpoint).fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Status(503)));
    }

    #[test]
    fn feed_url_carries_market_and_count() {
        let f = fetcher_for("https://example.test/feed".into());
        assert_eq!(f.feed_url().as_str(), "https://example.test/feed?format=js&idx=0&n=8&mkt=en-US");
    }
}
