use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde_json::{json, Value};

use crate::error::{FetchError, ProviderError, Result};
use crate::settings::now_millis;
use crate::types::{StreamKind, StreamOrigin};

const RUTUBE_HOST: &str = "rutube.ru";
const RUTUBE_REFERER: &str = "https://rutube.ru";
const RUTUBE_OPTIONS_API: &str = "https://rutube.ru/api/play/options";
const YOUTUBE_WATCH: &str = "https://www.youtube.com/watch";
const MOBILE_USER_AGENT: &str =
    "Mozilla/5.0 (Linux; Android 10) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.120 Mobile Safari/537.36";

pub const URL_EXPIRY_HOURS: u64 = 5;
pub const DIRECT_URL_EXPIRY_HOURS: u64 = 6;
const MILLIS_PER_HOUR: u64 = 60 * 60 * 1000;

static RUTUBE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)rutube\.ru/video/([a-f0-9]+)").expect("valid rutube id regex"));
static YOUTUBE_IDS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|m\.youtube\.com/watch\?v=)([a-zA-Z0-9_-]{11})")
            .expect("valid youtube url regex"),
        Regex::new(r"v=([a-zA-Z0-9_-]{11})").expect("valid youtube query regex"),
    ]
});
static VIDEOPLAYBACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)videoplayback\?").expect("valid videoplayback regex"));
static PLAYER_RESPONSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ytInitialPlayerResponse\s*=\s*").expect("valid player response regex"));
static HLS_MANIFEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""streamingData":\{[^}]*"hlsManifestUrl":"([^"]+)""#).expect("valid manifest regex")
});

pub fn is_hls_url(url: &str) -> bool {
    url.to_ascii_lowercase().ends_with(".m3u8")
}

fn is_web_url(url: &str) -> bool {
    matches!(url::Url::parse(url), Ok(u) if matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
}

/// Playable stream link: an HLS playlist, a DASH/HLS manifest or a googlevideo URL.
pub fn is_valid_m3u8_url(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() || !is_web_url(url) {
        return false;
    }
    let lower = url.to_ascii_lowercase();
    lower.contains(".m3u8") || lower.contains("manifest") || lower.contains("googlevideo.com")
}

/// Signed media file URLs, which stop working after a few hours and cannot be re-extracted.
pub fn is_direct_video_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.contains("googlevideo.com")
        || lower.contains(".mp4")
        || lower.contains(".webm")
        || lower.contains(".mkv")
        || VIDEOPLAYBACK.is_match(url)
}

pub fn is_rutube_url(url: &str) -> bool {
    url.to_ascii_lowercase().contains(RUTUBE_HOST)
}

pub fn is_youtube_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.contains("youtube.com") || lower.contains("youtu.be")
}

/// Hex video id following `rutube.ru/video/`, in its original case.
pub fn rutube_video_id(url: &str) -> Option<String> {
    RUTUBE_ID.captures(url).map(|c| c[1].to_string())
}

pub fn youtube_video_id(url: &str) -> Option<String> {
    YOUTUBE_IDS.iter().find_map(|re| re.captures(url).map(|c| c[1].to_string()))
}

fn balancer_pick(obj: &serde_json::Map<String, Value>) -> Option<String> {
    ["m3u8", "default"]
        .iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Picks the playlist URL out of a Rutube play-options document.
pub fn playlist_from_options(doc: &Value) -> Option<String> {
    let from_balancer = match doc.get("video_balancer") {
        Some(Value::String(s)) if s.trim_start().starts_with('{') => serde_json::from_str::<Value>(s)
            .ok()
            .and_then(|v| v.as_object().and_then(balancer_pick)),
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Object(obj)) => balancer_pick(obj),
        _ => None,
    };
    from_balancer.or_else(|| {
        ["m3u8", "hls"]
            .iter()
            .filter_map(|k| doc.get(*k).and_then(Value::as_str))
            .find(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// The player response embedded in a YouTube watch page.
pub fn player_response_from_html(html: &str) -> Option<Value> {
    if let Some(m) = PLAYER_RESPONSE.find(html) {
        // Parse exactly one JSON value; the rest of the script is ignored.
        let mut values = serde_json::Deserializer::from_str(&html[m.end()..]).into_iter::<Value>();
        if let Some(Ok(v)) = values.next() {
            if v.is_object() {
                return Some(v);
            }
        }
    }
    HLS_MANIFEST
        .captures(html)
        .map(|c| json!({ "streamingData": { "hlsManifestUrl": c[1].replace("\\/", "/") } }))
}

fn manifest_in(formats: Option<&Value>) -> Option<String> {
    formats?
        .as_array()?
        .iter()
        .filter_map(|f| f.get("url").and_then(Value::as_str))
        .find(|u| u.contains("m3u8") || u.contains("manifest"))
        .map(str::to_string)
}

/// HLS manifest if there is one, else the tallest progressive video format.
pub fn stream_from_player_response(doc: &Value) -> Option<String> {
    let data = doc.get("streamingData")?;
    if let Some(hls) = data.get("hlsManifestUrl").and_then(Value::as_str).filter(|s| !s.is_empty()) {
        return Some(hls.to_string());
    }
    manifest_in(data.get("formats"))
        .or_else(|| manifest_in(data.get("adaptiveFormats")))
        .or_else(|| {
            data.get("formats")?
                .as_array()?
                .iter()
                .filter(|f| f.get("mimeType").and_then(Value::as_str).is_some_and(|m| m.contains("video")))
                .filter_map(|f| {
                    let url = f.get("url").and_then(Value::as_str).filter(|u| !u.is_empty())?;
                    let height = f.get("height").and_then(Value::as_u64).unwrap_or(0);
                    (height > 0).then_some((height, url))
                })
                .max_by_key(|(h, _)| *h)
                .map(|(_, u)| u.to_string())
        })
}

impl StreamOrigin {
    pub fn hours_since(&self, now_millis: u64) -> u64 {
        if self.resolved_at == 0 {
            return 0;
        }
        now_millis.saturating_sub(self.resolved_at) / MILLIS_PER_HOUR
    }

    /// Extracted URLs last five hours, direct ones six. An unset timestamp never expires.
    pub fn is_expired(&self, now_millis: u64) -> bool {
        if self.resolved_at == 0 {
            return false;
        }
        let limit = match self.kind {
            StreamKind::Direct => DIRECT_URL_EXPIRY_HOURS,
            StreamKind::Youtube | StreamKind::Rutube => URL_EXPIRY_HOURS,
        };
        self.hours_since(now_millis) >= limit
    }

    /// Only page links can be extracted again.
    pub fn is_refreshable(&self) -> bool {
        matches!(self.kind, StreamKind::Youtube | StreamKind::Rutube)
    }
}

/// A playable URL plus, for extracted or signed links, where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStream {
    pub url: String,
    pub origin: Option<StreamOrigin>,
}

/// Turns user-entered video links into playable stream URLs.
pub struct StreamResolver {
    client: reqwest::Client,
    rutube_api: String,
    youtube_watch: String,
}

impl StreamResolver {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(FetchError::from)?;
        Ok(Self { client, rutube_api: RUTUBE_OPTIONS_API.to_string(), youtube_watch: YOUTUBE_WATCH.to_string() })
    }

    #[cfg(test)]
    pub(crate) fn with_endpoints(mut self, rutube_api: String, youtube_watch: String) -> Self {
        self.rutube_api = rutube_api;
        self.youtube_watch = youtube_watch;
        self
    }

    pub async fn resolve(&self, url: &str) -> Result<String> {
        Ok(self.resolve_stream(url, now_millis()).await?.url)
    }

    pub async fn resolve_stream(&self, url: &str, now: u64) -> Result<ResolvedStream> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ProviderError::InvalidSource("Enter a URL".into()));
        }
        let origin = |kind| Some(StreamOrigin { original_url: url.to_string(), kind, resolved_at: now });
        if is_rutube_url(url) {
            let resolved = self.extract_rutube(url).await?;
            return Ok(ResolvedStream { url: resolved, origin: origin(StreamKind::Rutube) });
        }
        if is_youtube_url(url) {
            let resolved = self.extract_youtube(url).await?;
            return Ok(ResolvedStream { url: resolved, origin: origin(StreamKind::Youtube) });
        }
        if is_web_url(url) && is_direct_video_url(url) {
            tracing::warn!("direct video URLs typically expire after {} hours", DIRECT_URL_EXPIRY_HOURS);
            return Ok(ResolvedStream { url: url.to_string(), origin: origin(StreamKind::Direct) });
        }
        if is_valid_m3u8_url(url) {
            return Ok(ResolvedStream { url: url.to_string(), origin: None });
        }
        Err(ProviderError::InvalidSource("Enter a valid YouTube, Rutube or M3U8 URL".into()))
    }

    /// Extract again from the original page link.
    pub async fn refresh(&self, origin: &StreamOrigin, now: u64) -> Result<ResolvedStream> {
        let url = match origin.kind {
            StreamKind::Direct => {
                return Err(ProviderError::InvalidSource("Direct URLs cannot be refreshed automatically".into()))
            }
            StreamKind::Rutube => self.extract_rutube(&origin.original_url).await?,
            StreamKind::Youtube => self.extract_youtube(&origin.original_url).await?,
        };
        tracing::info!(original = %origin.original_url, "refreshed stream url");
        Ok(ResolvedStream {
            url,
            origin: Some(StreamOrigin { resolved_at: now, ..origin.clone() }),
        })
    }

    async fn get_text(&self, req: reqwest::RequestBuilder) -> Result<String> {
        let resp = req.send().await.map_err(FetchError::from)?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()).into());
        }
        let body = resp.text().await.map_err(FetchError::from)?;
        if body.trim().is_empty() {
            return Err(FetchError::Parse("empty response".into()).into());
        }
        Ok(body)
    }

    async fn extract_rutube(&self, page_url: &str) -> Result<String> {
        let id = rutube_video_id(page_url).ok_or_else(|| {
            ProviderError::InvalidSource(format!("Could not extract video ID from URL: {}", page_url))
        })?;
        let api_url = format!("{}/{}/?no_404=true&referer=https%3A%2F%2Frutube.ru", self.rutube_api, id);
        let body = self
            .get_text(self.client.get(&api_url).header(reqwest::header::REFERER, RUTUBE_REFERER))
            .await?;
        let doc: Value = serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))?;
        let playlist = playlist_from_options(&doc)
            .ok_or_else(|| FetchError::Parse("no M3U8 URL found in response".into()))?;
        tracing::info!(video_id = %id, "resolved rutube playlist");
        Ok(playlist)
    }

    async fn extract_youtube(&self, page_url: &str) -> Result<String> {
        let id = youtube_video_id(page_url).ok_or_else(|| {
            ProviderError::InvalidSource(format!("Could not extract video ID from YouTube URL: {}", page_url))
        })?;
        let watch_url = format!("{}?v={}", self.youtube_watch, id);
        let req = self
            .client
            .get(&watch_url)
            .header(reqwest::header::USER_AGENT, MOBILE_USER_AGENT)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9");
        let html = self.get_text(req).await?;
        let doc = player_response_from_html(&html)
            .ok_or_else(|| FetchError::Parse("could not find player response in YouTube page".into()))?;
        let stream = stream_from_player_response(&doc)
            .ok_or_else(|| FetchError::Parse("no stream found for this video".into()))?;
        tracing::info!(video_id = %id, "resolved youtube stream");
        Ok(stream)
    }
}
