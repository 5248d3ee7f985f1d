use serde::{Deserialize, Serialize};
use wallpaper_provider_interface::SourceType;

pub(crate) const DEFAULT_DESCRIPTION: &str = "Custom Source";

/// User-added source as persisted in the `custom_sources` JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomSourceRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(rename = "type", default)]
    pub source_type: SourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Present when `url` was extracted from a page link and may expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<StreamOrigin>,
}

/// Where a stored stream URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    /// Signed media URL pasted directly (googlevideo, mp4 and similar).
    Direct,
    Youtube,
    Rutube,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOrigin {
    pub original_url: String,
    pub kind: StreamKind,
    /// Unix epoch milliseconds of the last extraction.
    pub resolved_at: u64,
}

impl CustomSourceRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>, source_type: SourceType) -> Self {
        Self { id: id.into(), title: title.into(), url: url.into(), source_type, description: None, thumbnail: None, stream: None }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    pub fn with_stream(mut self, origin: StreamOrigin) -> Self {
        self.stream = Some(origin);
        self
    }
}

// Wire shape of the image-of-the-day feed. Extra fields are ignored.
#[derive(Deserialize)]
pub(crate) struct FeedResponse { pub images: Vec<FeedImage> }

#[derive(Deserialize)]
pub(crate) struct FeedImage {
    pub url: String,
    pub title: String,
    pub copyright: String,
}
