//! Shared between the provider and the host launcher.
//!
//! The host asks for wallpapers through a callback and receives either the
//! full list or a single error message.

use serde::{Deserialize, Serialize};

/// Kind of media a wallpaper entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Image,
    /// HLS playlist or other video stream.
    Video,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Image => "image",
            SourceType::Video => "video",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(SourceType::Image),
            "video" => Ok(SourceType::Video),
            other => Err(format!("unknown source type `{}` (expected image or video)", other)),
        }
    }
}

/// One wallpaper handed to the host. Built fresh on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallpaperEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub thumbnail_url: String,
    pub source_type: SourceType,
}

/// Result sink the host passes in with each wallpaper request.
pub trait WallpaperCallback {
    fn on_success(&self, wallpapers: Vec<WallpaperEntry>);
    fn on_error(&self, message: &str);
}
