use wallpaper_provider_interface::{SourceType, WallpaperEntry};

use crate::types::{CustomSourceRecord, FeedImage, DEFAULT_DESCRIPTION};

pub fn remote_id(index: usize) -> String {
    format!("bing_{}", index)
}

/// Joins the feed's relative path onto the configured origin.
pub fn absolute_image_url(origin: &str, path: &str) -> String {
    format!("{}{}", origin, path)
}

pub(crate) fn entry_from_feed_image(index: usize, origin: &str, img: FeedImage) -> WallpaperEntry {
    let url = absolute_image_url(origin, &img.url);
    WallpaperEntry {
        id: remote_id(index),
        title: img.title,
        description: format!("Bing - {}", img.copyright),
        image_url: url.clone(),
        thumbnail_url: url,
        source_type: SourceType::Image,
    }
}

pub fn entry_from_record(rec: &CustomSourceRecord) -> WallpaperEntry {
    WallpaperEntry {
        id: rec.id.clone(),
        title: rec.title.clone(),
        description: rec.description.clone().unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        image_url: rec.url.clone(),
        thumbnail_url: rec.thumbnail.clone().unwrap_or_else(|| rec.url.clone()),
        source_type: rec.source_type,
    }
}
