//! UI-independent model of the settings screen: the add-source form and the
//! source list text.

use std::fmt::Write as _;

use wallpaper_provider_interface::SourceType;

use crate::error::{ProviderError, Result};
use crate::types::{CustomSourceRecord, DEFAULT_DESCRIPTION};

#[derive(Debug, Clone, Default)]
pub struct SourceForm {
    pub title: String,
    pub url: String,
    pub description: String,
    pub thumbnail: String,
    pub source_type: SourceType,
}

/// Non-fatal issues the UI should show alongside a successful add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormWarning {
    UnexpectedStreamExtension,
}

impl std::fmt::Display for FormWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormWarning::UnexpectedStreamExtension => {
                f.write_str("Warning: Video URLs should typically be .m3u8 or .m3u streams")
            }
        }
    }
}

impl SourceForm {
    /// Trims every field and checks the ones the registry relies on.
    pub fn validate(&self) -> Result<Vec<FormWarning>> {
        let title = self.title.trim();
        let url = self.url.trim();
        if title.is_empty() {
            return Err(ProviderError::InvalidSource("Please enter a title".into()));
        }
        if url.is_empty() {
            return Err(ProviderError::InvalidSource("Please enter a URL".into()));
        }
        let scheme_ok = (url.starts_with("http://") || url.starts_with("https://")) && url::Url::parse(url).is_ok();
        if !scheme_ok {
            return Err(ProviderError::InvalidSource("URL must start with http:// or https://".into()));
        }

        let mut warnings = Vec::new();
        if self.source_type == SourceType::Video && !url.ends_with(".m3u8") && !url.ends_with(".m3u") {
            warnings.push(FormWarning::UnexpectedStreamExtension);
        }
        Ok(warnings)
    }

    /// Validated record with id `custom_<now_millis>`. The registry suffixes it on collision.
    pub fn into_record(self, now_millis: u64) -> Result<(CustomSourceRecord, Vec<FormWarning>)> {
        let warnings = self.validate()?;
        let url = self.url.trim().to_string();
        let description = match self.description.trim() {
            "" => DEFAULT_DESCRIPTION.to_string(),
            d => d.to_string(),
        };
        let thumbnail = match self.thumbnail.trim() {
            "" => url.clone(),
            t => t.to_string(),
        };
        let record = CustomSourceRecord::new(format!("custom_{}", now_millis), self.title.trim(), url, self.source_type)
            .with_description(description)
            .with_thumbnail(thumbnail);
        Ok((record, warnings))
    }
}

pub fn render_source_list(records: &[CustomSourceRecord]) -> String {
    let mut out = String::from("Custom Sources:\n\n");
    if records.is_empty() {
        out.push_str("No custom sources added yet.");
        return out;
    }
    for (i, r) in records.iter().enumerate() {
        let _ = write!(out, "{}. {}\n   Type: {}\n   URL: {}\n\n", i + 1, r.title, r.source_type, r.url);
    }
    out
}

pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(title: &str, url: &str, ty: SourceType) -> SourceForm {
        SourceForm { title: title.into(), url: url.into(), source_type: ty, ..Default::default() }
    }

    fn message(err: ProviderError) -> String {
        match err {
            ProviderError::InvalidSource(m) => m,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_blank_title_and_url() {
        assert_eq!(message(form("  ", "http://a", SourceType::Image).validate().unwrap_err()), "Please enter a title");
        assert_eq!(message(form("T", " ", SourceType::Image).validate().unwrap_err()), "Please enter a URL");
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = form("T", "ftp://host/x.jpg", SourceType::Image).validate().unwrap_err();
        assert_eq!(message(err), "URL must start with http:// or https://");
    }

    #[test]
    fn video_without_playlist_extension_warns() {
        let w = form("T", "https://host/video.mp4", SourceType::Video).validate().unwrap();
        assert_eq!(w, vec![FormWarning::UnexpectedStreamExtension]);
        assert!(form("T", "https://host/live.m3u8", SourceType::Video).validate().unwrap().is_empty());
        assert!(form("T", "https://host/pic.jpg", SourceType::Image).validate().unwrap().is_empty());
    }

    #[test]
    fn record_gets_timestamp_id_and_defaults() {
        let (rec, _) = form(" Harbour ", " https://host/live.m3u8 ", SourceType::Video).into_record(1700000000123).unwrap();
        assert_eq!(rec.id, "custom_1700000000123");
        assert_eq!(rec.title, "Harbour");
        assert_eq!(rec.url, "https://host/live.m3u8");
        assert_eq!(rec.description.as_deref(), Some("Custom Source"));
        assert_eq!(rec.thumbnail.as_deref(), Some("https://host/live.m3u8"));
    }

    #[test]
    fn renders_numbered_list() {
        let records = vec![
            CustomSourceRecord::new("a", "Beach", "http://x/a.jpg", SourceType::Image),
            CustomSourceRecord::new("b", "Cam", "http://x/b.m3u8", SourceType::Video),
        ];
        assert_eq!(
            render_source_list(&records),
            "Custom Sources:\n\n1. Beach\n   Type: image\n   URL: http://x/a.jpg\n\n2. Cam\n   Type: video\n   URL: http://x/b.m3u8\n\n"
        );
        assert_eq!(render_source_list(&[]), "Custom Sources:\n\nNo custom sources added yet.");
    }
}
