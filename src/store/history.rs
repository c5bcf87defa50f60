// Download history records.
// - history.json is a plain array, newest entry last.
// - Only the most recent entries are kept.
// - Records this build cannot parse are carried through rewrites untouched.
use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

pub const HISTORY_LIMIT: usize = 100;
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    #[serde(alias = "video")]
    Video,
    #[serde(rename = "MP3", alias = "mp3")]
    Mp3,
}

impl MediaKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::Mp3 => "MP3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadSource {
    Single,
    Profile,
    Batch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<DownloadSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default)]
    pub date: String,
}

impl HistoryEntry {
    pub fn new(title: String, url: String, kind: MediaKind, path: String) -> Self {
        Self {
            title,
            url,
            kind,
            path,
            source: None,
            profile: None,
            date: chrono::Local::now().format(DATE_FORMAT).to_string(),
        }
    }

    pub fn with_source(mut self, source: DownloadSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile;
        self
    }

    pub fn is_from_profile(&self) -> bool {
        self.source == Some(DownloadSource::Profile)
    }
}

pub(super) fn read_entries(path: &Path) -> Vec<HistoryEntry> {
    read_values(path)
        .into_iter()
        .filter_map(|value| parse_entry(&value))
        .collect()
}

pub(super) fn parse_entry(value: &Value) -> Option<HistoryEntry> {
    HistoryEntry::deserialize(value).ok()
}

pub(super) fn read_values(path: &Path) -> Vec<Value> {
    let Ok(text) = fs::read_to_string(path) else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<Value>>(&text) {
        Ok(values) => values,
        Err(err) => {
            log::warn!("history file {} is unreadable: {err}", path.display());
            Vec::new()
        }
    }
}

pub(super) fn write_values(path: &Path, values: &[Value]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let text = serde_json::to_string_pretty(values)?;
    fs::write(path, text)?;
    Ok(())
}

pub(super) fn cap_values(values: &mut Vec<Value>) {
    if values.len() > HISTORY_LIMIT {
        let overflow = values.len() - HISTORY_LIMIT;
        values.drain(0..overflow);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_original_field_names() {
        let entry = HistoryEntry::new(
            "clip".to_string(),
            "https://www.tiktok.com/@a/video/1".to_string(),
            MediaKind::Mp3,
            "/tmp/clip.mp3".to_string(),
        )
        .with_source(DownloadSource::Profile);

        let value = serde_json::to_value(&entry).expect("json");
        assert_eq!(value["type"], "MP3");
        assert_eq!(value["source"], "profile");
        assert!(value.get("profile").is_none());
        assert_eq!(value["date"].as_str().map(str::len), Some(19));
    }

    #[test]
    fn skips_entries_it_cannot_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.json");
        fs::write(
            &path,
            r#"[{"title":"a","url":"u","type":"Video","path":"p","date":"d"},{"nope":1}]"#,
        )
        .expect("write");

        let entries = read_entries(&path);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "a");
        assert_eq!(entries[0].source, None);
    }

    #[test]
    fn lowercase_kind_is_accepted() {
        let value = serde_json::json!({
            "title": "a", "url": "u", "type": "video", "path": "p", "date": "d"
        });
        assert_eq!(parse_entry(&value).map(|entry| entry.kind), Some(MediaKind::Video));

        let value = serde_json::json!({
            "title": "a", "url": "u", "type": "mp3", "path": "p"
        });
        assert_eq!(parse_entry(&value).map(|entry| entry.kind), Some(MediaKind::Mp3));
    }

    #[test]
    fn malformed_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.json");
        fs::write(&path, "{not json").expect("write");
        assert!(read_entries(&path).is_empty());
    }
}
