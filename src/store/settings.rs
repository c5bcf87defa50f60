// Typed view over settings.json.
// - Defaults double as the merge base for files written by older versions.
// - Quality tiers map to yt-dlp format selectors.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::paths::default_download_dir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Best,
    High,
    Medium,
    Low,
}

impl QualityTier {
    pub const ALL: [Self; 4] = [Self::Best, Self::High, Self::Medium, Self::Low];

    pub fn format_selector(self) -> &'static str {
        match self {
            Self::Best => "best",
            Self::High => "bestvideo[height<=1080]+bestaudio/best[height<=1080]",
            Self::Medium => "bestvideo[height<=720]+bestaudio/best[height<=720]",
            Self::Low => "bestvideo[height<=480]+bestaudio/best[height<=480]",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Best => "best",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|tier| *tier == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        let index = Self::ALL.iter().position(|tier| *tier == self).unwrap_or(0);
        Self::ALL[(index + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub language: String,
    pub download_path: PathBuf,
    pub auto_update_ytdlp: bool,
    pub video_quality: QualityTier,
    pub save_history: bool,
    pub theme: String,
    pub profile_video_limit: u32,
    pub convert_to_mp3: bool,
    pub create_profile_folders: bool,
    pub ytdlp_path: String,
    pub ffmpeg_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            download_path: default_download_dir(),
            auto_update_ytdlp: true,
            video_quality: QualityTier::Best,
            save_history: true,
            theme: "light".to_string(),
            profile_video_limit: 10,
            convert_to_mp3: false,
            create_profile_folders: true,
            ytdlp_path: "yt-dlp".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }
}

impl Settings {
    /// Profile cap as yt-dlp understands it: `None` downloads everything.
    pub fn profile_limit(&self) -> Option<usize> {
        (self.profile_video_limit > 0).then_some(self.profile_video_limit as usize)
    }

    pub(super) fn from_map(values: &Map<String, Value>) -> Self {
        let mut settings = Self::default();
        for (key, value) in values {
            if let Err(err) = settings.apply(key, value.clone()) {
                log::warn!("ignoring settings value for {key}: {err}");
            }
        }
        settings
    }

    // Field-by-field so one bad value does not discard the rest of the file.
    fn apply(&mut self, key: &str, value: Value) -> serde_json::Result<()> {
        match key {
            "language" => self.language = serde_json::from_value(value)?,
            "download_path" => self.download_path = serde_json::from_value(value)?,
            "auto_update_ytdlp" => self.auto_update_ytdlp = serde_json::from_value(value)?,
            "video_quality" => self.video_quality = serde_json::from_value(value)?,
            "save_history" => self.save_history = serde_json::from_value(value)?,
            "theme" => self.theme = serde_json::from_value(value)?,
            "profile_video_limit" => self.profile_video_limit = serde_json::from_value(value)?,
            "convert_to_mp3" => self.convert_to_mp3 = serde_json::from_value(value)?,
            "create_profile_folders" => {
                self.create_profile_folders = serde_json::from_value(value)?
            }
            "ytdlp_path" => self.ytdlp_path = serde_json::from_value(value)?,
            "ffmpeg_path" => self.ffmpeg_path = serde_json::from_value(value)?,
            _ => {}
        }
        Ok(())
    }

    pub(super) fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quality_selectors_cap_height() {
        assert_eq!(QualityTier::Best.format_selector(), "best");
        assert!(QualityTier::High.format_selector().contains("height<=1080"));
        assert!(QualityTier::Medium.format_selector().contains("height<=720"));
        assert!(QualityTier::Low.format_selector().contains("height<=480"));
    }

    #[test]
    fn quality_cycles_both_ways() {
        assert_eq!(QualityTier::Low.next(), QualityTier::Best);
        assert_eq!(QualityTier::Best.previous(), QualityTier::Low);
    }

    #[test]
    fn bad_values_keep_defaults_for_that_key_only() {
        let mut map = Map::new();
        map.insert("profile_video_limit".to_string(), json!("lots"));
        map.insert("theme".to_string(), json!("dark"));
        map.insert("video_quality".to_string(), json!("medium"));

        let settings = Settings::from_map(&map);
        assert_eq!(settings.profile_video_limit, 10);
        assert_eq!(settings.theme, "dark");
        assert_eq!(settings.video_quality, QualityTier::Medium);
    }

    #[test]
    fn zero_limit_means_unbounded() {
        let settings = Settings {
            profile_video_limit: 0,
            ..Settings::default()
        };
        assert_eq!(settings.profile_limit(), None);
    }
}
