// Shared UI model types used by state, key handling, and rendering.
// - Tabs, pane focus, settings form fields, and history filters.
use crate::store::{HistoryEntry, MediaKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Main,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Download,
    History,
    Settings,
}

impl Tab {
    pub const ALL: [Self; 3] = [Self::Download, Self::History, Self::Settings];

    pub fn next(self) -> Self {
        match self {
            Self::Download => Self::History,
            Self::History => Self::Settings,
            Self::Settings => Self::Download,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Self::Download => Self::Settings,
            Self::History => Self::Download,
            Self::Settings => Self::History,
        }
    }

    pub fn number(self) -> usize {
        match self {
            Self::Download => 1,
            Self::History => 2,
            Self::Settings => 3,
        }
    }

    /// Translation key for the tab title.
    pub fn label_key(self) -> &'static str {
        match self {
            Self::Download => "tab_download",
            Self::History => "tab_history",
            Self::Settings => "tab_settings",
        }
    }

    pub fn from_number(number: usize) -> Option<Self> {
        match number {
            1 => Some(Self::Download),
            2 => Some(Self::History),
            3 => Some(Self::Settings),
            _ => None,
        }
    }
}

/// Text fields of the download form. Only the URL is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadField {
    Url,
    OutputDir,
    FileName,
}

impl DownloadField {
    pub fn next(self) -> Self {
        match self {
            Self::Url => Self::OutputDir,
            Self::OutputDir => Self::FileName,
            Self::FileName => Self::Url,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Self::Url => Self::FileName,
            Self::OutputDir => Self::Url,
            Self::FileName => Self::OutputDir,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    DownloadPath,
    Language,
    Theme,
    VideoQuality,
    ProfileLimit,
    ConvertMp3,
    ProfileFolders,
    SaveHistory,
    AutoUpdate,
    YtDlpPath,
    FfmpegPath,
    TransferPath,
}

impl SettingsField {
    pub const ALL: [Self; 12] = [
        Self::DownloadPath,
        Self::Language,
        Self::Theme,
        Self::VideoQuality,
        Self::ProfileLimit,
        Self::ConvertMp3,
        Self::ProfileFolders,
        Self::SaveHistory,
        Self::AutoUpdate,
        Self::YtDlpPath,
        Self::FfmpegPath,
        Self::TransferPath,
    ];

    pub fn next(self) -> Self {
        let index = self.index();
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        let index = self.index();
        Self::ALL[(index + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0)
    }

    pub fn is_text(self) -> bool {
        matches!(
            self,
            Self::DownloadPath
                | Self::ProfileLimit
                | Self::YtDlpPath
                | Self::FfmpegPath
                | Self::TransferPath
        )
    }

    pub fn is_toggle(self) -> bool {
        matches!(
            self,
            Self::ConvertMp3 | Self::ProfileFolders | Self::SaveHistory | Self::AutoUpdate
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryFilter {
    #[default]
    All,
    Video,
    Mp3,
    Profile,
}

impl HistoryFilter {
    pub const ALL: [Self; 4] = [Self::All, Self::Video, Self::Mp3, Self::Profile];

    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Video,
            Self::Video => Self::Mp3,
            Self::Mp3 => Self::Profile,
            Self::Profile => Self::All,
        }
    }

    pub fn label_key(self) -> &'static str {
        match self {
            Self::All => "filter_all",
            Self::Video => "filter_video",
            Self::Mp3 => "filter_mp3",
            Self::Profile => "filter_profile",
        }
    }

    pub fn matches(self, entry: &HistoryEntry) -> bool {
        match self {
            Self::All => true,
            Self::Video => entry.kind == MediaKind::Video && !entry.is_from_profile(),
            Self::Mp3 => entry.kind == MediaKind::Mp3 && !entry.is_from_profile(),
            Self::Profile => entry.is_from_profile(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DownloadSource;

    #[test]
    fn tab_numbers_round_trip() {
        for tab in Tab::ALL {
            assert_eq!(Tab::from_number(tab.number()), Some(tab));
        }
        assert_eq!(Tab::from_number(4), None);
        assert_eq!(Tab::Settings.next(), Tab::Download);
        assert_eq!(Tab::Download.previous(), Tab::Settings);
    }

    #[test]
    fn download_fields_cycle_both_ways() {
        assert_eq!(DownloadField::Url.next(), DownloadField::OutputDir);
        assert_eq!(DownloadField::FileName.next(), DownloadField::Url);
        assert_eq!(DownloadField::Url.previous(), DownloadField::FileName);
    }

    #[test]
    fn settings_fields_wrap() {
        assert_eq!(SettingsField::TransferPath.next(), SettingsField::DownloadPath);
        assert_eq!(SettingsField::DownloadPath.previous(), SettingsField::TransferPath);
        assert!(SettingsField::ProfileLimit.is_text());
        assert!(SettingsField::SaveHistory.is_toggle());
        assert!(!SettingsField::Language.is_text());
    }

    #[test]
    fn history_filters_select_by_kind_and_origin() {
        let video = HistoryEntry::new(
            "a".to_string(),
            "https://www.tiktok.com/@a/video/1".to_string(),
            MediaKind::Video,
            "/d/a.mp4".to_string(),
        );
        let from_profile = video
            .clone()
            .with_source(DownloadSource::Profile)
            .with_profile(Some("a".to_string()));
        let audio = HistoryEntry::new(
            "b".to_string(),
            "https://www.tiktok.com/@b/video/2".to_string(),
            MediaKind::Mp3,
            "/d/b.mp3".to_string(),
        );

        assert!(HistoryFilter::Video.matches(&video));
        assert!(!HistoryFilter::Video.matches(&audio));
        assert!(HistoryFilter::Mp3.matches(&audio));
        assert!(HistoryFilter::Profile.matches(&from_profile));
        assert!(!HistoryFilter::Profile.matches(&video));
        assert!(!HistoryFilter::Video.matches(&from_profile));
        assert!(!HistoryFilter::Mp3.matches(&from_profile));
        assert!(HistoryFilter::All.matches(&from_profile));
        assert!(HistoryFilter::All.matches(&audio));
    }
}
