// TikTok URL classification and small input checks.
// - Ordered regex matching: canonical video path, canonical profile path, then short links.
// - Pure string work, no network access.
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, Result};

static VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(?:www\.|m\.)?tiktok\.com/@[\w.-]+/video/\d+").expect("video regex")
});

static PROFILE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(?:www\.|m\.)?tiktok\.com/@[\w.-]+/?(?:\?.*)?$")
        .expect("profile regex")
});

static SHORT_LINK_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(?:vm|vt)\.tiktok\.com/[\w-]+/?").expect("short link regex")
});

static HANDLE_PATH_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(?:www\.|m\.)?tiktok\.com/@[\w.-]+/").expect("handle path regex")
});

static HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([\w.-]+)").expect("handle regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    NotPlatform,
    /// Short links and other TikTok pages. yt-dlp resolves them at download time.
    Generic,
    Profile,
    Video,
}

impl UrlKind {
    pub fn is_platform(self) -> bool {
        self != Self::NotPlatform
    }
}

pub fn classify(url: &str) -> UrlKind {
    let url = url.trim();
    if url.is_empty() {
        return UrlKind::NotPlatform;
    }

    if VIDEO_URL.is_match(url) {
        UrlKind::Video
    } else if PROFILE_URL.is_match(url) {
        UrlKind::Profile
    } else if SHORT_LINK_URL.is_match(url) || HANDLE_PATH_URL.is_match(url) {
        UrlKind::Generic
    } else {
        UrlKind::NotPlatform
    }
}

pub fn is_valid_tiktok_url(url: &str) -> bool {
    classify(url).is_platform()
}

pub fn is_valid_profile_url(url: &str) -> bool {
    classify(url) == UrlKind::Profile
}

pub fn is_valid_video_url(url: &str) -> bool {
    matches!(classify(url), UrlKind::Video | UrlKind::Generic)
}

/// Returns the `@handle` owner of a URL or path segment, without the `@`.
pub fn extract_handle(value: &str) -> Option<String> {
    HANDLE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches('.').to_string())
        .filter(|handle| !handle.is_empty())
}

pub fn sanitize_filename(name: &str) -> String {
    let cleaned = name
        .chars()
        .filter(|ch| !ch.is_control() && !"<>:\"/\\|?*".contains(*ch))
        .collect::<String>();
    cleaned.trim().trim_end_matches('.').trim().to_string()
}

/// Parses a video-count limit. `0` means no limit.
pub fn validate_limit(text: &str, max: Option<u32>) -> Result<u32> {
    let invalid = |message: &str| AppError::InvalidSetting {
        key: "profile_video_limit".to_string(),
        message: message.to_string(),
    };

    let trimmed = text.trim();
    if trimmed.starts_with('-') {
        return Err(invalid("Limit cannot be negative"));
    }
    let limit = trimmed
        .parse::<u32>()
        .map_err(|_| invalid("Enter a whole number of videos (0 downloads all)."))?;
    if let Some(max) = max
        && limit > max
    {
        return Err(invalid(&format!("Limit cannot exceed {max}")));
    }
    Ok(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_video_url_is_video() {
        let url = "https://www.tiktok.com/@some.user/video/7234567890123456789";
        assert_eq!(classify(url), UrlKind::Video);
        assert!(is_valid_video_url(url));
        assert!(is_valid_tiktok_url(url));
        assert!(!is_valid_profile_url(url));
    }

    #[test]
    fn profile_url_is_not_video() {
        for url in [
            "https://www.tiktok.com/@some_user",
            "https://tiktok.com/@some_user/",
            "https://m.tiktok.com/@some_user?lang=en",
        ] {
            assert!(is_valid_profile_url(url), "{url}");
            assert!(!is_valid_video_url(url), "{url}");
            assert!(is_valid_tiktok_url(url), "{url}");
        }
    }

    #[test]
    fn short_links_are_generic() {
        assert_eq!(classify("https://vm.tiktok.com/ZMabc123/"), UrlKind::Generic);
        assert_eq!(classify("https://vt.tiktok.com/ZSxyz/"), UrlKind::Generic);
        assert!(is_valid_video_url("https://vm.tiktok.com/ZMabc123/"));
        assert!(!is_valid_profile_url("https://vm.tiktok.com/ZMabc123/"));
    }

    #[test]
    fn scheme_and_host_match_in_any_case() {
        assert_eq!(classify("https://WWW.TIKTOK.COM/@a/video/1"), UrlKind::Video);
        assert_eq!(classify("https://www.TikTok.com/@a/video/1"), UrlKind::Video);
        assert_eq!(classify("HTTPS://www.tiktok.com/@a"), UrlKind::Profile);
        assert_eq!(classify("https://VM.TIKTOK.COM/ZMabc/"), UrlKind::Generic);
    }

    #[test]
    fn other_hosts_are_rejected() {
        assert_eq!(classify(""), UrlKind::NotPlatform);
        assert_eq!(classify("not a url"), UrlKind::NotPlatform);
        assert_eq!(
            classify("https://www.youtube.com/@someone"),
            UrlKind::NotPlatform
        );
        assert_eq!(
            classify("https://tiktok.com.evil.example/@x"),
            UrlKind::NotPlatform
        );
    }

    #[test]
    fn extracts_handle_from_urls_and_folders() {
        assert_eq!(
            extract_handle("https://www.tiktok.com/@dance.crew/video/1").as_deref(),
            Some("dance.crew")
        );
        assert_eq!(extract_handle("/home/me/@dance.crew").as_deref(), Some("dance.crew"));
        assert_eq!(extract_handle("https://vm.tiktok.com/abc"), None);
    }

    #[test]
    fn sanitize_removes_reserved_characters() {
        assert_eq!(sanitize_filename("  a<b>:c\"d|e?f*g. "), "abcdefg");
        assert_eq!(sanitize_filename("dir/name"), "dirname");
    }

    #[test]
    fn limit_validation() {
        assert_eq!(validate_limit("0", None).expect("zero"), 0);
        assert_eq!(validate_limit(" 25 ", Some(100)).expect("25"), 25);
        assert!(validate_limit("-1", None).is_err());
        assert!(validate_limit("ten", None).is_err());
        assert!(validate_limit("500", Some(100)).is_err());
    }
}
