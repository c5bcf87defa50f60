// Destination folder and file naming for finished downloads.
// - Picks the per-profile `@handle` folder without nesting it twice.
// - Never overwrites: colliding names get `_1`, `_2`, ... before the extension.
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{error::Result, validators::extract_handle};

/// Finds the profile handle for a download, in order of trust: URL, prior folder, tool metadata.
pub fn resolve_handle(
    url: &str,
    prior_path: Option<&Path>,
    uploader_id: Option<&str>,
) -> Option<String> {
    extract_handle(url)
        .or_else(|| {
            prior_path
                .and_then(Path::file_name)
                .and_then(|name| name.to_str())
                .filter(|name| name.starts_with('@'))
                .and_then(extract_handle)
        })
        .or_else(|| {
            uploader_id
                .map(|id| id.trim().trim_start_matches('@'))
                .filter(|id| !id.is_empty() && *id != "NA")
                .map(str::to_string)
        })
}

pub fn profile_folder_name(handle: &str) -> String {
    format!("@{}", handle.trim_start_matches('@'))
}

/// An explicit output folder already named after the handle is used as-is.
pub fn resolve_target_dir(
    base_dir: &Path,
    explicit_output: Option<&Path>,
    handle: Option<&str>,
    create_profile_folders: bool,
) -> PathBuf {
    let root = explicit_output.unwrap_or(base_dir);
    let Some(handle) = handle else {
        return root.to_path_buf();
    };

    let folder = profile_folder_name(handle);
    let already_handle_folder = explicit_output
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.eq_ignore_ascii_case(&folder));

    if already_handle_folder || !create_profile_folders {
        root.to_path_buf()
    } else {
        root.join(folder)
    }
}

pub fn unique_file_name(dir: &Path, file_name: &str) -> String {
    let candidate = Path::new(file_name);
    if !dir.join(candidate).exists() {
        return file_name.to_string();
    }

    let stem = candidate
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    let extension = candidate
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1;
    loop {
        let next = format!("{stem}_{counter}{extension}");
        if !dir.join(&next).exists() {
            return next;
        }
        counter += 1;
    }
}

/// Moves `source` into `target_dir` under a free name and returns the final path.
pub fn move_into(source: &Path, target_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(target_dir)?;

    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| io::Error::other(format!("not a file path: {}", source.display())))?;
    let target = target_dir.join(unique_file_name(target_dir, &file_name));

    if let Err(err) = fs::rename(source, &target) {
        log::debug!(
            "rename {} -> {} failed ({err}), copying instead",
            source.display(),
            target.display()
        );
        fs::copy(source, &target)?;
        fs::remove_file(source)?;
    }

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_prefers_url_then_folder_then_metadata() {
        assert_eq!(
            resolve_handle("https://www.tiktok.com/@from.url/video/1", None, Some("meta")),
            Some("from.url".to_string())
        );
        assert_eq!(
            resolve_handle(
                "https://vm.tiktok.com/abc",
                Some(Path::new("/x/@from_folder")),
                Some("meta")
            ),
            Some("from_folder".to_string())
        );
        assert_eq!(
            resolve_handle("https://vm.tiktok.com/abc", Some(Path::new("/x/plain")), Some("meta")),
            Some("meta".to_string())
        );
        assert_eq!(resolve_handle("https://vm.tiktok.com/abc", None, Some("NA")), None);
    }

    #[test]
    fn nests_profile_folder_once() {
        let base = Path::new("/downloads");
        assert_eq!(
            resolve_target_dir(base, None, Some("alice"), true),
            PathBuf::from("/downloads/@alice")
        );
        assert_eq!(
            resolve_target_dir(base, Some(Path::new("/picked/@Alice")), Some("alice"), true),
            PathBuf::from("/picked/@Alice")
        );
        assert_eq!(
            resolve_target_dir(base, Some(Path::new("/picked")), Some("alice"), true),
            PathBuf::from("/picked/@alice")
        );
    }

    #[test]
    fn flat_layout_when_profile_folders_off_or_handle_unknown() {
        let base = Path::new("/downloads");
        assert_eq!(
            resolve_target_dir(base, None, Some("alice"), false),
            PathBuf::from("/downloads")
        );
        assert_eq!(
            resolve_target_dir(base, None, None, true),
            PathBuf::from("/downloads")
        );
    }

    #[test]
    fn colliding_names_get_numbered() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(unique_file_name(dir.path(), "clip.mp4"), "clip.mp4");

        fs::write(dir.path().join("clip.mp4"), b"a").expect("write");
        assert_eq!(unique_file_name(dir.path(), "clip.mp4"), "clip_1.mp4");

        fs::write(dir.path().join("clip_1.mp4"), b"b").expect("write");
        assert_eq!(unique_file_name(dir.path(), "clip.mp4"), "clip_2.mp4");
    }

    #[test]
    fn move_into_never_overwrites() {
        let staging = tempfile::tempdir().expect("staging");
        let target = tempfile::tempdir().expect("target");
        fs::write(target.path().join("clip.mp4"), b"old").expect("write");
        let source = staging.path().join("clip.mp4");
        fs::write(&source, b"new").expect("write");

        let moved = move_into(&source, target.path()).expect("move");
        assert_eq!(moved, target.path().join("clip_1.mp4"));
        assert!(!source.exists());
        assert_eq!(fs::read(target.path().join("clip.mp4")).expect("read"), b"old");
    }
}
