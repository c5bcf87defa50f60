// Filesystem locations owned by the app.
// - Everything persistent lives under one data directory (settings, history, log).
// - Each download gets its own staging folder so concurrent runs never share files.
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub base_dir: PathBuf,
}

impl AppPaths {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Platform data directory, falling back to the working directory when the
    /// platform has no notion of one.
    pub fn platform_default() -> Self {
        let base_dir = dirs::data_dir()
            .map(|dir| dir.join("ttdl"))
            .unwrap_or_else(|| PathBuf::from(".ttdl"));
        Self::new(base_dir)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.base_dir.join("settings.json")
    }

    pub fn history_path(&self) -> PathBuf {
        self.base_dir.join("history.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.base_dir.join("app.log")
    }

    pub fn staging_root(&self) -> PathBuf {
        self.base_dir.join("staging")
    }

    pub fn staging_dir(&self, job_id: &str) -> PathBuf {
        self.staging_root().join(job_id)
    }
}

pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ttdl")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_under_base_dir() {
        let paths = AppPaths::new(PathBuf::from("/tmp/ttdl-test"));
        assert_eq!(
            paths.settings_path(),
            PathBuf::from("/tmp/ttdl-test/settings.json")
        );
        assert_eq!(
            paths.history_path(),
            PathBuf::from("/tmp/ttdl-test/history.json")
        );
        assert_eq!(
            paths.staging_dir("abc"),
            PathBuf::from("/tmp/ttdl-test/staging/abc")
        );
    }
}
