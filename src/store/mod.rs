// Settings and history persistence.
// - settings.json is a flat object merged over defaults; unknown keys survive a save.
// - One cached copy per settings file per process, refreshed when the file's mtime moves.
// - history.json is rewritten whole under an in-process lock, as raw JSON values.
mod history;
mod settings;

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
    time::SystemTime,
};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{
    error::{AppError, Result},
    paths::AppPaths,
};

pub use self::history::{DownloadSource, HistoryEntry, MediaKind};
pub use self::settings::{QualityTier, Settings};

pub struct Store {
    paths: AppPaths,
    state: Mutex<SettingsState>,
    history_lock: Mutex<()>,
}

struct SettingsState {
    values: Map<String, Value>,
    mtime: Option<SystemTime>,
}

static SHARED_STORES: OnceLock<Mutex<HashMap<PathBuf, Arc<Store>>>> = OnceLock::new();

impl Store {
    /// Returns the process-wide store for these paths, loading it on first use
    /// and re-reading the file for later callers.
    pub fn shared(paths: &AppPaths) -> Arc<Self> {
        let stores = SHARED_STORES.get_or_init(|| Mutex::new(HashMap::new()));
        let mut stores = stores.lock().unwrap_or_else(PoisonError::into_inner);
        let mut opened = false;
        let store = stores.entry(paths.settings_path()).or_insert_with(|| {
            opened = true;
            Arc::new(Self::open(paths.clone()))
        });
        if !opened {
            store.reload();
        }
        Arc::clone(store)
    }

    pub fn open(paths: AppPaths) -> Self {
        let store = Self {
            paths,
            state: Mutex::new(SettingsState {
                values: Map::new(),
                mtime: None,
            }),
            history_lock: Mutex::new(()),
        };
        store.load_or_init();
        store
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.reload_if_changed();
        let state = self.lock_state();
        state
            .values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or(default)
    }

    pub fn set(&self, key: &str, value: impl Serialize) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let mut state = self.lock_state();
        state.values.insert(key.to_string(), value);
        self.save_locked(&mut state)
    }

    pub fn update(&self, values: Map<String, Value>) -> Result<()> {
        let mut state = self.lock_state();
        state.values.extend(values);
        self.save_locked(&mut state)
    }

    pub fn settings(&self) -> Settings {
        self.reload_if_changed();
        Settings::from_map(&self.lock_state().values)
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.update(settings.to_map())
    }

    pub fn reset(&self) -> Result<()> {
        let mut state = self.lock_state();
        state.values = Settings::default().to_map();
        self.save_locked(&mut state)
    }

    /// Re-reads settings.json unconditionally.
    pub fn reload(&self) {
        let mut state = self.lock_state();
        self.read_into(&mut state);
    }

    /// Re-reads settings.json when another writer has touched it. Returns true on refresh.
    pub fn reload_if_changed(&self) -> bool {
        let latest = file_mtime(&self.paths.settings_path());
        let mut state = self.lock_state();
        let changed = match (latest, state.mtime) {
            (Some(latest), Some(cached)) => latest > cached,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if changed {
            log::debug!("settings file changed on disk, reloading");
            self.read_into(&mut state);
        }
        changed
    }

    pub fn export_settings(&self, target: &Path) -> Result<()> {
        let state = self.lock_state();
        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(target, serde_json::to_string_pretty(&state.values)?)?;
        Ok(())
    }

    pub fn import_settings(&self, source: &Path) -> Result<()> {
        let text = fs::read_to_string(source)?;
        let Value::Object(values) = serde_json::from_str::<Value>(&text)? else {
            return Err(AppError::InvalidSetting {
                key: source.display().to_string(),
                message: "settings file root must be a JSON object".to_string(),
            });
        };
        self.update(values)
    }

    pub fn get_history(&self) -> Vec<HistoryEntry> {
        let _guard = self.lock_history();
        history::read_entries(&self.paths.history_path())
    }

    /// Appends one entry unless history is disabled. Returns whether anything was written.
    pub fn append_history(&self, entry: HistoryEntry) -> Result<bool> {
        if !self.get("save_history", true) {
            return Ok(false);
        }

        let value = serde_json::to_value(&entry)?;
        let _guard = self.lock_history();
        let path = self.paths.history_path();
        let mut values = history::read_values(&path);
        values.push(value);
        history::cap_values(&mut values);
        history::write_values(&path, &values)?;
        Ok(true)
    }

    pub fn delete_history_entry(&self, entry: &HistoryEntry) -> Result<bool> {
        let _guard = self.lock_history();
        let path = self.paths.history_path();
        let mut values = history::read_values(&path);
        let Some(index) = values
            .iter()
            .position(|value| history::parse_entry(value).as_ref() == Some(entry))
        else {
            return Ok(false);
        };
        values.remove(index);
        history::write_values(&path, &values)?;
        Ok(true)
    }

    pub fn clear_history(&self) -> Result<()> {
        let _guard = self.lock_history();
        history::write_values(&self.paths.history_path(), &[])
    }

    fn load_or_init(&self) {
        let mut state = self.lock_state();
        let path = self.paths.settings_path();
        let loaded = read_settings_file(&path);
        let should_persist = loaded.is_none();

        let mut values = Settings::default().to_map();
        if let Some(loaded) = loaded {
            values.extend(loaded);
        }
        state.values = values;
        state.mtime = file_mtime(&path);

        if should_persist && let Err(err) = self.save_locked(&mut state) {
            log::warn!("cannot write default settings to {}: {err}", path.display());
        }
    }

    fn read_into(&self, state: &mut SettingsState) {
        let path = self.paths.settings_path();
        if let Some(loaded) = read_settings_file(&path) {
            let mut values = Settings::default().to_map();
            values.extend(loaded);
            state.values = values;
        }
        state.mtime = file_mtime(&path);
    }

    fn save_locked(&self, state: &mut SettingsState) -> Result<()> {
        let path = self.paths.settings_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, serde_json::to_string_pretty(&state.values)?)?;
        state.mtime = file_mtime(&path);
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, SettingsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_history(&self) -> MutexGuard<'_, ()> {
        self.history_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_settings_file(path: &Path) -> Option<Map<String, Value>> {
    let text = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(values)) => Some(values),
        Ok(_) => {
            log::warn!("settings file {} is not an object, using defaults", path.display());
            None
        }
        Err(err) => {
            log::warn!("settings file {} is malformed ({err}), using defaults", path.display());
            None
        }
    }
}

fn file_mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::history::HISTORY_LIMIT;
    use serde_json::json;

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(AppPaths::new(dir.path().to_path_buf()));
        (dir, store)
    }

    fn entry(title: &str) -> HistoryEntry {
        HistoryEntry::new(
            title.to_string(),
            format!("https://www.tiktok.com/@a/video/{title}"),
            MediaKind::Video,
            format!("/tmp/{title}.mp4"),
        )
    }

    #[test]
    fn first_open_writes_defaults() {
        let (dir, store) = temp_store();
        assert!(dir.path().join("settings.json").exists());
        assert_eq!(store.get("profile_video_limit", 0_u32), 10);
        assert_eq!(store.settings().video_quality, QualityTier::Best);
    }

    #[test]
    fn malformed_settings_fall_back_and_are_rewritten() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, "[1, 2").expect("write");

        let store = Store::open(AppPaths::new(dir.path().to_path_buf()));
        assert_eq!(store.settings().theme, "light");

        let text = fs::read_to_string(&path).expect("read");
        let value: Value = serde_json::from_str(&text).expect("rewritten json");
        assert_eq!(value["language"], "en");
    }

    #[test]
    fn unknown_keys_survive_saves() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("settings.json"),
            r#"{"window_size": [800, 600], "theme": "dark"}"#,
        )
        .expect("write");

        let store = Store::open(AppPaths::new(dir.path().to_path_buf()));
        store.set("language", "km").expect("set");

        store.reload();
        assert_eq!(store.get("window_size", json!(null)), json!([800, 600]));
        assert_eq!(store.settings().theme, "dark");
        assert_eq!(store.settings().language, "km");
    }

    #[test]
    fn reload_picks_up_external_writes() {
        let (dir, store) = temp_store();
        let other = Store::open(AppPaths::new(dir.path().to_path_buf()));
        other.set("convert_to_mp3", true).expect("set");

        store.reload();
        assert!(store.settings().convert_to_mp3);
    }

    #[test]
    fn reset_restores_defaults() {
        let (_dir, store) = temp_store();
        store.set("profile_video_limit", 3).expect("set");
        store.reset().expect("reset");
        assert_eq!(store.settings().profile_video_limit, 10);
    }

    #[test]
    fn import_rejects_non_object() {
        let (dir, store) = temp_store();
        let source = dir.path().join("import.json");
        fs::write(&source, "[]").expect("write");
        assert!(store.import_settings(&source).is_err());

        fs::write(&source, r#"{"theme": "dark"}"#).expect("write");
        store.import_settings(&source).expect("import");
        assert_eq!(store.settings().theme, "dark");
    }

    #[test]
    fn history_keeps_latest_hundred() {
        let (_dir, store) = temp_store();
        for index in 0..(HISTORY_LIMIT + 1) {
            store
                .append_history(entry(&index.to_string()))
                .expect("append");
        }

        let history = store.get_history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].title, "1");
        assert_eq!(history[HISTORY_LIMIT - 1].title, HISTORY_LIMIT.to_string());
    }

    #[test]
    fn append_and_delete_keep_records_written_by_other_tools() {
        let (dir, store) = temp_store();
        let path = dir.path().join("history.json");
        fs::write(
            &path,
            r#"[{"url":"https://www.tiktok.com/@a/video/9","date":"2024-01-01 10:00:00","status":"ok","quality":"best"},
                {"title":"old","url":"u","type":"video","path":"p","date":"d","extra":1}]"#,
        )
        .expect("write");

        let added = entry("new");
        store.append_history(added.clone()).expect("append");
        let raw: Vec<Value> =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(raw.len(), 3);
        assert_eq!(raw[0]["status"], "ok");
        assert_eq!(raw[1]["extra"], 1);
        assert_eq!(store.get_history().len(), 2);

        assert!(store.delete_history_entry(&added).expect("delete"));
        let raw: Vec<Value> =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0]["quality"], "best");
    }

    #[test]
    fn history_disabled_writes_nothing() {
        let (dir, store) = temp_store();
        store.set("save_history", false).expect("set");
        assert!(!store.append_history(entry("a")).expect("append"));
        assert!(!dir.path().join("history.json").exists());
    }

    #[test]
    fn delete_and_clear_history() {
        let (_dir, store) = temp_store();
        let first = entry("a");
        store.append_history(first.clone()).expect("append");
        store.append_history(entry("b")).expect("append");

        assert!(store.delete_history_entry(&first).expect("delete"));
        assert!(!store.delete_history_entry(&first).expect("delete again"));
        assert_eq!(store.get_history().len(), 1);

        store.clear_history().expect("clear");
        assert!(store.get_history().is_empty());
    }

    #[test]
    fn shared_store_is_reused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = AppPaths::new(dir.path().to_path_buf());
        let first = Store::shared(&paths);
        let other = Store::open(paths.clone());
        other.set("theme", "dark").expect("set");

        let second = Store::shared(&paths);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.settings().theme, "dark");
    }
}
