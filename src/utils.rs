use dirs::data_dir;
use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
};

const APP_DIR: &str = "event-search";

static DATA_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    if let Ok(dir) = std::env::var("EVENT_SEARCH_HOME") {
        return PathBuf::from(dir);
    }
    let base = data_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    base.join(APP_DIR)
});

pub fn data_root() -> PathBuf {
    DATA_ROOT.clone()
}

pub fn database_path() -> PathBuf {
    data_root().join("event-search.sqlite")
}

pub fn config_path() -> PathBuf {
    data_root().join("config.json")
}

pub fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if parent.as_os_str().is_empty() {
            return;
        }
        if let Err(err) = fs::create_dir_all(parent) {
            log::warn!("failed to create parent {:?}: {err}", parent);
        }
    }
}
