use crate::model::song::SongDef;
use anyhow::{Result, anyhow};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

pub fn load_song_file<P: AsRef<Path>>(path: P) -> Result<SongDef> {
    let text = fs::read_to_string(path.as_ref()).map_err(|e| {
        anyhow!(
            "Failed to read song file {}: {}",
            path.as_ref().display(),
            e
        )
    })?;

    serde_yaml::from_str(&text)
        .map_err(|e| anyhow!("Failed to parse song file {}: {}", path.as_ref().display(), e))
}

/// Loads every `*.yaml`/`*.yml` song in `dir`, in file name order. Files that fail to
/// parse are skipped with a warning so one bad file cannot take the rest down.
pub fn load_song_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<SongDef>> {
    let entries = fs::read_dir(dir.as_ref()).map_err(|e| {
        anyhow!(
            "Failed to read song directory {}: {}",
            dir.as_ref().display(),
            e
        )
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        })
        .collect();
    paths.sort();

    let mut defs = Vec::with_capacity(paths.len());
    for path in paths.iter() {
        match load_song_file(path) {
            Ok(def) => {
                debug!("Read song '{}' from {}..!", def.display_name(), path.display());
                defs.push(def);
            }
            Err(why) => warn!("{}..!", why),
        }
    }

    Ok(defs)
}
