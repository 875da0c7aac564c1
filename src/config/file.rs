//! YAML settings directory loading
//!
//! Every `*.yaml` / `*.yml` file in the settings directory is parsed on its
//! own, then the documents are deep-merged in file-name order so later files
//! override keys from earlier ones. Splitting secrets (e.g. Slack tokens)
//! into their own file is the intended use.

use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::{Error, Result};

/// List the settings files in `dir`, sorted by file name
///
/// # Errors
///
/// Returns [`Error::Config`] if the directory cannot be read
pub fn settings_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        Error::Config(format!("cannot read settings directory {}: {e}", dir.display()))
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_yaml(path))
        .collect();
    files.sort();

    Ok(files)
}

/// Parse and merge every settings file in `dir` into one YAML document
///
/// # Errors
///
/// Returns [`Error::Config`] naming the first file that cannot be read or parsed
pub fn load_settings_dir(dir: &Path) -> Result<Value> {
    let mut merged = Value::Mapping(serde_yaml::Mapping::new());

    for path in settings_files(dir)? {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;

        let document: Value = serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid settings file {}: {e}", path.display())))?;

        if document.is_null() {
            tracing::debug!(path = %path.display(), "empty settings file skipped");
            continue;
        }

        tracing::debug!(path = %path.display(), "loaded settings file");
        merge(&mut merged, document);
    }

    Ok(merged)
}

/// Deep-merge `overlay` into `base`; mappings merge key by key, anything else is replaced
pub fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}
