// ── Local resource state ──
//
// One JSON file per instance under `{data_dir}/state/`. The CLI keeps the
// resource identifier here between invocations. Writes go through a temp
// file in the same directory and are renamed into place.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use amqpfw_core::FirewallResource;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::ConfigError;

/// Default state directory.
pub fn state_dir() -> PathBuf {
    crate::data_dir().join("state")
}

pub fn state_path(dir: &Path, instance_id: i64) -> PathBuf {
    dir.join(format!("{instance_id}.json"))
}

/// Load the stored resource for `instance_id`, if any.
pub fn load_state(dir: &Path, instance_id: i64) -> Result<Option<FirewallResource>, ConfigError> {
    let path = state_path(dir, instance_id);
    match std::fs::read_to_string(&path) {
        Ok(text) => parse(&path, &text).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Atomically write `resource`, keyed by its instance id.
pub fn save_state(dir: &Path, resource: &FirewallResource) -> Result<PathBuf, ConfigError> {
    std::fs::create_dir_all(dir)?;
    let path = state_path(dir, resource.instance_id);

    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, resource).map_err(|source| ConfigError::State {
        path: path.clone(),
        source,
    })?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(&path).map_err(|e| e.error)?;

    debug!(path = %path.display(), "state saved");
    Ok(path)
}

/// Remove the state file. Returns `false` if there was none.
pub fn remove_state(dir: &Path, instance_id: i64) -> Result<bool, ConfigError> {
    match std::fs::remove_file(state_path(dir, instance_id)) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Every stored resource, ordered by instance id.
pub fn list_states(dir: &Path) -> Result<Vec<FirewallResource>, ConfigError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut resources = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let text = std::fs::read_to_string(&path)?;
        resources.push(parse(&path, &text)?);
    }
    resources.sort_by_key(|r| r.instance_id);
    Ok(resources)
}

fn parse(path: &Path, text: &str) -> Result<FirewallResource, ConfigError> {
    serde_json::from_str(text).map_err(|source| ConfigError::State {
        path: path.to_path_buf(),
        source,
    })
}
