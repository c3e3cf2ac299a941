use crate::storage::json_store::SETTINGS_FILE_NAME;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::path::Path;

const ENDPOINT_SUFFIX: &str = ".cognitiveservices.azure.com";

/// Connection settings for the planner service. Stored as a single
/// base64-encoded JSON blob; the encoding is obfuscation for casual
/// inspection, not protection for the key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub endpoint: String,
    pub deployment_name: String,
    pub key: String,
}

impl Settings {
    pub fn is_complete(&self) -> bool {
        !self.endpoint.is_empty() && !self.deployment_name.is_empty() && !self.key.is_empty()
    }
}

/// Appends the service-domain suffix when missing, then prepends the secure
/// scheme when missing, in that order.
pub fn normalize_endpoint(raw: &str) -> String {
    let mut endpoint = raw.trim().to_string();
    if !endpoint.ends_with(ENDPOINT_SUFFIX) {
        endpoint.push_str(ENDPOINT_SUFFIX);
    }
    if !endpoint.starts_with("https://") {
        endpoint = format!("https://{endpoint}");
    }
    endpoint
}

pub fn save(dir: &Path, settings: &Settings) -> bool {
    let normalized = Settings {
        endpoint: normalize_endpoint(&settings.endpoint),
        deployment_name: settings.deployment_name.trim().to_string(),
        key: settings.key.trim().to_string(),
    };

    let json = match serde_json::to_string(&normalized) {
        Ok(json) => json,
        Err(err) => {
            log::warn!("failed to encode settings: {err}");
            return false;
        }
    };
    let blob = STANDARD.encode(json);

    if let Err(err) = std::fs::create_dir_all(dir) {
        log::warn!("failed to create settings dir: {err}");
        return false;
    }
    let path = dir.join(SETTINGS_FILE_NAME);
    if let Err(err) = write_blob(&path, &blob) {
        log::warn!("failed to write settings: {err}");
        std::fs::remove_file(&path).ok();
        return false;
    }

    true
}

// The blob holds the key, so it is created 0600 and never left on disk
// with looser permissions.
#[cfg(unix)]
fn write_blob(path: &Path, blob: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(blob.as_bytes())?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn write_blob(path: &Path, blob: &str) -> std::io::Result<()> {
    std::fs::write(path, blob)
}

/// Missing or malformed data yields an empty record, never an error.
pub fn load(dir: &Path) -> Settings {
    let path = dir.join(SETTINGS_FILE_NAME);
    let blob = match std::fs::read_to_string(&path) {
        Ok(blob) => blob,
        Err(_) => return Settings::default(),
    };
    let json = match STANDARD.decode(blob.trim()) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::warn!("settings blob is not valid base64: {err}");
            return Settings::default();
        }
    };
    match serde_json::from_slice(&json) {
        Ok(settings) => settings,
        Err(err) => {
            log::warn!("settings blob is not valid JSON: {err}");
            Settings::default()
        }
    }
}

pub fn clear(dir: &Path) {
    std::fs::remove_file(dir.join(SETTINGS_FILE_NAME)).ok();
}
