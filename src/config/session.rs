use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::error::{SceneError, SceneResult};
use crate::scene::model::SceneAssets;

/// Settings a [`crate::SceneController`] is created with.
///
/// JSON-facing; every field has a default so an empty object is a valid config.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Icon and background images used by every scene.
    pub assets: SceneAssets,
    /// Mute the microphone as soon as it is first added to the mixer.
    pub start_muted: bool,
}

impl SessionConfig {
    /// Parse a session config from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> SceneResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| SceneError::config(format!("parse session config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a session config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            SceneError::config(format!("open session config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Reject empty asset paths.
    pub fn validate(&self) -> SceneResult<()> {
        let assets = &self.assets;
        if assets.camera_off.as_os_str().is_empty() {
            return Err(SceneError::config("assets.camera_off must not be empty"));
        }
        if assets.background.as_os_str().is_empty() {
            return Err(SceneError::config("assets.background must not be empty"));
        }
        if assets
            .mute_icon
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            return Err(SceneError::config(
                "assets.mute_icon must not be empty (omit it to disable the mute icon)",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/session.rs"]
mod tests;
