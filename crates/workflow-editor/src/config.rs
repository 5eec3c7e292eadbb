//! Editor configuration storage
//!
//! Settings that shape how the canvas talks to the host: the drag payload
//! MIME type, how identifiers are minted, whether the canvas follows
//! external workflow updates, and how much undo history to keep.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

/// File name used by `load`/`save`
pub const CONFIG_FILE_NAME: &str = "editor.json";

/// MIME type the palette uses for its drag payload
pub const DEFAULT_DRAG_MIME_TYPE: &str = "application/reactflow";

/// How new node and edge identifiers are minted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Random v4 UUID suffix (`timer-3f2a...`)
    #[default]
    Uuid,
    /// Counter scoped to the mounted workflow (`timer-1`, `edge-2`)
    Sequential,
}

/// Whether the canvas follows workflow replacements after mount
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Re-project the canvas whenever the workflow is replaced externally
    #[default]
    Controlled,
    /// Project once at mount; later replacements need an explicit remount
    Uncontrolled,
}

fn default_drag_mime_type() -> String {
    DEFAULT_DRAG_MIME_TYPE.to_string()
}

fn default_undo_depth() -> usize {
    100
}

/// Full editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// MIME type carrying the node type during palette drags
    #[serde(default = "default_drag_mime_type")]
    pub drag_mime_type: String,
    #[serde(default)]
    pub id_strategy: IdStrategy,
    #[serde(default)]
    pub sync_mode: SyncMode,
    /// Maximum number of undo snapshots
    #[serde(default = "default_undo_depth")]
    pub undo_depth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            drag_mime_type: default_drag_mime_type(),
            id_strategy: IdStrategy::default(),
            sync_mode: SyncMode::default(),
            undo_depth: default_undo_depth(),
        }
    }
}

impl EditorConfig {
    /// Load configuration from `dir`, falling back to defaults when absent
    pub async fn load(dir: &Path) -> Result<Self, ConfigError> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if !fs::try_exists(&config_path).await? {
            log::debug!("No editor config at {:?}, using defaults", config_path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path).await?;

        serde_json::from_str(&contents).map_err(ConfigError::Parse)
    }

    /// Save configuration to `dir`
    pub async fn save(&self, dir: &Path) -> Result<(), ConfigError> {
        fs::create_dir_all(dir).await?;

        let config_path = dir.join(CONFIG_FILE_NAME);
        let contents = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        fs::write(&config_path, contents).await?;

        log::info!("Editor configuration saved to {:?}", config_path);
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(serde_json::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(serde_json::Error),
}
