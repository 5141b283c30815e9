//! Indicator configuration.
//!
//! Stored as TOML. Every field is optional; missing fields take the
//! defaults below.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use remote_indicator_menu::{MenuLabels, PresenterOptions};

/// Default maximum number of characters of a host label.
pub const DEFAULT_MAX_LABEL_LENGTH: usize = 40;

/// Errors loading or saving the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// User-visible strings of the indicator. `{0}` is replaced by the host
/// label (or, for the virtual workspace note, the command link target).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorLabels {
    pub opening: String,
    pub reconnecting: String,
    pub disconnected: String,
    pub editing_on: String,
    pub open_remote_window: String,
    pub virtual_workspace_note: String,
}

impl Default for IndicatorLabels {
    fn default() -> Self {
        Self {
            opening: "Opening Remote...".into(),
            reconnecting: "Reconnecting to {0}...".into(),
            disconnected: "Disconnected from {0}".into(),
            editing_on: "Editing on {0}".into(),
            open_remote_window: "Open a Remote Window".into(),
            virtual_workspace_note: "Some [features are not available]({0}) for resources \
                                     located on a virtual file system."
                .into(),
        }
    }
}

/// Configuration of the remote indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    /// Host labels longer than this are truncated with an ellipsis.
    #[serde(default = "default_max_label_length")]
    pub max_label_length: usize,

    /// Running as a pure web embedding; the remote host status is not shown.
    #[serde(default)]
    pub web_embedding: bool,

    /// Running purely in a browser.
    #[serde(default)]
    pub browser_only: bool,

    #[serde(default = "default_true")]
    pub close_enabled: bool,

    /// Extension gallery reachable, so remote extensions can be installed.
    #[serde(default = "default_true")]
    pub extension_install_available: bool,

    #[serde(default = "default_true")]
    pub diagnostics_enabled: bool,

    #[serde(default = "default_true")]
    pub connect_entry_enabled: bool,

    /// Human labels of virtual file system schemes, e.g. `github = "GitHub"`.
    #[serde(default)]
    pub virtual_workspace_labels: BTreeMap<String, String>,

    #[serde(default)]
    pub labels: IndicatorLabels,

    #[serde(default)]
    pub menu_labels: MenuLabels,
}

fn default_max_label_length() -> usize {
    DEFAULT_MAX_LABEL_LENGTH
}

fn default_true() -> bool {
    true
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            max_label_length: default_max_label_length(),
            web_embedding: false,
            browser_only: false,
            close_enabled: default_true(),
            extension_install_available: default_true(),
            diagnostics_enabled: default_true(),
            connect_entry_enabled: default_true(),
            virtual_workspace_labels: BTreeMap::new(),
            labels: IndicatorLabels::default(),
            menu_labels: MenuLabels::default(),
        }
    }
}

impl IndicatorConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads the configuration at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Fixed menu entries offered by this environment.
    pub fn presenter_options(&self) -> PresenterOptions {
        PresenterOptions {
            close_enabled: self.close_enabled,
            connect_entry_enabled: self.connect_entry_enabled,
            diagnostics_enabled: self.diagnostics_enabled,
            extension_install_available: self.extension_install_available,
        }
    }
}
