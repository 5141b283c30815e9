//! Contribution sources feeding the remote menu.

use std::path::Path;
use std::sync::RwLock;

use tracing::debug;

use crate::notify::{ChangeNotifier, Subscription};
use crate::types::ActionGroup;

/// Errors loading contributions from a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ContributionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A provider of action groups.
///
/// Firing the change signal carries no payload; consumers re-query
/// [`groups`](Self::groups).
pub trait ContributionSource: Send + Sync {
    /// Current groups, in provider order.
    fn groups(&self) -> Vec<ActionGroup>;

    /// Registers a listener called whenever the groups change.
    fn subscribe(&self, listener: Box<dyn Fn() + Send + Sync>) -> Subscription;
}

/// In-memory contribution source.
#[derive(Default)]
pub struct StaticContributions {
    groups: RwLock<Vec<ActionGroup>>,
    changed: ChangeNotifier,
}

impl StaticContributions {
    pub fn new(groups: Vec<ActionGroup>) -> Self {
        Self {
            groups: RwLock::new(groups),
            changed: ChangeNotifier::new(),
        }
    }

    /// Parses a manifest of the form
    /// `[{"group": "remote_00_ssh_x", "actions": [{"id": "..", "label": ".."}]}]`.
    pub fn from_json_str(json: &str) -> Result<Self, ContributionError> {
        let groups: Vec<ActionGroup> = serde_json::from_str(json)?;
        Ok(Self::new(groups))
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ContributionError> {
        let content = std::fs::read_to_string(path)?;
        let source = Self::from_json_str(&content)?;
        debug!(path = %path.display(), "contributions loaded");
        Ok(source)
    }

    /// Replaces the groups and signals the change.
    pub fn set_groups(&self, groups: Vec<ActionGroup>) {
        if let Ok(mut guard) = self.groups.write() {
            *guard = groups;
        }
        self.changed.notify();
    }

    /// Appends one group and signals the change.
    pub fn push_group(&self, group: ActionGroup) {
        if let Ok(mut guard) = self.groups.write() {
            guard.push(group);
        }
        self.changed.notify();
    }
}

impl ContributionSource for StaticContributions {
    fn groups(&self) -> Vec<ActionGroup> {
        self.groups.read().map(|g| g.clone()).unwrap_or_default()
    }

    fn subscribe(&self, listener: Box<dyn Fn() + Send + Sync>) -> Subscription {
        self.changed.subscribe(listener)
    }
}
