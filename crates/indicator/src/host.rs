//! Host-provided formatting of remote and virtual workspace names.

use std::collections::BTreeMap;

use crate::workspace::REMOTE_SCHEME;

/// Formats hosts for display.
pub trait HostLabels: Send + Sync {
    /// Human label for `authority` under `scheme`, if the host knows one.
    fn host_label(&self, scheme: &str, authority: &str) -> Option<String>;

    /// Rich (markdown) tooltip for the host, if the host provides one.
    fn host_tooltip(&self, _scheme: &str, _authority: &str) -> Option<String> {
        None
    }
}

/// Labels virtual file system schemes from a fixed table; remote
/// authorities get no label and display as-is.
#[derive(Debug, Clone, Default)]
pub struct SchemeLabels {
    labels: BTreeMap<String, String>,
}

impl SchemeLabels {
    pub fn new(labels: BTreeMap<String, String>) -> Self {
        Self { labels }
    }
}

impl HostLabels for SchemeLabels {
    fn host_label(&self, scheme: &str, _authority: &str) -> Option<String> {
        if scheme == REMOTE_SCHEME {
            return None;
        }
        self.labels.get(scheme).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_table_lookup() {
        let labels = SchemeLabels::new(BTreeMap::from([("github".to_string(), "GitHub".to_string())]));
        assert_eq!(labels.host_label("github", "microsoft"), Some("GitHub".into()));
        assert_eq!(labels.host_label("memfs", "x"), None);
        assert_eq!(labels.host_tooltip("github", "microsoft"), None);
    }

    #[test]
    fn remote_scheme_has_no_label() {
        let labels = SchemeLabels::new(BTreeMap::from([(REMOTE_SCHEME.to_string(), "x".to_string())]));
        assert_eq!(labels.host_label(REMOTE_SCHEME, "ssh-remote+h"), None);
    }
}
