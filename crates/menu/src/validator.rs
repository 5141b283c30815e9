//! Group key parsing and validation.
//!
//! Group keys have the form
//! `(remote|virtualfs)_<two digit order>_<scheme or remote name>_<grouping>`.
//! Keys that do not match are rejected and reported once per distinct key
//! for the lifetime of the validator.

use std::collections::HashSet;
use std::fmt;
use std::sync::{LazyLock, Mutex};

use regex::Regex;
use tracing::warn;

/// Expected format, quoted in diagnostics.
pub const GROUP_KEY_FORMAT: &str =
    "(remote|virtualfs)_<two digit order>_<scheme or remote name>_<grouping>";

static GROUP_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(remote|virtualfs)_([0-9]{2})_([a-z][a-z0-9+.-]*)_(.*)$")
        .expect("group key pattern is valid")
});

/// Which context a group targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Remote,
    VirtualFs,
}

impl GroupKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::VirtualFs => "virtualfs",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed group key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupKey<'a> {
    pub kind: GroupKind,
    pub order: u8,
    pub scheme: &'a str,
    pub grouping: &'a str,
}

impl<'a> GroupKey<'a> {
    /// Parses `key`, returning `None` if it does not follow the format.
    pub fn parse(key: &'a str) -> Option<Self> {
        let caps = GROUP_KEY.captures(key)?;
        let kind = match caps.get(1)?.as_str() {
            "remote" => GroupKind::Remote,
            _ => GroupKind::VirtualFs,
        };
        let order = caps.get(2)?.as_str().parse().ok()?;
        Some(Self {
            kind,
            order,
            scheme: caps.get(3)?.as_str(),
            grouping: caps.get(4)?.as_str(),
        })
    }
}

/// Short name of a remote authority: the text before the first `+`.
///
/// `ssh-remote+myhost` becomes `ssh-remote`; an authority without `+` is
/// its own name.
pub fn remote_name(authority: &str) -> &str {
    authority
        .split_once('+')
        .map_or(authority, |(name, _)| name)
}

/// Validates group keys, warning once per distinct invalid key.
#[derive(Debug, Default)]
pub struct ActionGroupValidator {
    reported: Mutex<HashSet<String>>,
}

impl ActionGroupValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `key` is well-formed. Rejected keys are logged the
    /// first time they are seen.
    pub fn validate(&self, key: &str) -> bool {
        if GROUP_KEY.is_match(key) {
            return true;
        }
        self.report(key);
        false
    }

    /// Number of distinct invalid keys reported so far.
    pub fn reported_count(&self) -> usize {
        self.reported.lock().map(|set| set.len()).unwrap_or(0)
    }

    fn report(&self, key: &str) {
        let Ok(mut reported) = self.reported.lock() else {
            return;
        };
        if reported.insert(key.to_string()) {
            warn!(
                group = %key,
                expected = GROUP_KEY_FORMAT,
                "invalid remote indicator menu group, ignoring"
            );
        }
    }
}
