//! Workspace folders and virtual workspace detection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Scheme of local files.
pub const FILE_SCHEME: &str = "file";
/// Scheme of resources served through a remote authority.
pub const REMOTE_SCHEME: &str = "remote";

/// Location of a workspace backed by a virtual file system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VirtualWorkspaceLocation {
    pub scheme: String,
    pub authority: String,
}

/// A resource URI of the form `scheme://authority/path`. Strings without
/// `://` are local file paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceUri {
    pub scheme: String,
    pub authority: String,
    pub path: String,
}

impl ResourceUri {
    /// Whether the resource lives on a virtual file system.
    pub fn is_virtual(&self) -> bool {
        self.scheme != FILE_SCHEME && self.scheme != REMOTE_SCHEME
    }

    fn location(&self) -> VirtualWorkspaceLocation {
        VirtualWorkspaceLocation {
            scheme: self.scheme.clone(),
            authority: self.authority.clone(),
        }
    }
}

/// Returned when a URI has an empty or malformed scheme.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid resource URI: {0}")]
pub struct InvalidUri(pub String);

impl FromStr for ResourceUri {
    type Err = InvalidUri;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let Some((scheme, rest)) = input.split_once("://") else {
            return Ok(Self {
                scheme: FILE_SCHEME.to_string(),
                authority: String::new(),
                path: input.to_string(),
            });
        };

        let valid_scheme = scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !valid_scheme {
            return Err(InvalidUri(input.to_string()));
        }

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };
        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            authority: authority.to_string(),
            path: path.to_string(),
        })
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scheme == FILE_SCHEME && self.authority.is_empty() {
            return f.write_str(&self.path);
        }
        write!(f, "{}://{}{}", self.scheme, self.authority, self.path)
    }
}

/// The opened workspace, identified by `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub id: String,
    pub folders: Vec<ResourceUri>,
    /// Workspace file, for multi-root workspaces.
    pub configuration: Option<ResourceUri>,
}

impl Workspace {
    pub fn new(id: impl Into<String>, folders: Vec<ResourceUri>) -> Self {
        Self {
            id: id.into(),
            folders,
            configuration: None,
        }
    }

    /// Virtual location of the workspace: the first folder's, when every
    /// folder is virtual. Without folders the configuration file decides.
    pub fn virtual_location(&self) -> Option<VirtualWorkspaceLocation> {
        if let Some(first) = self.folders.first() {
            return self
                .folders
                .iter()
                .all(ResourceUri::is_virtual)
                .then(|| first.location());
        }
        self.configuration
            .as_ref()
            .filter(|c| c.is_virtual())
            .map(ResourceUri::location)
    }
}
