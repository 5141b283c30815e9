//! Menu data types shared by aggregation and presentation.

use serde::{Deserialize, Serialize};

/// An invocable command contributed to the remote menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuAction {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl MenuAction {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// An ordered bundle of actions sharing a provider-defined group key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionGroup {
    #[serde(rename = "group")]
    pub key: String,
    #[serde(default)]
    pub actions: Vec<MenuAction>,
}

impl ActionGroup {
    pub fn new(key: impl Into<String>, actions: Vec<MenuAction>) -> Self {
        Self {
            key: key.into(),
            actions,
        }
    }
}

/// One row of the selection list shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PresentedItem {
    Separator {
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Item {
        id: String,
        label: String,
    },
}

impl PresentedItem {
    pub fn separator() -> Self {
        Self::Separator { label: None }
    }

    pub fn labeled_separator(label: impl Into<String>) -> Self {
        Self::Separator {
            label: Some(label.into()),
        }
    }

    pub fn item(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::Item {
            id: id.into(),
            label: label.into(),
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Self::Separator { .. })
    }

    /// Command id of a selectable item.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Item { id, .. } => Some(id),
            Self::Separator { .. } => None,
        }
    }
}
