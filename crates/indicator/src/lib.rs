//! Remote status indicator.
//!
//! Combines the connection lifecycle from `remote-indicator-connection` and
//! the contributed menu from `remote-indicator-menu` into a single
//! [`RemoteIndicator`] that decides what the status bar shows and what the
//! remote menu offers.

pub mod config;
pub mod controller;
pub mod decider;
pub mod host;
pub mod workspace;

pub use config::{ConfigError, IndicatorConfig, IndicatorLabels};
pub use controller::RemoteIndicator;
pub use decider::{
    HostIndicator, IndicatorDecider, IndicatorInput, IndicatorView, Tooltip, escape_markdown,
    truncate,
};
pub use host::{HostLabels, SchemeLabels};
pub use workspace::{InvalidUri, ResourceUri, VirtualWorkspaceLocation, Workspace};
