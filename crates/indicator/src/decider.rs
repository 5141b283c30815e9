//! Decides what the remote indicator shows.
//!
//! Display modes are tried in priority order, first match wins:
//! 1. an indicator supplied by the host
//! 2. the remote host status, while an authority is active
//! 3. the virtual workspace, when its location has a label
//! 4. a bare icon opening the menu, when contributed actions exist
//! 5. nothing

use serde::{Deserialize, Serialize};

use remote_indicator_connection::ConnectionState;
use remote_indicator_menu::commands;

use crate::config::IndicatorConfig;
use crate::host::HostLabels;
use crate::workspace::{REMOTE_SCHEME, VirtualWorkspaceLocation};

/// Icon markup understood by the status bar renderer.
pub const REMOTE_ICON: &str = "$(remote)";
pub const ALERT_ICON: &str = "$(alert)";

const ELLIPSIS: char = '\u{2026}';

/// Indicator supplied by the embedding host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostIndicator {
    pub label: String,
    pub tooltip: String,
    #[serde(default)]
    pub command: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tooltip {
    Plain(String),
    Markdown(String),
}

impl Tooltip {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain(s) | Self::Markdown(s) => s,
        }
    }
}

/// What the status bar entry displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorView {
    pub text: String,
    pub tooltip: Option<Tooltip>,
    /// Command run when the entry is clicked.
    pub command: String,
    pub show_progress: bool,
}

impl IndicatorView {
    fn new(text: String, tooltip: Option<Tooltip>) -> Self {
        Self {
            text,
            tooltip,
            command: commands::SHOW_MENU.to_string(),
            show_progress: false,
        }
    }

    fn with_progress(mut self) -> Self {
        self.show_progress = true;
        self
    }
}

/// Inputs of a decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorInput<'a> {
    pub host_indicator: Option<&'a HostIndicator>,
    pub authority: Option<&'a str>,
    pub connection: Option<ConnectionState>,
    pub virtual_workspace: Option<&'a VirtualWorkspaceLocation>,
}

/// Keeps the first `max` characters of `text`, appending an ellipsis when
/// anything was cut.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => {
            let mut out = text[..idx].to_string();
            out.push(ELLIPSIS);
            out
        }
        None => text.to_string(),
    }
}

/// Substitutes `{0}` in a label template.
pub fn fill(template: &str, value: &str) -> String {
    template.replace("{0}", value)
}

/// Escapes markdown control characters so `text` renders literally.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '\\' | '`' | '*' | '_' | '{' | '}' | '[' | ']' | '(' | ')' | '#' | '+' | '-' | '!' | '~'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Pure display decision over the current session facts.
pub struct IndicatorDecider<'a> {
    config: &'a IndicatorConfig,
    host_labels: &'a dyn HostLabels,
}

impl<'a> IndicatorDecider<'a> {
    pub fn new(config: &'a IndicatorConfig, host_labels: &'a dyn HostLabels) -> Self {
        Self {
            config,
            host_labels,
        }
    }

    /// Returns the view to display, or `None` to remove the indicator.
    /// `has_menu_actions` is only consulted when no other mode applies.
    pub fn decide(
        &self,
        input: &IndicatorInput<'_>,
        has_menu_actions: impl FnOnce() -> bool,
    ) -> Option<IndicatorView> {
        if let Some(host) = input.host_indicator {
            return Some(self.host_indicator_view(host, input.authority.is_some()));
        }

        if let Some(authority) = input.authority
            && !self.config.web_embedding
        {
            return Some(self.remote_view(authority, input.connection));
        }

        if let Some(location) = input.virtual_workspace
            && let Some(view) = self.virtual_workspace_view(location, input.authority.is_some())
        {
            return Some(view);
        }

        if has_menu_actions() {
            return Some(IndicatorView::new(
                REMOTE_ICON.to_string(),
                Some(Tooltip::Plain(self.config.labels.open_remote_window.clone())),
            ));
        }
        None
    }

    fn host_indicator_view(&self, host: &HostIndicator, authority_active: bool) -> IndicatorView {
        let text = if authority_active {
            let label = host.label.trim();
            let label = if label.starts_with("$(") {
                label.to_string()
            } else {
                format!("{REMOTE_ICON} {label}")
            };
            truncate(&label, self.config.max_label_length)
        } else {
            REMOTE_ICON.to_string()
        };
        IndicatorView {
            text,
            tooltip: Some(Tooltip::Plain(host.tooltip.clone())),
            command: host
                .command
                .clone()
                .unwrap_or_else(|| commands::SHOW_MENU.to_string()),
            show_progress: false,
        }
    }

    fn remote_view(&self, authority: &str, state: Option<ConnectionState>) -> IndicatorView {
        let labels = &self.config.labels;
        let host_label = self
            .host_labels
            .host_label(REMOTE_SCHEME, authority)
            .unwrap_or_else(|| authority.to_string());
        let short = truncate(&host_label, self.config.max_label_length);

        match state {
            Some(ConnectionState::Initializing) => IndicatorView::new(
                labels.opening.clone(),
                Some(Tooltip::Plain(labels.opening.clone())),
            )
            .with_progress(),
            Some(ConnectionState::Reconnecting) => {
                IndicatorView::new(fill(&labels.reconnecting, &short), None).with_progress()
            }
            Some(ConnectionState::Disconnected) => IndicatorView::new(
                format!("{ALERT_ICON} {}", fill(&labels.disconnected, &short)),
                None,
            ),
            Some(ConnectionState::Connected) | None => {
                let tooltip = self.rich_tooltip(REMOTE_SCHEME, authority, &host_label);
                IndicatorView::new(
                    format!("{REMOTE_ICON} {short}"),
                    Some(Tooltip::Markdown(tooltip)),
                )
            }
        }
    }

    fn virtual_workspace_view(
        &self,
        location: &VirtualWorkspaceLocation,
        authority_active: bool,
    ) -> Option<IndicatorView> {
        let label = self
            .host_labels
            .host_label(&location.scheme, &location.authority)?;
        let mut tooltip = self.rich_tooltip(&location.scheme, &location.authority, &label);
        if !self.config.browser_only || authority_active {
            let link = format!("command:{}", commands::LIST_UNSUPPORTED_VIRTUAL_EXTENSIONS);
            tooltip.push_str("\n\n");
            tooltip.push_str(&fill(&self.config.labels.virtual_workspace_note, &link));
        }
        Some(IndicatorView::new(
            format!(
                "{REMOTE_ICON} {}",
                truncate(&label, self.config.max_label_length)
            ),
            Some(Tooltip::Markdown(tooltip)),
        ))
    }

    /// Host tooltip if provided, otherwise the "editing on" text.
    fn rich_tooltip(&self, scheme: &str, authority: &str, host_label: &str) -> String {
        self.host_labels
            .host_tooltip(scheme, authority)
            .unwrap_or_else(|| escape_markdown(&fill(&self.config.labels.editing_on, host_label)))
    }
}
