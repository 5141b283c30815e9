//! Builds the selection list shown when the remote indicator is clicked.
//!
//! Contributed groups come first, with the groups of the current remote (or
//! virtual file system) moved to the top. Fixed entries for closing,
//! reloading, connecting and diagnostics follow.

use std::cmp::Ordering;
use std::sync::Arc;

use icu_collator::options::{CollatorOptions, Strength};
use icu_collator::{Collator, CollatorBorrowed};
use serde::{Deserialize, Serialize};
use tracing::debug;

use remote_indicator_connection::ConnectionState;

use crate::aggregator::MenuAggregator;
use crate::commands;
use crate::types::{ActionGroup, PresentedItem};
use crate::validator::{GroupKind, remote_name};

/// Labels of the fixed menu entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuLabels {
    pub close_remote: String,
    pub close_virtual_workspace: String,
    pub reload_window: String,
    pub connect: String,
    pub log_authority: String,
    pub log_virtual_workspace: String,
    pub log_extension_gallery_state: String,
    pub install_remote_extensions: String,
}

impl Default for MenuLabels {
    fn default() -> Self {
        Self {
            close_remote: "Close Remote Connection".into(),
            close_virtual_workspace: "Close Remote Workspace".into(),
            reload_window: "Reload Window".into(),
            connect: "Connect to...".into(),
            log_authority: "Log Remote Authority".into(),
            log_virtual_workspace: "Log Virtual Workspace Location".into(),
            log_extension_gallery_state: "Log Extension Gallery State".into(),
            install_remote_extensions: "Install Additional Remote Extensions".into(),
        }
    }
}

/// Which fixed entries this environment offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenterOptions {
    pub close_enabled: bool,
    pub connect_entry_enabled: bool,
    pub diagnostics_enabled: bool,
    pub extension_install_available: bool,
}

impl Default for PresenterOptions {
    fn default() -> Self {
        Self {
            close_enabled: true,
            connect_entry_enabled: true,
            diagnostics_enabled: true,
            extension_install_available: true,
        }
    }
}

/// Session facts the menu depends on.
#[derive(Debug, Clone, Copy, Default)]
pub struct MenuContext<'a> {
    pub authority: Option<&'a str>,
    /// Scheme of the active virtual workspace, if any.
    pub virtual_workspace_scheme: Option<&'a str>,
    pub connection: Option<ConnectionState>,
}

/// Matches group keys that belong to the active remote or virtual file
/// system: `remote_NN_<name>_` or `virtualfs_NN_<scheme>_`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentRemoteMatcher<'a> {
    kind: GroupKind,
    name: &'a str,
}

impl<'a> CurrentRemoteMatcher<'a> {
    /// The authority wins over the virtual workspace.
    pub fn for_context(ctx: &MenuContext<'a>) -> Option<Self> {
        if let Some(authority) = ctx.authority {
            return Some(Self {
                kind: GroupKind::Remote,
                name: remote_name(authority),
            });
        }
        ctx.virtual_workspace_scheme.map(|scheme| Self {
            kind: GroupKind::VirtualFs,
            name: scheme,
        })
    }

    pub fn matches(&self, key: &str) -> bool {
        let Some(rest) = key
            .strip_prefix(self.kind.as_str())
            .and_then(|r| r.strip_prefix('_'))
        else {
            return false;
        };
        let bytes = rest.as_bytes();
        if bytes.len() < 3
            || !bytes[0].is_ascii_digit()
            || !bytes[1].is_ascii_digit()
            || bytes[2] != b'_'
        {
            return false;
        }
        rest[3..]
            .strip_prefix(self.name)
            .is_some_and(|tail| tail.starts_with('_'))
    }
}

/// Root-locale collator at tertiary strength: punctuation before digits
/// before letters, and lowercase first on a case-only difference.
fn key_collator() -> Option<CollatorBorrowed<'static>> {
    let mut options = CollatorOptions::default();
    options.strength = Some(Strength::Tertiary);
    match Collator::try_new(Default::default(), options) {
        Ok(collator) => Some(collator),
        Err(e) => {
            debug!(error = %e, "collation data unavailable, ordering keys by code point");
            None
        }
    }
}

fn compare_keys(collator: Option<&CollatorBorrowed<'_>>, a: &str, b: &str) -> Ordering {
    let collated = match collator {
        Some(collator) => collator.compare(a, b),
        None => a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| b.cmp(a)),
    };
    collated.then_with(|| a.cmp(b))
}

/// Moves groups of the current remote to the front. Both partitions end
/// up ordered by key.
pub fn prioritize_groups(groups: &mut [ActionGroup], matcher: &CurrentRemoteMatcher<'_>) {
    let collator = key_collator();
    groups.sort_by(|a, b| {
        let a_current = matcher.matches(&a.key);
        let b_current = matcher.matches(&b.key);
        b_current
            .cmp(&a_current)
            .then_with(|| compare_keys(collator.as_ref(), &a.key, &b.key))
    });
}

/// Builds the remote menu from the aggregated groups and the fixed entries.
pub struct MenuPresenter {
    aggregator: Arc<MenuAggregator>,
    options: PresenterOptions,
    labels: MenuLabels,
}

impl MenuPresenter {
    pub fn new(
        aggregator: Arc<MenuAggregator>,
        options: PresenterOptions,
        labels: MenuLabels,
    ) -> Self {
        Self {
            aggregator,
            options,
            labels,
        }
    }

    pub fn aggregator(&self) -> &Arc<MenuAggregator> {
        &self.aggregator
    }

    /// Builds the list from a fresh aggregation.
    pub fn build_items(&self, ctx: &MenuContext<'_>) -> Vec<PresentedItem> {
        let mut groups = self.aggregator.groups(true).to_vec();
        if let Some(matcher) = CurrentRemoteMatcher::for_context(ctx) {
            prioritize_groups(&mut groups, &matcher);
        }

        let mut items = contributed_items(&groups);
        items.push(PresentedItem::separator());
        let fixed_start = items.len();
        self.push_fixed_entries(ctx, &mut items);

        if items.len() == fixed_start {
            items.pop();
        }
        items
    }

    fn push_fixed_entries(&self, ctx: &MenuContext<'_>, items: &mut Vec<PresentedItem>) {
        let fixed_start = items.len();
        let labels = &self.labels;
        let workspace_active = ctx.authority.is_some() || ctx.virtual_workspace_scheme.is_some();

        // Reload is offered alongside close, only for a lost remote.
        if self.options.close_enabled {
            if ctx.authority.is_some() {
                items.push(PresentedItem::item(commands::CLOSE, &labels.close_remote));
                if ctx.connection == Some(ConnectionState::Disconnected) {
                    items.push(PresentedItem::item(
                        commands::RELOAD_WINDOW,
                        &labels.reload_window,
                    ));
                }
            } else if ctx.virtual_workspace_scheme.is_some() {
                items.push(PresentedItem::item(
                    commands::CLOSE,
                    &labels.close_virtual_workspace,
                ));
            }
        }
        if self.options.connect_entry_enabled {
            items.push(PresentedItem::item(commands::CONNECT, &labels.connect));
        }

        let mut trailing = Vec::new();
        if self.options.diagnostics_enabled {
            trailing.push(PresentedItem::item(
                commands::LOG_AUTHORITY,
                &labels.log_authority,
            ));
            trailing.push(PresentedItem::item(
                commands::LOG_VIRTUAL_WORKSPACE,
                &labels.log_virtual_workspace,
            ));
            trailing.push(PresentedItem::item(
                commands::LOG_EXTENSION_GALLERY_STATE,
                &labels.log_extension_gallery_state,
            ));
        }
        if !workspace_active && self.options.extension_install_available {
            trailing.push(PresentedItem::item(
                commands::INSTALL_REMOTE_EXTENSIONS,
                &labels.install_remote_extensions,
            ));
        }

        if !trailing.is_empty() {
            if items.len() > fixed_start {
                items.push(PresentedItem::separator());
            }
            items.extend(trailing);
        }
    }
}

/// One item per action; a category separator precedes a group whose first
/// action's category differs from the last one emitted.
fn contributed_items(groups: &[ActionGroup]) -> Vec<PresentedItem> {
    let mut items = Vec::new();
    let mut last_category: Option<&str> = None;

    for group in groups {
        let mut category_checked = false;
        for action in &group.actions {
            if !category_checked {
                let category = action.category.as_deref();
                if category != last_category {
                    items.push(PresentedItem::Separator {
                        label: category.map(str::to_string),
                    });
                    last_category = category;
                }
                category_checked = true;
            }
            items.push(PresentedItem::item(&action.id, &action.label));
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticContributions;
    use crate::types::MenuAction;

    fn group(key: &str, category: Option<&str>) -> ActionGroup {
        let mut action = MenuAction::new(format!("{key}.run"), format!("Run {key}"));
        action.category = category.map(str::to_string);
        ActionGroup::new(key, vec![action])
    }

    fn presenter(groups: Vec<ActionGroup>, options: PresenterOptions) -> MenuPresenter {
        let source = Arc::new(StaticContributions::new(groups));
        let aggregator = MenuAggregator::builder().current(source).build();
        MenuPresenter::new(aggregator, options, MenuLabels::default())
    }

    fn ids(items: &[PresentedItem]) -> Vec<&str> {
        items.iter().filter_map(PresentedItem::id).collect()
    }

    fn bare_options() -> PresenterOptions {
        PresenterOptions {
            close_enabled: false,
            connect_entry_enabled: false,
            diagnostics_enabled: false,
            extension_install_available: false,
        }
    }

    #[test]
    fn matcher_recognizes_current_remote() {
        let ctx = MenuContext {
            authority: Some("ssh-remote+myhost"),
            ..MenuContext::default()
        };
        let matcher = CurrentRemoteMatcher::for_context(&ctx).unwrap();
        assert!(matcher.matches("remote_00_ssh-remote_open"));
        assert!(matcher.matches("remote_42_ssh-remote_"));
        assert!(!matcher.matches("remote_00_ssh_open"));
        assert!(!matcher.matches("remote_00_ssh-remotex_open"));
        assert!(!matcher.matches("virtualfs_00_ssh-remote_open"));
        assert!(!matcher.matches("remote_0_ssh-remote_open"));
    }

    #[test]
    fn matcher_uses_virtual_scheme_without_authority() {
        let ctx = MenuContext {
            virtual_workspace_scheme: Some("github"),
            ..MenuContext::default()
        };
        let matcher = CurrentRemoteMatcher::for_context(&ctx).unwrap();
        assert!(matcher.matches("virtualfs_01_github_browse"));
        assert!(!matcher.matches("remote_01_github_browse"));

        assert!(CurrentRemoteMatcher::for_context(&MenuContext::default()).is_none());
    }

    #[test]
    fn current_remote_groups_sort_first() {
        let p = presenter(
            vec![
                group("remote_01_ssh_a", None),
                group("virtualfs_00_git_b", None),
                group("remote_00_ssh_c", None),
            ],
            bare_options(),
        );
        let ctx = MenuContext {
            authority: Some("ssh"),
            connection: Some(ConnectionState::Connected),
            ..MenuContext::default()
        };

        let items = p.build_items(&ctx);
        assert_eq!(
            ids(&items),
            [
                "remote_00_ssh_c.run",
                "remote_01_ssh_a.run",
                "virtualfs_00_git_b.run"
            ]
        );
    }

    #[test]
    fn other_partition_is_ordered_by_key() {
        let mut groups = vec![
            group("remote_05_wsl_z", None),
            group("remote_01_ssh_a", None),
            group("remote_00_tunnel_b", None),
            group("Remote_00_Tunnel_b", None),
        ];
        let ctx = MenuContext {
            authority: Some("ssh+host"),
            ..MenuContext::default()
        };
        prioritize_groups(&mut groups, &CurrentRemoteMatcher::for_context(&ctx).unwrap());

        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(
            keys,
            [
                "remote_01_ssh_a",
                "remote_00_tunnel_b",
                "Remote_00_Tunnel_b",
                "remote_05_wsl_z"
            ]
        );
    }

    #[test]
    fn separator_sorts_before_digits_in_keys() {
        let mut groups = vec![group("remote_00_ssh2_a", None), group("remote_00_ssh_a", None)];
        let ctx = MenuContext {
            authority: Some("wsl"),
            ..MenuContext::default()
        };
        prioritize_groups(&mut groups, &CurrentRemoteMatcher::for_context(&ctx).unwrap());

        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, ["remote_00_ssh_a", "remote_00_ssh2_a"]);
    }

    #[test]
    fn key_comparison_without_collation_data() {
        assert_eq!(compare_keys(None, "remote_a", "Remote_A"), Ordering::Less);
        assert_eq!(compare_keys(None, "remote_b", "REMOTE_A"), Ordering::Greater);
        assert_eq!(compare_keys(None, "remote_a", "remote_a"), Ordering::Equal);
    }

    #[test]
    fn without_matcher_aggregation_order_is_kept() {
        let p = presenter(
            vec![group("remote_01_ssh_a", None), group("remote_00_ssh_c", None)],
            bare_options(),
        );
        let items = p.build_items(&MenuContext::default());
        assert_eq!(ids(&items), ["remote_01_ssh_a.run", "remote_00_ssh_c.run"]);
    }

    #[test]
    fn contiguous_categories_share_one_separator() {
        let p = presenter(
            vec![
                group("remote_00_docker_a", Some("Docker")),
                group("remote_01_docker_b", Some("Docker")),
            ],
            bare_options(),
        );
        let items = p.build_items(&MenuContext::default());
        let docker_separators = items
            .iter()
            .filter(|i| **i == PresentedItem::labeled_separator("Docker"))
            .count();
        assert_eq!(docker_separators, 1);
        assert_eq!(items[0], PresentedItem::labeled_separator("Docker"));
    }

    #[test]
    fn category_change_emits_new_separator() {
        let p = presenter(
            vec![
                group("remote_00_docker_a", Some("Docker")),
                group("remote_01_ssh_b", Some("SSH")),
                group("remote_02_docker_c", Some("Docker")),
                group("remote_03_plain_d", None),
            ],
            bare_options(),
        );
        let items = p.build_items(&MenuContext::default());
        let separators: Vec<Option<&str>> = items
            .iter()
            .filter_map(|i| match i {
                PresentedItem::Separator { label } => Some(label.as_deref()),
                PresentedItem::Item { .. } => None,
            })
            .collect();
        assert_eq!(
            separators,
            [Some("Docker"), Some("SSH"), Some("Docker"), None]
        );
    }

    #[test]
    fn uncategorized_first_group_has_no_leading_separator() {
        let p = presenter(vec![group("remote_00_ssh_a", None)], bare_options());
        let items = p.build_items(&MenuContext::default());
        assert_eq!(items, [PresentedItem::item("remote_00_ssh_a.run", "Run remote_00_ssh_a")]);
    }

    #[test]
    fn only_first_action_of_group_decides_category() {
        let group = ActionGroup::new(
            "remote_00_ssh_a",
            vec![
                MenuAction::new("a", "A").with_category("SSH"),
                MenuAction::new("b", "B").with_category("Other"),
            ],
        );
        let items = contributed_items(&[group]);
        assert_eq!(
            items,
            [
                PresentedItem::labeled_separator("SSH"),
                PresentedItem::item("a", "A"),
                PresentedItem::item("b", "B"),
            ]
        );
    }

    #[test]
    fn disconnected_remote_offers_close_and_reload() {
        let p = presenter(vec![], PresenterOptions::default());
        let ctx = MenuContext {
            authority: Some("ssh-remote+myhost"),
            connection: Some(ConnectionState::Disconnected),
            ..MenuContext::default()
        };
        let items = p.build_items(&ctx);
        assert_eq!(
            ids(&items),
            [
                commands::CLOSE,
                commands::RELOAD_WINDOW,
                commands::CONNECT,
                commands::LOG_AUTHORITY,
                commands::LOG_VIRTUAL_WORKSPACE,
                commands::LOG_EXTENSION_GALLERY_STATE,
            ]
        );
        assert_eq!(items.iter().filter(|i| i.is_separator()).count(), 2);
    }

    #[test]
    fn connected_remote_has_no_reload() {
        let p = presenter(vec![], PresenterOptions::default());
        let ctx = MenuContext {
            authority: Some("ssh-remote+myhost"),
            connection: Some(ConnectionState::Connected),
            ..MenuContext::default()
        };
        let items = p.build_items(&ctx);
        assert!(!ids(&items).contains(&commands::RELOAD_WINDOW));
        assert!(!ids(&items).contains(&commands::INSTALL_REMOTE_EXTENSIONS));
    }

    #[test]
    fn virtual_workspace_close_uses_workspace_label() {
        let p = presenter(vec![], PresenterOptions::default());
        let ctx = MenuContext {
            virtual_workspace_scheme: Some("github"),
            ..MenuContext::default()
        };
        let items = p.build_items(&ctx);
        assert!(items.contains(&PresentedItem::item(
            commands::CLOSE,
            "Close Remote Workspace"
        )));
    }

    #[test]
    fn local_window_offers_install() {
        let p = presenter(vec![group("remote_00_ssh_a", None)], PresenterOptions::default());
        let items = p.build_items(&MenuContext::default());
        let ids = ids(&items);
        assert!(!ids.contains(&commands::CLOSE));
        assert_eq!(ids.last(), Some(&commands::INSTALL_REMOTE_EXTENSIONS));
    }

    #[test]
    fn close_disabled_hides_reload_too() {
        let options = PresenterOptions {
            close_enabled: false,
            ..PresenterOptions::default()
        };
        let p = presenter(vec![], options);
        let ctx = MenuContext {
            authority: Some("ssh-remote+myhost"),
            connection: Some(ConnectionState::Disconnected),
            ..MenuContext::default()
        };
        let items = p.build_items(&ctx);
        assert!(!ids(&items).contains(&commands::CLOSE));
        assert!(!ids(&items).contains(&commands::RELOAD_WINDOW));
        assert_eq!(ids(&items)[0], commands::CONNECT);
    }

    #[test]
    fn close_disabled_hides_close() {
        let options = PresenterOptions {
            close_enabled: false,
            ..PresenterOptions::default()
        };
        let p = presenter(vec![], options);
        let ctx = MenuContext {
            authority: Some("wsl+Ubuntu"),
            connection: Some(ConnectionState::Connected),
            ..MenuContext::default()
        };
        assert!(!ids(&p.build_items(&ctx)).contains(&commands::CLOSE));
    }

    #[test]
    fn trailing_separator_removed_when_no_fixed_entries() {
        let p = presenter(vec![group("remote_00_ssh_a", None)], bare_options());
        let items = p.build_items(&MenuContext::default());
        assert_eq!(items.len(), 1);
        assert!(!items.last().unwrap().is_separator());
    }

    #[test]
    fn default_options_keep_separator_before_fixed_entries() {
        let p = presenter(vec![group("remote_00_ssh_a", None)], PresenterOptions::default());
        let items = p.build_items(&MenuContext::default());
        assert!(items[1].is_separator());
        assert_eq!(items[2].id(), Some(commands::CONNECT));
    }

    #[test]
    fn no_double_separator_when_only_trailing_entries() {
        let options = PresenterOptions {
            connect_entry_enabled: false,
            ..PresenterOptions::default()
        };
        let p = presenter(vec![], options);
        let items = p.build_items(&MenuContext::default());
        assert!(items[0].is_separator());
        assert!(!items[1].is_separator());
    }

    #[test]
    fn presenter_refreshes_aggregation_on_each_build() {
        let source = Arc::new(StaticContributions::new(vec![group("remote_00_ssh_a", None)]));
        let aggregator = MenuAggregator::builder().current(source.clone()).build();
        let p = MenuPresenter::new(aggregator, bare_options(), MenuLabels::default());

        assert_eq!(p.build_items(&MenuContext::default()).len(), 1);
        source.push_group(group("remote_01_ssh_b", None));
        assert_eq!(p.build_items(&MenuContext::default()).len(), 2);
    }
}
