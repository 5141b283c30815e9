//! Remote indicator controller.
//!
//! Owns the connection state machine, the menu presenter and the current
//! workspace, and turns them into an [`IndicatorView`] and a selection list
//! on demand. Listeners registered with [`RemoteIndicator::subscribe`] are
//! told when anything affecting the view changed.

use std::sync::Arc;

use tracing::{debug, info};

use remote_indicator_connection::{
    ConnectionContext, ConnectionState, ConnectionStateMachine, LifecycleEvent,
};
use remote_indicator_menu::{
    ChangeNotifier, CommandExecutor, MenuAggregator, MenuContext, MenuPresenter, PresentedItem,
    Subscription, commands, run_best_effort,
};

use crate::config::IndicatorConfig;
use crate::decider::{HostIndicator, IndicatorDecider, IndicatorInput, IndicatorView};
use crate::host::{HostLabels, SchemeLabels};
use crate::workspace::{VirtualWorkspaceLocation, Workspace};

/// Wires the state machine, aggregation and decision together.
pub struct RemoteIndicator {
    config: IndicatorConfig,
    host_labels: Box<dyn HostLabels>,
    connection: ConnectionStateMachine,
    presenter: MenuPresenter,
    executor: Arc<dyn CommandExecutor>,
    workspace: Option<Workspace>,
    virtual_location: Option<VirtualWorkspaceLocation>,
    host_indicator: Option<HostIndicator>,
    changed: ChangeNotifier,
    _menu_subscription: Subscription,
}

impl RemoteIndicator {
    /// Creates the controller. When the machine has an authority, state
    /// changes are forwarded to subscribers from a task on the current
    /// tokio runtime.
    pub fn new(
        config: IndicatorConfig,
        connection: ConnectionStateMachine,
        aggregator: Arc<MenuAggregator>,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        let changed = ChangeNotifier::new();

        let menu_changed = changed.clone();
        let menu_subscription = aggregator.subscribe(move || menu_changed.notify());

        if connection.authority().is_some() {
            let mut rx = connection.subscribe();
            let state_changed = changed.clone();
            tokio::spawn(async move {
                while rx.changed().await.is_ok() {
                    state_changed.notify();
                }
            });
        }

        let presenter = MenuPresenter::new(
            aggregator,
            config.presenter_options(),
            config.menu_labels.clone(),
        );
        let host_labels = Box::new(SchemeLabels::new(config.virtual_workspace_labels.clone()));

        Self {
            config,
            host_labels,
            connection,
            presenter,
            executor,
            workspace: None,
            virtual_location: None,
            host_indicator: None,
            changed,
            _menu_subscription: menu_subscription,
        }
    }

    /// Replaces the host label formatter.
    pub fn with_host_labels(mut self, host_labels: Box<dyn HostLabels>) -> Self {
        self.host_labels = host_labels;
        self
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    pub fn connection(&self) -> &ConnectionStateMachine {
        &self.connection
    }

    pub fn state(&self) -> Option<ConnectionState> {
        self.connection.state()
    }

    pub fn context(&self) -> ConnectionContext {
        self.connection.context()
    }

    pub fn virtual_location(&self) -> Option<&VirtualWorkspaceLocation> {
        self.virtual_location.as_ref()
    }

    /// Registers a listener called whenever the view may have changed.
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.changed.subscribe(listener)
    }

    /// Applies a lifecycle event from the connection channel.
    pub fn handle_event(&self, event: LifecycleEvent) -> bool {
        self.connection.handle_event(event)
    }

    /// Sets the opened workspace. The virtual location is only recomputed
    /// when the workspace identity changes.
    pub fn set_workspace(&mut self, workspace: Option<Workspace>) {
        let same_identity = match (&self.workspace, &workspace) {
            (Some(old), Some(new)) => old.id == new.id,
            (None, None) => true,
            _ => false,
        };
        self.workspace = workspace;
        if same_identity {
            return;
        }

        let location = self.workspace.as_ref().and_then(Workspace::virtual_location);
        if location != self.virtual_location {
            debug!(location = ?location, "virtual workspace location changed");
            self.virtual_location = location;
            self.changed.notify();
        }
    }

    /// Sets or clears the indicator supplied by the host.
    pub fn set_host_indicator(&mut self, indicator: Option<HostIndicator>) {
        if self.host_indicator != indicator {
            self.host_indicator = indicator;
            self.changed.notify();
        }
    }

    /// Current display decision; `None` removes the indicator.
    pub fn view(&self) -> Option<IndicatorView> {
        let input = IndicatorInput {
            host_indicator: self.host_indicator.as_ref(),
            authority: self.connection.authority(),
            connection: self.connection.state(),
            virtual_workspace: self.virtual_location.as_ref(),
        };
        IndicatorDecider::new(&self.config, self.host_labels.as_ref())
            .decide(&input, || self.presenter.aggregator().has_actions())
    }

    /// Builds the selection list for the menu.
    pub fn menu_items(&self) -> Vec<PresentedItem> {
        self.presenter.build_items(&self.menu_context())
    }

    /// Runs the command behind a selected entry. Diagnostics are handled
    /// here; everything else goes to the executor, and failures are
    /// ignored.
    pub fn select(&self, id: &str) {
        debug!(command = id, "remote menu entry selected");
        match id {
            commands::LOG_AUTHORITY => {
                info!(
                    authority = ?self.connection.authority(),
                    state = ?self.state(),
                    "remote authority"
                );
            }
            commands::LOG_VIRTUAL_WORKSPACE => {
                info!(location = ?self.virtual_location, "virtual workspace location");
            }
            commands::LOG_EXTENSION_GALLERY_STATE => {
                info!(
                    available = self.config.extension_install_available,
                    "extension gallery state"
                );
            }
            _ => run_best_effort(self.executor.as_ref(), id),
        }
    }

    fn menu_context(&self) -> MenuContext<'_> {
        MenuContext {
            authority: self.connection.authority(),
            virtual_workspace_scheme: self.virtual_location.as_ref().map(|l| l.scheme.as_str()),
            connection: self.connection.state(),
        }
    }
}
