use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use remote_indicator::{IndicatorConfig, IndicatorView, RemoteIndicator, Workspace};
use remote_indicator_connection::{AuthorityResolver, ConnectionStateMachine, ResolveError};
use remote_indicator_menu::{
    Command, CommandRegistry, ContributionSource, MenuAggregator, StaticContributions, commands,
};

use crate::Args;

/// Resolves every authority with a fixed outcome.
struct StaticResolver {
    fail: bool,
}

impl AuthorityResolver for StaticResolver {
    async fn resolve(&self, authority: &str) -> Result<(), ResolveError> {
        if self.fail {
            return Err(ResolveError {
                authority: authority.to_string(),
                message: "resolution disabled by --resolve-fails".into(),
            });
        }
        Ok(())
    }
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => IndicatorConfig::load_or_default(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => IndicatorConfig::default(),
    };

    let contributions = match &args.contributions {
        Some(path) => StaticContributions::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => StaticContributions::default(),
    };
    let contributions = Arc::new(contributions);
    let registry = build_registry(contributions.as_ref());
    let aggregator = MenuAggregator::builder().current(contributions).build();

    let connection = ConnectionStateMachine::start(
        args.authority.clone(),
        Arc::new(StaticResolver {
            fail: args.resolve_fails,
        }),
    );
    connection.resolution_finished().await;

    let mut indicator = RemoteIndicator::new(config, connection, aggregator, Arc::new(registry));
    if let Some(folder) = args.workspace {
        indicator.set_workspace(Some(Workspace::new(folder.to_string(), vec![folder])));
    }
    for event in args.events {
        indicator.handle_event(event);
    }

    print_view(indicator.view().as_ref());
    println!("context: {}", indicator.context().as_str());
    println!(
        "menu: {}",
        serde_json::to_string_pretty(&indicator.menu_items())?
    );

    if let Some(id) = args.select {
        indicator.select(&id);
    }
    Ok(())
}

/// Registers the fixed entries plus every contributed action. Each only
/// logs that it ran.
fn build_registry(contributions: &StaticContributions) -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    let fixed = [
        commands::CLOSE,
        commands::RELOAD_WINDOW,
        commands::CONNECT,
        commands::INSTALL_REMOTE_EXTENSIONS,
        commands::LIST_UNSUPPORTED_VIRTUAL_EXTENSIONS,
    ];
    for id in fixed {
        registry.register(logging_command(id.to_string(), None));
    }
    for action in contributions.groups().into_iter().flat_map(|g| g.actions) {
        registry.register(logging_command(action.id, action.category));
    }
    registry
}

fn logging_command(id: String, category: Option<String>) -> Command {
    let logged = id.clone();
    let command = Command::new(id.clone(), id, move || {
        info!(command = %logged, "command executed");
        Ok(())
    });
    match category {
        Some(category) => command.with_category(category),
        None => command,
    }
}

fn print_view(view: Option<&IndicatorView>) {
    let Some(view) = view else {
        println!("indicator: hidden");
        return;
    };
    println!("indicator: {}", view.text);
    if let Some(tooltip) = &view.tooltip {
        println!("tooltip: {}", tooltip.as_str());
    }
    println!("command: {}", view.command);
    if view.show_progress {
        println!("progress: yes");
    }
}
