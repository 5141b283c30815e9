//! Command ids and id-based command dispatch.
//!
//! Commands are plain records registered into a flat map keyed by id.
//! Selecting a menu entry yields an id that is handed to a
//! [`CommandExecutor`]; the menu never interprets the outcome.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

/// Opens the remote menu. Default command of the indicator.
pub const SHOW_MENU: &str = "remote.showMenu";
/// Closes the remote connection or virtual workspace.
pub const CLOSE: &str = "remote.close";
/// Reloads the window after a permanent disconnect.
pub const RELOAD_WINDOW: &str = "remote.reloadWindow";
/// Starts a new remote connection.
pub const CONNECT: &str = "remote.connect";
pub const LOG_AUTHORITY: &str = "remote.logAuthority";
pub const LOG_VIRTUAL_WORKSPACE: &str = "remote.logVirtualWorkspace";
pub const LOG_EXTENSION_GALLERY_STATE: &str = "remote.logExtensionGalleryState";
/// Browses extensions that provide remote connections.
pub const INSTALL_REMOTE_EXTENSIONS: &str = "remote.installExtensions";
/// Lists extensions unavailable in a virtual workspace.
pub const LIST_UNSUPPORTED_VIRTUAL_EXTENSIONS: &str = "remote.listUnsupportedVirtualExtensions";

/// Errors raised while running a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("command {id} failed: {message}")]
    Failed { id: String, message: String },
}

/// Runs commands by id.
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, id: &str) -> Result<(), CommandError>;
}

/// Runs `id` and discards any failure.
///
/// Menu entries such as connect and close touch the environment (opening
/// windows, persisting markers); their failures never propagate.
pub fn run_best_effort(executor: &dyn CommandExecutor, id: &str) {
    if let Err(e) = executor.execute(id) {
        debug!(command = id, error = %e, "command failed, ignoring");
    }
}

type Handler = Arc<dyn Fn() -> Result<(), String> + Send + Sync>;

/// A registered command.
#[derive(Clone)]
pub struct Command {
    pub id: String,
    pub category: Option<String>,
    pub title: String,
    run: Handler,
}

impl Command {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        run: impl Fn() -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            category: None,
            title: title.into(),
            run: Arc::new(run),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

/// Flat id to handler map.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `command`, returning the one it replaced, if any.
    pub fn register(&mut self, command: Command) -> Option<Command> {
        self.commands.insert(command.id.clone(), command)
    }

    pub fn get(&self, id: &str) -> Option<&Command> {
        self.commands.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.commands.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl CommandExecutor for CommandRegistry {
    fn execute(&self, id: &str) -> Result<(), CommandError> {
        let command = self
            .commands
            .get(id)
            .ok_or_else(|| CommandError::UnknownCommand(id.to_string()))?;
        debug!(command = id, "running command");
        (command.run)().map_err(|message| CommandError::Failed {
            id: id.to_string(),
            message,
        })
    }
}
