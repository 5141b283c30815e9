//! Remote indicator menu.
//!
//! Aggregates action groups contributed by independent providers, validates
//! their keys, and builds the ordered selection list shown from the remote
//! status indicator:
//! - [`MenuAggregator`] merges current-tier and legacy-tier sources and
//!   caches the result until a source signals a change
//! - [`ActionGroupValidator`] enforces the group key format
//! - [`MenuPresenter`] prioritizes, separates and completes the list
//! - [`CommandRegistry`] dispatches selected entries by id

pub mod aggregator;
pub mod commands;
pub mod notify;
pub mod presenter;
pub mod source;
pub mod types;
pub mod validator;

pub use aggregator::{MenuAggregator, MenuAggregatorBuilder, Tier};
pub use commands::{Command, CommandError, CommandExecutor, CommandRegistry, run_best_effort};
pub use notify::{ChangeNotifier, Subscription};
pub use presenter::{
    CurrentRemoteMatcher, MenuContext, MenuLabels, MenuPresenter, PresenterOptions,
    prioritize_groups,
};
pub use source::{ContributionError, ContributionSource, StaticContributions};
pub use types::{ActionGroup, MenuAction, PresentedItem};
pub use validator::{ActionGroupValidator, GroupKey, GroupKind, remote_name};
