//! Connection lifecycle tracking for the remote status indicator.
//!
//! Provides the five-state [`ConnectionStateMachine`], the lifecycle events
//! that drive it, and the coarse [`ConnectionContext`] projection published
//! to external consumers.

pub mod machine;
pub mod types;

pub use machine::ConnectionStateMachine;
pub use types::{
    AuthorityResolver, ConnectionContext, ConnectionState, LifecycleEvent, ResolveError,
    UnknownEvent,
};
