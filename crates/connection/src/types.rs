//! Public types for the connection state machine.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

/// Lifecycle state of the remote connection.
///
/// There is no "uninitialized" variant: a machine without a configured
/// authority reports `None` from [`state`](crate::ConnectionStateMachine::state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Authority configured, resolution still pending.
    Initializing,
    /// Connected to the remote authority.
    Connected,
    /// Connection lost, the channel is trying to get it back.
    Reconnecting,
    /// Connection lost for good, or resolution failed.
    Disconnected,
}

impl ConnectionState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events delivered by the live connection channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleEvent {
    ConnectionLost,
    ReconnectionRunning,
    ReconnectionWait,
    ReconnectionPermanentFailure,
    ConnectionGain,
}

impl LifecycleEvent {
    /// State the machine moves to on this event, regardless of the current one.
    pub const fn target_state(self) -> ConnectionState {
        match self {
            Self::ConnectionLost | Self::ReconnectionRunning | Self::ReconnectionWait => {
                ConnectionState::Reconnecting
            }
            Self::ReconnectionPermanentFailure => ConnectionState::Disconnected,
            Self::ConnectionGain => ConnectionState::Connected,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConnectionLost => "connection-lost",
            Self::ReconnectionRunning => "reconnection-running",
            Self::ReconnectionWait => "reconnection-wait",
            Self::ReconnectionPermanentFailure => "reconnection-permanent-failure",
            Self::ConnectionGain => "connection-gain",
        }
    }
}

impl std::str::FromStr for LifecycleEvent {
    type Err = UnknownEvent;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim() {
            "connection-lost" => Ok(Self::ConnectionLost),
            "reconnection-running" => Ok(Self::ReconnectionRunning),
            "reconnection-wait" => Ok(Self::ReconnectionWait),
            "reconnection-permanent-failure" => Ok(Self::ReconnectionPermanentFailure),
            "connection-gain" => Ok(Self::ConnectionGain),
            other => Err(UnknownEvent(other.to_string())),
        }
    }
}

/// Returned when parsing an unrecognized lifecycle event name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown lifecycle event: {0}")]
pub struct UnknownEvent(pub String);

/// Coarse connection value published for external visibility conditions.
///
/// `Reconnecting` has no value of its own and is reported as
/// [`Disconnected`](Self::Disconnected).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionContext {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "initializing")]
    Initializing,
    #[serde(rename = "disconnected")]
    Disconnected,
    #[serde(rename = "connected")]
    Connected,
}

impl ConnectionContext {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Initializing => "initializing",
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
        }
    }
}

impl From<Option<ConnectionState>> for ConnectionContext {
    fn from(state: Option<ConnectionState>) -> Self {
        match state {
            None => Self::None,
            Some(ConnectionState::Initializing) => Self::Initializing,
            Some(ConnectionState::Connected) => Self::Connected,
            Some(ConnectionState::Reconnecting | ConnectionState::Disconnected) => {
                Self::Disconnected
            }
        }
    }
}

impl fmt::Display for ConnectionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by an [`AuthorityResolver`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to resolve authority {authority}: {message}")]
pub struct ResolveError {
    pub authority: String,
    pub message: String,
}

/// One-shot authority resolution provided by the host.
///
/// Retries, if any, are the resolver's business; the state machine issues a
/// single call per configured authority.
pub trait AuthorityResolver: Send + Sync + 'static {
    fn resolve(&self, authority: &str) -> impl Future<Output = Result<(), ResolveError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_map_to_target_states() {
        assert_eq!(
            LifecycleEvent::ConnectionLost.target_state(),
            ConnectionState::Reconnecting
        );
        assert_eq!(
            LifecycleEvent::ReconnectionRunning.target_state(),
            ConnectionState::Reconnecting
        );
        assert_eq!(
            LifecycleEvent::ReconnectionWait.target_state(),
            ConnectionState::Reconnecting
        );
        assert_eq!(
            LifecycleEvent::ReconnectionPermanentFailure.target_state(),
            ConnectionState::Disconnected
        );
        assert_eq!(
            LifecycleEvent::ConnectionGain.target_state(),
            ConnectionState::Connected
        );
    }

    #[test]
    fn projection_collapses_reconnecting() {
        assert_eq!(
            ConnectionContext::from(Some(ConnectionState::Reconnecting)),
            ConnectionContext::Disconnected
        );
        assert_eq!(ConnectionContext::from(None).as_str(), "");
        assert_eq!(
            ConnectionContext::from(Some(ConnectionState::Initializing)).as_str(),
            "initializing"
        );
        assert_eq!(
            ConnectionContext::from(Some(ConnectionState::Connected)).as_str(),
            "connected"
        );
    }

    #[test]
    fn projection_never_reports_reconnecting() {
        let states = [
            None,
            Some(ConnectionState::Initializing),
            Some(ConnectionState::Connected),
            Some(ConnectionState::Reconnecting),
            Some(ConnectionState::Disconnected),
        ];
        for state in states {
            assert_ne!(ConnectionContext::from(state).as_str(), "reconnecting");
        }
    }

    #[test]
    fn event_names_parse() {
        for event in [
            LifecycleEvent::ConnectionLost,
            LifecycleEvent::ReconnectionRunning,
            LifecycleEvent::ReconnectionWait,
            LifecycleEvent::ReconnectionPermanentFailure,
            LifecycleEvent::ConnectionGain,
        ] {
            assert_eq!(event.as_str().parse::<LifecycleEvent>(), Ok(event));
        }
        assert_eq!(
            "bogus".parse::<LifecycleEvent>(),
            Err(UnknownEvent("bogus".into()))
        );
    }
}
