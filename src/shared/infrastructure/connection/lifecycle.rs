use std::fmt;
use std::sync::{Arc, Mutex};

/// Log target for every connection lifecycle line.
pub const LIFECYCLE_TARGET: &str = "MongoDB";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Disconnected,
    Disconnecting,
    Closed,
}

/// Observations coming from the driver (or from the connection builder). Availability is
/// about the whole topology: at least one data-bearing server is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverSignal {
    TopologyAvailable,
    TopologyUnavailable,
    ShutdownStarted,
    TopologyClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Connected,
    Open,
    Disconnected,
    Reconnected,
    Disconnecting,
}

impl LifecycleEvent {
    pub fn describe(&self, database_name: &str) -> String {
        match self {
            LifecycleEvent::Connected => format!("MongoDB connected to {database_name}"),
            other => format!("MongoDB {other}"),
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LifecycleEvent::Connected => "connected",
            LifecycleEvent::Open => "open",
            LifecycleEvent::Disconnected => "disconnected",
            LifecycleEvent::Reconnected => "reconnected",
            LifecycleEvent::Disconnecting => "disconnecting",
        })
    }
}

pub fn evolve(state: ConnectionState, signal: DriverSignal) -> (ConnectionState, Vec<LifecycleEvent>) {
    use ConnectionState as S;
    use DriverSignal as D;
    use LifecycleEvent as E;

    match (state, signal) {
        (S::Connecting, D::TopologyAvailable) => {
            (S::Open, vec![E::Connected, E::Open])
        }
        (S::Open, D::TopologyUnavailable) => (S::Disconnected, vec![E::Disconnected]),
        (S::Disconnected, D::TopologyAvailable) => (S::Open, vec![E::Reconnected]),
        (S::Connecting | S::Open | S::Disconnected, D::ShutdownStarted) => {
            (S::Disconnecting, vec![E::Disconnecting])
        }
        (S::Disconnecting | S::Open, D::TopologyClosed) => (S::Closed, vec![E::Disconnected]),
        (S::Connecting | S::Disconnected, D::TopologyClosed) => (S::Closed, vec![]),
        (state, _) => (state, vec![]),
    }
}

/// Shared observer fed by driver callbacks; emits one log line per lifecycle event.
#[derive(Clone)]
pub struct LifecycleTracker {
    database_name: Arc<str>,
    state: Arc<Mutex<ConnectionState>>,
}

impl LifecycleTracker {
    pub fn new(database_name: impl Into<Arc<str>>) -> Self {
        Self {
            database_name: database_name.into(),
            state: Arc::new(Mutex::new(ConnectionState::Connecting)),
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn state(&self) -> ConnectionState {
        *self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn signal(&self, signal: DriverSignal) -> Vec<LifecycleEvent> {
        let mut guard = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let (next, events) = evolve(*guard, signal);
        *guard = next;
        drop(guard);

        for event in &events {
            tracing::info!(target: LIFECYCLE_TARGET, "{}", event.describe(&self.database_name));
        }
        events
    }
}

/// Database name as logged: the final `/`-delimited segment of the URI.
pub fn database_name_from_uri(uri: &str) -> String {
    uri.rsplit('/').next().unwrap_or_default().to_string()
}
