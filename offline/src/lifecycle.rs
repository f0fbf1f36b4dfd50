//! Worker Lifecycle
//!
//! State machine for the offline worker plus the lifecycle events it emits.
//!
//! ```text
//! Parsed ─► Installing ─► Installed ─► Activating ─► Activated
//!               │                          │             │
//!               └──────────► Redundant ◄───┴─────────────┘
//! ```

use crate::error::LifecycleError;

/// Worker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerState {
    /// Script evaluated, not yet installing.
    #[default]
    Parsed,
    /// Pre-caching the static asset set.
    Installing,
    /// Installed and waiting to take over.
    Installed,
    /// Evicting stale cache generations.
    Activating,
    /// Controlling clients and handling fetch/sync events.
    Activated,
    /// Superseded or failed.
    Redundant,
}

impl WorkerState {
    /// Whether the worker handles fetch and sync events in this state.
    pub fn is_active(self) -> bool {
        self == WorkerState::Activated
    }
}

/// Observable steps of the worker lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Any accepted transition
    StateChange { from: WorkerState, to: WorkerState },
    /// Entered `Installing`
    Install,
    /// Entered `Activating`
    Activate,
    /// Asked the platform to skip the waiting phase
    SkipWaiting,
    /// Took control of open clients
    ControllerChange,
}

type Listener = Box<dyn Fn(&LifecycleEvent) + Send + Sync>;

/// Tracks worker state and dispatches lifecycle events.
pub struct LifecycleManager {
    state: WorkerState,
    skip_waiting: bool,
    /// Events dispatched since the last `clear_pending`
    pending_events: Vec<LifecycleEvent>,
    listeners: Vec<Listener>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        Self {
            state: WorkerState::Parsed,
            skip_waiting: false,
            pending_events: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Whether `skip_waiting` was requested during this lifecycle.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting
    }

    /// Called synchronously for every event, in registration order.
    pub fn add_listener(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    fn dispatch(&mut self, event: LifecycleEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
        self.pending_events.push(event);
    }

    pub fn pending_events(&self) -> &[LifecycleEvent] {
        &self.pending_events
    }

    pub fn clear_pending(&mut self) {
        self.pending_events.clear();
    }

    /// Move to `to`, dispatching `StateChange` and, for `Installing` and
    /// `Activating`, the matching `Install`/`Activate` event.
    pub fn transition(&mut self, to: WorkerState) -> Result<(), LifecycleError> {
        let from = self.state;
        if !is_valid_transition(from, to) {
            return Err(LifecycleError::InvalidTransition { from, to });
        }

        self.state = to;
        log::debug!("[SW] {:?} -> {:?}", from, to);
        self.dispatch(LifecycleEvent::StateChange { from, to });

        match to {
            WorkerState::Installing => self.dispatch(LifecycleEvent::Install),
            WorkerState::Activating => self.dispatch(LifecycleEvent::Activate),
            _ => {}
        }
        Ok(())
    }

    /// Record that the worker wants to activate without waiting for old
    /// clients to close. Only meaningful before activation.
    pub fn skip_waiting(&mut self) -> Result<(), LifecycleError> {
        if !matches!(self.state, WorkerState::Installing | WorkerState::Installed) {
            return Err(LifecycleError::InvalidTransition {
                from: self.state,
                to: WorkerState::Activating,
            });
        }
        if !self.skip_waiting {
            self.skip_waiting = true;
            self.dispatch(LifecycleEvent::SkipWaiting);
        }
        Ok(())
    }

    /// Take control of all pages in scope.
    pub fn claim(&mut self) -> Result<(), LifecycleError> {
        if self.state != WorkerState::Activated {
            return Err(LifecycleError::NotActivated(self.state));
        }
        self.dispatch(LifecycleEvent::ControllerChange);
        Ok(())
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

fn is_valid_transition(from: WorkerState, to: WorkerState) -> bool {
    use WorkerState::*;

    matches!(
        (from, to),
        (Parsed, Installing)
            | (Installing, Installed)
            | (Installing, Redundant)
            | (Installed, Activating)
            | (Installed, Redundant)
            | (Activating, Activated)
            | (Activating, Redundant)
            | (Activated, Redundant)
    )
}
