//! Orchestrator State
//!
//! Every flag the engine consults between notifications lives here, owned by
//! exactly one [`SyncEngine`](crate::engine::SyncEngine). Transitions are plain
//! methods so they can be exercised without a file system, a watcher or a
//! terminal.

/// Coarse state of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// A cycle holds the action lock.
    ActionInProgress,
    /// The manifest declares edits still in progress; nothing is processed
    /// until a later read shows otherwise.
    EditingGateOpen,
}

/// What to do with one change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationDecision {
    /// The notification was caused by the engine's own manifest write.
    ConsumedSelfWrite,
    /// A cycle is running; it will re-evaluate once it finishes.
    Deferred,
    /// Start a cycle.
    Evaluate,
}

#[derive(Debug, Default, Clone)]
pub struct EngineState {
    locked: bool,
    gate_open: bool,
    reevaluate_after_completion: bool,
    reevaluate_after_decline: bool,
    decline_retry: bool,
    ignore_next_change: bool,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.locked {
            Phase::ActionInProgress
        } else if self.gate_open {
            Phase::EditingGateOpen
        } else {
            Phase::Idle
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn reevaluate_after_completion(&self) -> bool {
        self.reevaluate_after_completion
    }

    pub fn reevaluate_after_decline(&self) -> bool {
        self.reevaluate_after_decline
    }

    pub fn ignoring_next_change(&self) -> bool {
        self.ignore_next_change
    }

    /// Route one notification. The self-write flag is consulted before the
    /// lock, so the engine's own write is consumed even mid-cycle.
    pub fn on_notification(&mut self) -> NotificationDecision {
        if self.ignore_next_change {
            self.ignore_next_change = false;
            tracing::debug!("consumed notification for own manifest write");
            return NotificationDecision::ConsumedSelfWrite;
        }
        if self.locked {
            self.reevaluate_after_completion = true;
            tracing::info!(
                "Action already in progress. Change will be processed after it completes."
            );
            return NotificationDecision::Deferred;
        }
        // a fresh outside change earns a fresh decline retry
        self.reevaluate_after_decline = false;
        NotificationDecision::Evaluate
    }

    pub fn begin_cycle(&mut self) {
        debug_assert!(!self.locked, "cycle started while another holds the lock");
        self.locked = true;
        tracing::debug!("action lock taken");
    }

    pub fn open_editing_gate(&mut self) {
        if !self.gate_open {
            tracing::debug!("editing gate opened");
        }
        self.gate_open = true;
    }

    pub fn close_editing_gate(&mut self) {
        if self.gate_open {
            tracing::debug!("editing gate closed");
        }
        self.gate_open = false;
    }

    /// The next notification is the engine's own manifest write.
    pub fn expect_self_write(&mut self) {
        self.ignore_next_change = true;
    }

    /// Drop a pending self-write expectation after a failed write.
    pub fn cancel_self_write(&mut self) {
        self.ignore_next_change = false;
    }

    /// The user declined a batch. Returns `true` when a single immediate
    /// re-evaluation was scheduled, `false` when one already ran for this
    /// decline streak.
    pub fn record_decline(&mut self) -> bool {
        if self.reevaluate_after_decline {
            return false;
        }
        self.reevaluate_after_decline = true;
        self.decline_retry = true;
        true
    }

    /// Release the lock. Returns `true` when another cycle must start now.
    pub fn finish_cycle(&mut self) -> bool {
        self.locked = false;
        tracing::debug!("action lock released");
        let external = std::mem::take(&mut self.reevaluate_after_completion);
        let retry = std::mem::take(&mut self.decline_retry);
        if external {
            self.reevaluate_after_decline = false;
        }
        external || retry
    }
}
