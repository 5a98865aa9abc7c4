//! # Shutdown coordinator state machine.
//!
//! ```text
//!             first signal                  pending == 0 && poller parked
//!  Running ───────────────► Draining ─────────────────────────────► Terminated(Drained)
//!                              │  kill timer fires
//!                              ├─────────────────────────────────► Terminated(KillTimerExpired)
//!                              │  second signal → Forcing
//!                              └──► force grace elapses ─────────► Terminated(Forced)
//! ```
//!
//! A runtime that never listens stays `Running`. `Terminated` is final; any
//! input after it is ignored. This module is timer-free: the listener owns the
//! timers and feeds their expiry in here.

/// How a listener's run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// All in-flight handlers finished.
    Drained,
    /// The drain window elapsed first; remaining handlers were abandoned.
    KillTimerExpired,
    /// A second signal forced termination; remaining handlers were abandoned.
    Forced,
}

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShutdownState {
    Running,
    Draining {
        /// A second signal arrived; the force grace timer is armed and the kill timer disarmed.
        forcing: bool,
    },
    Terminated(ShutdownOutcome),
}

/// What the listener must do after a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SignalAction {
    /// Stop intake, arm the kill timer.
    BeginDrain,
    /// Disarm the kill timer, arm the force grace timer.
    ScheduleForce,
    Ignore,
}

#[derive(Debug)]
pub(crate) struct ShutdownMachine {
    state: ShutdownState,
}

impl ShutdownMachine {
    pub(crate) fn new() -> Self {
        Self {
            state: ShutdownState::Running,
        }
    }

    #[cfg(test)]
    fn state(&self) -> ShutdownState {
        self.state
    }

    pub(crate) fn is_draining(&self) -> bool {
        matches!(self.state, ShutdownState::Draining { .. })
    }

    pub(crate) fn on_signal(&mut self) -> SignalAction {
        match self.state {
            ShutdownState::Running => {
                self.state = ShutdownState::Draining { forcing: false };
                SignalAction::BeginDrain
            }
            ShutdownState::Draining { forcing: false } => {
                self.state = ShutdownState::Draining { forcing: true };
                SignalAction::ScheduleForce
            }
            ShutdownState::Draining { forcing: true } | ShutdownState::Terminated(_) => {
                SignalAction::Ignore
            }
        }
    }

    /// Pending count reached zero with intake stopped.
    pub(crate) fn on_idle(&mut self) -> Option<ShutdownOutcome> {
        self.terminate_if(|_| true, ShutdownOutcome::Drained)
    }

    pub(crate) fn on_kill_timer(&mut self) -> Option<ShutdownOutcome> {
        self.terminate_if(|forcing| !forcing, ShutdownOutcome::KillTimerExpired)
    }

    pub(crate) fn on_force_timer(&mut self) -> Option<ShutdownOutcome> {
        self.terminate_if(|forcing| forcing, ShutdownOutcome::Forced)
    }

    fn terminate_if(
        &mut self,
        when: impl FnOnce(bool) -> bool,
        outcome: ShutdownOutcome,
    ) -> Option<ShutdownOutcome> {
        match self.state {
            ShutdownState::Draining { forcing } if when(forcing) => {
                self.state = ShutdownState::Terminated(outcome);
                Some(outcome)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_signal_begins_drain() {
        let mut m = ShutdownMachine::new();
        assert_eq!(m.on_signal(), SignalAction::BeginDrain);
        assert_eq!(m.state(), ShutdownState::Draining { forcing: false });
        assert!(m.is_draining());
    }

    #[test]
    fn idle_while_running_does_nothing() {
        let mut m = ShutdownMachine::new();
        assert_eq!(m.on_idle(), None);
        assert_eq!(m.on_kill_timer(), None);
        assert_eq!(m.state(), ShutdownState::Running);
    }

    #[test]
    fn drain_completes_on_idle() {
        let mut m = ShutdownMachine::new();
        m.on_signal();
        assert_eq!(m.on_idle(), Some(ShutdownOutcome::Drained));
        assert_eq!(m.state(), ShutdownState::Terminated(ShutdownOutcome::Drained));
    }

    #[test]
    fn kill_timer_terminates_drain() {
        let mut m = ShutdownMachine::new();
        m.on_signal();
        assert_eq!(m.on_kill_timer(), Some(ShutdownOutcome::KillTimerExpired));
        assert_eq!(m.on_idle(), None);
    }

    #[test]
    fn second_signal_overrides_kill_timer() {
        let mut m = ShutdownMachine::new();
        m.on_signal();
        assert_eq!(m.on_signal(), SignalAction::ScheduleForce);
        assert_eq!(m.on_kill_timer(), None);
        assert_eq!(m.on_force_timer(), Some(ShutdownOutcome::Forced));
    }

    #[test]
    fn drain_can_still_finish_during_force_grace() {
        let mut m = ShutdownMachine::new();
        m.on_signal();
        m.on_signal();
        assert_eq!(m.on_idle(), Some(ShutdownOutcome::Drained));
        assert_eq!(m.on_force_timer(), None);
    }

    #[test]
    fn terminated_is_final() {
        let mut m = ShutdownMachine::new();
        m.on_signal();
        m.on_idle();
        assert_eq!(m.on_signal(), SignalAction::Ignore);
        assert_eq!(m.state(), ShutdownState::Terminated(ShutdownOutcome::Drained));
    }
}
