use std::fmt;

/// Lifecycle of a distributor's dispatch loop.
///
/// Transitions are one-way: `Idle -> Running -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum State {
    /// Created, loop not started yet. Enqueued messages wait in the channels.
    #[default]
    Idle,
    /// Loop is consuming events and (un)registrations.
    Running,
    /// Loop has exited and closed its channels.
    Stopped,
}

impl State {
    pub fn is_running(&self) -> bool {
        matches!(self, State::Running)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, State::Stopped)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Idle => write!(f, "Idle"),
            State::Running => write!(f, "Running"),
            State::Stopped => write!(f, "Stopped"),
        }
    }
}
