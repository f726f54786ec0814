use serde::{Deserialize, Serialize};

/// Why the capture loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The end-user submitted a line on the trigger input.
    UserRequest,
    /// An OS termination/interrupt signal was received.
    Signal,
}

/// Shutdown coordinator state machine.
///
/// State transitions:
/// ```text
/// capturing → stopping_clean  ─┐
///     ↓                        ├→ done
///  stopping_signal ────────────┘
/// ```
///
/// Both stopping states run the same teardown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Capturing,
    StoppingClean,
    StoppingSignal,
    Done,
}

impl CoordinatorState {
    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing)
    }

    pub fn is_stopping(&self) -> bool {
        matches!(self, Self::StoppingClean | Self::StoppingSignal)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// The stop reason implied by a stopping state.
    pub fn stop_reason(&self) -> Option<StopReason> {
        match self {
            Self::StoppingClean => Some(StopReason::UserRequest),
            Self::StoppingSignal => Some(StopReason::Signal),
            _ => None,
        }
    }
}

impl From<StopReason> for CoordinatorState {
    fn from(reason: StopReason) -> Self {
        match reason {
            StopReason::UserRequest => Self::StoppingClean,
            StopReason::Signal => Self::StoppingSignal,
        }
    }
}
