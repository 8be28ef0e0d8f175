use std::fmt;

use serde::{Deserialize, Serialize};

/// Recording session state machine.
///
/// State transitions:
/// ```text
/// idle → starting → recording → stopping → idle
///           ↓
///          idle (capture unavailable)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordingState {
    Idle,
    Starting,
    Recording { elapsed_secs: f64, target_secs: f64 },
    Stopping,
}

impl RecordingState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }

    /// Returns the elapsed time if the session is recording.
    pub fn elapsed(&self) -> Option<f64> {
        match self {
            Self::Recording { elapsed_secs, .. } => Some(*elapsed_secs),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Recording { .. } => "recording",
            Self::Stopping => "stopping",
        }
    }
}

/// Why a recording stopped. Observability only: every reason runs the same
/// teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    User,
    Timer,
    AutoStop,
    PreWait,
    Error,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Timer => "timer",
            Self::AutoStop => "auto-stop",
            Self::PreWait => "pre-wait",
            Self::Error => "error",
        }
    }

    /// True for the two reasons produced by the duration boundary.
    pub fn is_automatic(&self) -> bool {
        matches!(self, Self::Timer | Self::AutoStop)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of `WaitThenRecord::start_wait`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaitStart {
    Started { target_secs: f64 },
    AlreadyWaiting,
}
