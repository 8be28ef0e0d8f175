use super::error::RecorderError;
use super::state::{RecordingState, StopReason};

/// Elapsed/target pair reported while recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordingProgress {
    /// May exceed `target_secs` briefly before the stop boundary is enforced.
    pub elapsed_secs: f64,
    pub target_secs: f64,
}

impl RecordingProgress {
    /// Elapsed time clamped to the target, for sliders and labels.
    pub fn display_elapsed(&self) -> f64 {
        self.elapsed_secs.min(self.target_secs).max(0.0)
    }
}

/// Emitted once per stopped recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopSummary {
    pub reason: StopReason,
    pub sample_count: usize,
    pub chunk_count: usize,
    pub elapsed_secs: f64,
}

/// Notifications from the recording session and the wait controller.
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    StateChanged(RecordingState),
    Progress(RecordingProgress),
    Stopped(StopSummary),
    Error(RecorderError),
    WaitStarted { target_secs: f64 },
    WaitProgress { elapsed_secs: f64, target_secs: f64 },
    WaitExpired { target_secs: f64 },
}

/// Notifications from the playback controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    Time { current_secs: f64, duration_secs: f64 },
    Paused,
    Ended,
}
