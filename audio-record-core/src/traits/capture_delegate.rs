use crate::models::events::{PlaybackEvent, RecorderEvent};

/// Subscriber for recording session and countdown notifications.
///
/// Called from whichever thread drove the transition: the caller, the capture
/// callback thread, or the clock's timer thread. Implementations should
/// marshal to a UI thread if needed and must not call back into the session
/// synchronously.
pub trait RecorderDelegate: Send + Sync {
    fn on_event(&self, event: &RecorderEvent);
}

impl<F> RecorderDelegate for F
where
    F: Fn(&RecorderEvent) + Send + Sync,
{
    fn on_event(&self, event: &RecorderEvent) {
        self(event)
    }
}

/// Subscriber for playback notifications.
pub trait PlaybackDelegate: Send + Sync {
    fn on_event(&self, event: &PlaybackEvent);
}

impl<F> PlaybackDelegate for F
where
    F: Fn(&PlaybackEvent) + Send + Sync,
{
    fn on_event(&self, event: &PlaybackEvent) {
        self(event)
    }
}
