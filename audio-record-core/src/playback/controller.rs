use std::sync::Arc;

use crate::models::error::RecorderError;
use crate::models::events::PlaybackEvent;
use crate::models::recording_result::EncodedAudio;
use crate::traits::capture_delegate::PlaybackDelegate;
use crate::traits::media_backend::{MediaBackend, SourceHandle};

/// Play/pause/seek over a single media element holding the last recording.
///
/// Every loaded blob gets its own source handle; loading another blob or
/// unloading revokes the previous one.
pub struct PlaybackController<M: MediaBackend> {
    media: M,
    source: Option<SourceHandle>,
    duration_secs: f64,
    playing: bool,
    ended_reported: bool,
    delegate: Option<Arc<dyn PlaybackDelegate>>,
}

impl<M: MediaBackend> PlaybackController<M> {
    pub fn new(media: M) -> Self {
        Self {
            media,
            source: None,
            duration_secs: 0.0,
            playing: false,
            ended_reported: false,
            delegate: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn PlaybackDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn current_time(&self) -> f64 {
        self.media.current_time()
    }

    /// Replace whatever is loaded with `audio`. Returns its duration.
    pub fn load(&mut self, audio: &EncodedAudio) -> Result<f64, RecorderError> {
        self.unload();

        let handle = self
            .media
            .create_source(audio)
            .map_err(RecorderError::PlaybackFailed)?;
        match self.media.load(&handle) {
            Ok(duration) => {
                log::debug!("loaded {} ({} bytes, {:.2}s)", handle.0, audio.len(), duration);
                self.source = Some(handle);
                self.duration_secs = duration;
                self.ended_reported = false;
                Ok(duration)
            }
            Err(e) => {
                self.media.revoke_source(&handle);
                log::warn!("failed to load recording for playback: {}", e);
                Err(RecorderError::PlaybackFailed(e))
            }
        }
    }

    /// Detach and revoke the loaded source, if any.
    pub fn unload(&mut self) {
        if let Some(handle) = self.source.take() {
            self.media.pause();
            self.media.clear();
            self.media.revoke_source(&handle);
            log::debug!("revoked {}", handle.0);
        }
        self.playing = false;
        self.duration_secs = 0.0;
    }

    /// Seek to `at_secs` when given, then start playback.
    pub fn play(&mut self, at_secs: Option<f64>) -> Result<(), RecorderError> {
        if self.source.is_none() {
            return Err(RecorderError::PlaybackFailed("nothing loaded".into()));
        }
        if let Some(at) = at_secs {
            self.seek(at);
        }

        self.playing = true;
        if let Err(e) = self.media.play() {
            self.playing = false;
            log::warn!("playback refused: {}", e);
            return Err(RecorderError::PlaybackFailed(e));
        }
        self.ended_reported = false;
        self.emit_time();
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), RecorderError> {
        self.play(None)
    }

    pub fn pause(&mut self) {
        let was_playing = self.playing;
        self.media.pause();
        self.playing = false;
        // Only a mid-playback pause is reported.
        if was_playing && self.media.current_time() > 0.0 && !self.media.is_ended() {
            self.emit(PlaybackEvent::Paused);
        }
    }

    /// Pause and rewind to the start.
    pub fn stop(&mut self) {
        if self.source.is_none() {
            return;
        }
        self.media.pause();
        self.media.set_current_time(0.0);
        self.playing = false;
        self.emit(PlaybackEvent::Ended);
    }

    pub fn seek(&mut self, secs: f64) {
        let mut target = if secs.is_nan() { 0.0 } else { secs.max(0.0) };
        if self.duration_secs > 0.0 {
            target = target.min(self.duration_secs);
        }
        self.media.set_current_time(target);
        self.emit_time();
    }

    /// Drive from the host's playback tick.
    pub fn tick(&mut self) {
        if !self.playing {
            return;
        }
        if self.media.is_ended() {
            self.playing = false;
            if !self.ended_reported {
                self.ended_reported = true;
                self.emit(PlaybackEvent::Ended);
            }
            return;
        }
        self.emit_time();
    }

    fn emit_time(&self) {
        self.emit(PlaybackEvent::Time {
            current_secs: self.media.current_time(),
            duration_secs: self.duration_secs,
        });
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_event(&event);
        }
    }
}
