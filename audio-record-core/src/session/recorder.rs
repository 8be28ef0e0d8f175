use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::models::config::RecorderSettings;
use crate::models::error::RecorderError;
use crate::models::events::{RecorderEvent, StopSummary};
use crate::models::recording_result::EncodedAudio;
use crate::models::state::{RecordingState, StopReason, WaitStart};
use crate::models::upload_models::UploadOutcome;
use crate::playback::controller::PlaybackController;
use crate::session::recording::RecordingSession;
use crate::session::wait::WaitThenRecord;
use crate::storage::export;
use crate::traits::capture_delegate::{PlaybackDelegate, RecorderDelegate};
use crate::traits::capture_provider::CaptureProvider;
use crate::traits::clock::Clock;
use crate::traits::frame_encoder::Mp3EncoderFactory;
use crate::traits::media_backend::MediaBackend;
use crate::traits::upload_transport::UploadTransport;
use crate::upload::coordinator::UploadCoordinator;

/// Sits between the session and the caller's delegate. Drops the playable
/// copy of the previous recording as soon as a new one starts.
struct EventRouter<M: MediaBackend> {
    player: Weak<Mutex<PlaybackController<M>>>,
    user: RwLock<Option<Arc<dyn RecorderDelegate>>>,
}

impl<M: MediaBackend> RecorderDelegate for EventRouter<M> {
    fn on_event(&self, event: &RecorderEvent) {
        if let RecorderEvent::StateChanged(RecordingState::Starting) = event {
            if let Some(player) = self.player.upgrade() {
                let mut player = player.lock();
                player.stop();
                player.unload();
            }
        }
        let user = self.user.read().clone();
        if let Some(d) = user {
            d.on_event(event);
        }
    }
}

/// One recorder per page: countdown, recording session, playback and upload.
///
/// ```text
/// start_wait() ──(expiry)──┐
/// start_recording() ───────┴→ RecordingSession ─→ ensure_encoded() ─┬→ PlaybackController
///                                                                    ├→ UploadCoordinator
///                                                                    └→ save_recording()
/// ```
pub struct Recorder<P, M, T>
where
    P: CaptureProvider + 'static,
    M: MediaBackend + 'static,
    T: UploadTransport,
{
    settings: RecorderSettings,
    session: RecordingSession<P>,
    wait: WaitThenRecord<P>,
    player: Arc<Mutex<PlaybackController<M>>>,
    router: Arc<EventRouter<M>>,
    uploads: UploadCoordinator<T>,
}

impl<P, M, T> Recorder<P, M, T>
where
    P: CaptureProvider + 'static,
    M: MediaBackend + 'static,
    T: UploadTransport,
{
    pub fn new(
        settings: RecorderSettings,
        capture: P,
        media: M,
        transport: T,
        encoder: Arc<dyn Mp3EncoderFactory>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RecorderError> {
        settings.validate()?;

        let session = RecordingSession::new(capture, encoder, clock, settings.recorder.clone());
        let wait = WaitThenRecord::new(session.clone());
        let player = Arc::new(Mutex::new(PlaybackController::new(media)));
        let router = Arc::new(EventRouter {
            player: Arc::downgrade(&player),
            user: RwLock::new(None),
        });
        session.set_delegate(router.clone());
        let uploads = UploadCoordinator::new(transport, settings.upload.clone());

        log::info!(
            "recorder ready: {} profile, {} kbps, record {:.0}s, wait {:.0}s",
            settings.recorder.profile.as_str(),
            settings.recorder.bitrate_kbps(),
            settings.recorder.record_secs(),
            settings.recorder.wait_secs()
        );
        Ok(Self {
            settings,
            session,
            wait,
            player,
            router,
            uploads,
        })
    }

    pub fn set_delegate(&self, delegate: Arc<dyn RecorderDelegate>) {
        *self.router.user.write() = Some(delegate);
    }

    pub fn set_playback_delegate(&self, delegate: Arc<dyn PlaybackDelegate>) {
        self.player.lock().set_delegate(delegate);
    }

    pub fn settings(&self) -> &RecorderSettings {
        &self.settings
    }

    pub fn session(&self) -> &RecordingSession<P> {
        &self.session
    }

    pub fn wait(&self) -> &WaitThenRecord<P> {
        &self.wait
    }

    pub fn uploads(&self) -> &UploadCoordinator<T> {
        &self.uploads
    }

    /// Exclusive access to the playback controller.
    pub fn playback(&self) -> MutexGuard<'_, PlaybackController<M>> {
        self.player.lock()
    }

    pub fn state(&self) -> RecordingState {
        self.session.state()
    }

    pub fn is_waiting(&self) -> bool {
        self.wait.is_waiting()
    }

    /// Start recording for the configured length. Refused while waiting.
    pub fn start_recording(&self) -> Result<(), RecorderError> {
        self.wait.start_recording(self.wait.record_secs())
    }

    pub fn start_recording_for(&self, secs: f64) -> Result<(), RecorderError> {
        self.wait.start_recording(secs)
    }

    /// Start the configured countdown; recording begins when it expires.
    pub fn start_wait(&self) -> WaitStart {
        self.wait.start_wait(self.settings.recorder.wait_secs())
    }

    pub fn stop_recording(&self) -> Option<StopSummary> {
        self.session.stop(StopReason::User)
    }

    pub fn encoded(&self) -> Result<EncodedAudio, RecorderError> {
        self.session.ensure_encoded()
    }

    /// Encode the last recording (once) and load it for playback. Returns its
    /// duration.
    pub fn prepare_playback(&self) -> Result<f64, RecorderError> {
        let audio = self.session.ensure_encoded()?;
        self.player.lock().load(&audio)
    }

    /// Base64 of the encoded recording, as sent by the inline upload.
    pub fn encoded_base64(&self) -> Result<String, RecorderError> {
        Ok(self.session.ensure_encoded()?.to_base64())
    }

    pub fn save_recording(&self, dir: &Path) -> Result<PathBuf, RecorderError> {
        let audio = self.session.ensure_encoded()?;
        export::save_recording(&audio, dir, &self.settings.upload.file_prefix, self.settings.recorder.profile)
    }

    pub async fn upload_presigned(&self) -> Result<UploadOutcome, RecorderError> {
        let (attempt, audio) = self.upload_input()?;
        self.uploads.upload_presigned(attempt, audio).await
    }

    pub async fn upload_inline(&self) -> Result<UploadOutcome, RecorderError> {
        let (attempt, audio) = self.upload_input()?;
        self.uploads.upload_inline(attempt, audio).await
    }

    /// Attempt number plus the encoded blob, if there is one. An empty
    /// recording is left for the coordinator to refuse.
    fn upload_input(&self) -> Result<(u64, Option<EncodedAudio>), RecorderError> {
        let attempt = self.session.attempt();
        if attempt == 0 {
            return Ok((0, None));
        }
        match self.session.ensure_encoded() {
            Ok(audio) => Ok((attempt, Some(audio))),
            Err(RecorderError::NoAudioCaptured) => Ok((attempt, None)),
            Err(e) => Err(e),
        }
    }
}
