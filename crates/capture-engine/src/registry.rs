//! Process-wide session registry.
//!
//! An explicitly owned object rather than ambient statics: whoever drives
//! the engine holds one registry and injects it where needed. It owns at
//! most one video and one audio session, the accumulated track-offset map
//! for the current recording cycle, and the cycle clock the offsets are
//! measured against.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use deskrec_common::clock::RecordingClock;
use deskrec_common::config::EncoderConfig;
use deskrec_common::error::{RecordError, RecordResult};
use deskrec_merge_engine::MergeReport;

use crate::devices;
use crate::session::{lock, CaptureSession, SessionKind, SessionState};

/// Owner of the active capture sessions and the current cycle's track map.
pub struct SessionRegistry {
    encoder: EncoderConfig,
    video: Mutex<Option<CaptureSession>>,
    audio: Mutex<Option<CaptureSession>>,
    tracks: Mutex<BTreeMap<PathBuf, u64>>,
    cycle_clock: Mutex<Option<RecordingClock>>,
}

impl SessionRegistry {
    pub fn new(encoder: EncoderConfig) -> Self {
        Self {
            encoder,
            video: Mutex::new(None),
            audio: Mutex::new(None),
            tracks: Mutex::new(BTreeMap::new()),
            cycle_clock: Mutex::new(None),
        }
    }

    /// The encoder settings this registry spawns sessions with.
    pub fn encoder(&self) -> &EncoderConfig {
        &self.encoder
    }

    /// Enumerate microphone devices via the encoder's listing mode.
    pub fn list_microphones(&self) -> Vec<String> {
        devices::list_microphones(&self.encoder)
    }

    /// Start the screen + system-audio capture and open a new recording
    /// cycle. Rejected while a video session is still active.
    pub fn start_video_capture(&self, output: &Path) -> RecordResult<()> {
        let mut slot = lock(&self.video);
        if slot.as_ref().is_some_and(|s| s.state().is_active()) {
            return Err(RecordError::session(
                "a video capture session is already active",
            ));
        }

        let session = CaptureSession::start(SessionKind::Video, output, None, &self.encoder);
        *lock(&self.cycle_clock) = Some(RecordingClock::start());
        *slot = Some(session);
        Ok(())
    }

    /// Start a microphone capture and record its offset against the cycle
    /// clock. Rejected while an audio session is still active.
    pub fn start_audio_capture(&self, output: &Path, device: &str) -> RecordResult<()> {
        if device.trim().is_empty() {
            return Err(RecordError::device_unavailable(
                "no microphone device selected",
            ));
        }

        let mut slot = lock(&self.audio);
        if slot.as_ref().is_some_and(|s| s.state().is_active()) {
            return Err(RecordError::session(
                "an audio capture session is already active",
            ));
        }

        let offset_millis = match lock(&self.cycle_clock).as_ref() {
            Some(clock) => clock.elapsed_millis(),
            None => {
                tracing::warn!(
                    output = %output.display(),
                    "Audio capture started outside a video cycle; offset recorded as 0"
                );
                0
            }
        };

        let session = CaptureSession::start(SessionKind::Audio, output, Some(device), &self.encoder);
        *slot = Some(session);
        lock(&self.tracks).insert(output.to_path_buf(), offset_millis);
        tracing::info!(
            output = %output.display(),
            offset_millis,
            "Registered audio track for this cycle"
        );
        Ok(())
    }

    /// Signal the video session to stop. A stop with no active session is a
    /// logged no-op, never an error.
    pub fn stop_video_capture(&self) {
        Self::stop(&self.video, SessionKind::Video);
    }

    /// Signal the audio session to stop. Same no-op contract as video.
    pub fn stop_audio_capture(&self) {
        Self::stop(&self.audio, SessionKind::Audio);
    }

    fn stop(slot: &Mutex<Option<CaptureSession>>, kind: SessionKind) {
        match lock(slot).as_ref() {
            Some(session) if session.state().is_active() => session.request_stop(),
            _ => {
                tracing::info!(
                    kind = kind.as_str(),
                    "Stop requested with no active session"
                );
            }
        }
    }

    /// State of the video session, if one exists this cycle.
    pub fn video_state(&self) -> Option<SessionState> {
        lock(&self.video).as_ref().map(|s| s.state())
    }

    /// State of the audio session, if one exists this cycle.
    pub fn audio_state(&self) -> Option<SessionState> {
        lock(&self.audio).as_ref().map(|s| s.state())
    }

    /// The track-offset map accumulated so far in this cycle.
    pub fn tracks(&self) -> BTreeMap<PathBuf, u64> {
        lock(&self.tracks).clone()
    }

    /// Await the watcher tasks of both sessions (state polling remains the
    /// contractual completion signal; this is a convenience for callers that
    /// want to block until post-processing ends).
    pub async fn wait_for_completion(&self) {
        let video = lock(&self.video).as_mut().and_then(|s| s.take_watcher());
        let audio = lock(&self.audio).as_mut().and_then(|s| s.take_watcher());
        if let Some(handle) = audio {
            let _ = handle.await;
        }
        if let Some(handle) = video {
            let _ = handle.await;
        }
    }

    /// Merge the cycle's tracks into `video_path`, writing `output`.
    ///
    /// The track map is cleared when the merge completes, successfully or
    /// not, which ends the recording cycle.
    pub async fn merge_tracks(
        &self,
        video_path: &Path,
        output: &Path,
    ) -> RecordResult<MergeReport> {
        let tracks = lock(&self.tracks).clone();
        let result =
            deskrec_merge_engine::merge_tracks(video_path, output, &tracks, &self.encoder).await;

        lock(&self.tracks).clear();
        *lock(&self.cycle_clock) = None;
        result
    }
}
