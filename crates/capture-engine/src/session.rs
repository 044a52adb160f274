//! Capture session management.
//!
//! A session owns one running encoder subprocess. The subprocess is spawned
//! synchronously; everything after that happens on detached tasks: a watcher
//! awaits process exit and drives the state machine (including segment
//! reassembly on clean exit), and a stop request spawns a fire-and-forget
//! task that delivers the graceful-quit byte on the subprocess's stdin.
//!
//! Only the watcher task moves a session into a terminal state. Callers
//! observe completion by polling [`CaptureSession::state`].

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, Command};
use tokio::task::JoinHandle;

use deskrec_common::config::EncoderConfig;

use crate::command::{self, SegmentPlan};
use crate::reassemble;

/// Single byte that asks the encoder for a graceful shutdown.
const GRACEFUL_QUIT: &[u8] = b"q";

/// What a session is capturing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Screen plus system audio, segmented.
    Video,
    /// A single microphone device, unsegmented.
    Audio,
}

impl SessionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Video => "video",
            SessionKind::Audio => "audio",
        }
    }
}

/// Why a session ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The subprocess could not be spawned.
    Launch,
    /// The subprocess exited nonzero during capture.
    Encoding,
    /// The capture succeeded but the concatenation pass failed.
    Reassembly,
}

/// Lifecycle state of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No capture in progress (also the terminal success state).
    Idle,
    /// start() accepted, subprocess not yet spawned.
    Starting,
    /// Subprocess running.
    Recording,
    /// Stop signal sent, subprocess still running.
    Stopping,
    /// Subprocess exited cleanly; shard reassembly in progress.
    Finalizing,
    /// Terminal for this attempt; reported, never retried automatically.
    Failed(FailureReason),
}

impl SessionState {
    /// Whether the session still owns a live subprocess or pending work.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionState::Starting
                | SessionState::Recording
                | SessionState::Stopping
                | SessionState::Finalizing
        )
    }
}

/// One running instance of the external encoder plus its watcher task.
pub struct CaptureSession {
    kind: SessionKind,
    output_path: PathBuf,
    state: Arc<Mutex<SessionState>>,
    stdin: Arc<Mutex<Option<ChildStdin>>>,
    watcher: Option<JoinHandle<()>>,
}

impl CaptureSession {
    /// Spawn the capture subprocess and its watcher; returns immediately.
    ///
    /// A spawn failure does not surface as an error: the session comes back
    /// in `Failed(Launch)` and the cause is logged.
    pub fn start(
        kind: SessionKind,
        output_path: &Path,
        device: Option<&str>,
        encoder: &EncoderConfig,
    ) -> Self {
        let state = Arc::new(Mutex::new(SessionState::Starting));
        let stdin = Arc::new(Mutex::new(None));

        let (args, segment) = match kind {
            SessionKind::Video => {
                let plan = SegmentPlan::for_output(output_path);
                (command::screen_capture_args(encoder, &plan), Some(plan))
            }
            SessionKind::Audio => (
                command::microphone_capture_args(encoder, device.unwrap_or_default(), output_path),
                None,
            ),
        };

        tracing::info!(
            kind = kind.as_str(),
            output = %output_path.display(),
            "Starting capture session"
        );
        tracing::debug!(binary = %encoder.binary, ?args, "Encoder command");

        let mut session = Self {
            kind,
            output_path: output_path.to_path_buf(),
            state: state.clone(),
            stdin: stdin.clone(),
            watcher: None,
        };

        let mut cmd = Command::new(&encoder.binary);
        cmd.args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(
                    kind = kind.as_str(),
                    binary = %encoder.binary,
                    error = %e,
                    "Failed to launch encoder"
                );
                *lock(&state) = SessionState::Failed(FailureReason::Launch);
                return session;
            }
        };

        *lock(&stdin) = child.stdin.take();
        *lock(&state) = SessionState::Recording;

        if let Some(stderr) = child.stderr.take() {
            let log_kind = kind.as_str();
            // Drained concurrently: a full stderr pipe stalls the encoder.
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(kind = log_kind, "encoder: {line}");
                }
            });
        }

        let watcher_state = state.clone();
        let watcher_encoder = encoder.clone();
        session.watcher = Some(tokio::spawn(async move {
            let status = child.wait().await;
            match status {
                Ok(status) if status.success() => {
                    if let Some(plan) = segment {
                        *lock(&watcher_state) = SessionState::Finalizing;
                        match reassemble::reassemble(&plan, &watcher_encoder).await {
                            Ok(outcome) => {
                                tracing::info!(
                                    kind = kind.as_str(),
                                    ?outcome,
                                    "Capture finalized"
                                );
                                *lock(&watcher_state) = SessionState::Idle;
                            }
                            Err(e) => {
                                tracing::error!(
                                    kind = kind.as_str(),
                                    error = %e,
                                    "Segment reassembly failed; shards preserved"
                                );
                                *lock(&watcher_state) =
                                    SessionState::Failed(FailureReason::Reassembly);
                            }
                        }
                    } else {
                        tracing::info!(kind = kind.as_str(), "Capture finished");
                        *lock(&watcher_state) = SessionState::Idle;
                    }
                }
                Ok(status) => {
                    tracing::error!(
                        kind = kind.as_str(),
                        code = ?status.code(),
                        "Encoder exited with an error"
                    );
                    *lock(&watcher_state) = SessionState::Failed(FailureReason::Encoding);
                }
                Err(e) => {
                    tracing::error!(
                        kind = kind.as_str(),
                        error = %e,
                        "Failed to wait on encoder"
                    );
                    *lock(&watcher_state) = SessionState::Failed(FailureReason::Encoding);
                }
            }
        }));

        session
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    /// What this session captures.
    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    /// The output path the session was started with.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Ask the encoder to stop, without waiting for it.
    ///
    /// Sends the graceful-quit byte from a detached task and returns. The
    /// process exit (and any reassembly) is observed by the watcher; callers
    /// poll [`state`](Self::state) for completion. There is no forced-kill
    /// escalation.
    pub fn request_stop(&self) {
        {
            let mut state = lock(&self.state);
            match *state {
                SessionState::Starting | SessionState::Recording => {
                    *state = SessionState::Stopping;
                }
                other => {
                    tracing::info!(
                        kind = self.kind.as_str(),
                        state = ?other,
                        "Stop requested but session is not recording"
                    );
                    return;
                }
            }
        }

        let stdin = self.stdin.clone();
        let kind = self.kind;
        tokio::spawn(async move {
            // Taking the writer out of the slot keeps the handle single-owner;
            // a second stop finds it gone.
            let writer = lock(&stdin).take();
            match writer {
                Some(mut writer) => {
                    if let Err(e) = writer.write_all(GRACEFUL_QUIT).await {
                        tracing::warn!(
                            kind = kind.as_str(),
                            error = %e,
                            "Failed to deliver stop signal"
                        );
                        return;
                    }
                    if let Err(e) = writer.flush().await {
                        tracing::warn!(
                            kind = kind.as_str(),
                            error = %e,
                            "Failed to flush stop signal"
                        );
                    }
                }
                None => {
                    tracing::debug!(kind = kind.as_str(), "Stop signal already sent");
                }
            }
        });
    }

    /// Detach the watcher handle so the caller can await completion.
    pub fn take_watcher(&mut self) -> Option<JoinHandle<()>> {
        self.watcher.take()
    }

    /// Await the watcher task (and with it, any reassembly work).
    pub async fn wait_complete(&mut self) {
        if let Some(handle) = self.watcher.take() {
            let _ = handle.await;
        }
    }

    #[cfg(test)]
    pub(crate) fn stub_with_state(kind: SessionKind, state: SessionState) -> Self {
        Self {
            kind,
            output_path: PathBuf::new(),
            state: Arc::new(Mutex::new(state)),
            stdin: Arc::new(Mutex::new(None)),
            watcher: None,
        }
    }
}

/// Lock a mutex, recovering the guard if a panicking task poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
