//! Merge execution.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use deskrec_common::config::EncoderConfig;
use deskrec_common::error::{RecordError, RecordResult};

use crate::plan;

/// What a successful merge produced and consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// The merged output file.
    pub output: PathBuf,

    /// Number of secondary tracks mixed in (the base audio adds one more
    /// stream on top).
    pub mixed_tracks: usize,

    /// Inputs actually deleted afterwards; may be lower than expected when a
    /// deletion fails (logged, non-fatal).
    pub removed_inputs: usize,
}

/// Mix `tracks` into `base`'s audio and write the result to `output`.
///
/// Inputs are validated before the encoder runs: merging already-consumed
/// files fails with [`RecordError::FileNotFound`] instead of silently
/// succeeding, and the output path must not alias any input. On a nonzero
/// encoder exit nothing is deleted, so the caller can retry.
pub async fn merge_tracks(
    base: &Path,
    output: &Path,
    tracks: &BTreeMap<PathBuf, u64>,
    encoder: &EncoderConfig,
) -> RecordResult<MergeReport> {
    if tracks.is_empty() {
        return Err(RecordError::merge("no audio tracks to merge"));
    }
    if output == base || tracks.contains_key(output) {
        return Err(RecordError::merge(format!(
            "output path {} aliases a merge input",
            output.display()
        )));
    }
    if !base.exists() {
        return Err(RecordError::FileNotFound {
            path: base.to_path_buf(),
        });
    }
    for track in tracks.keys() {
        if !track.exists() {
            return Err(RecordError::FileNotFound {
                path: track.clone(),
            });
        }
    }

    let planned = plan::planned_tracks(tracks);
    let args = plan::build_merge_args(base, output, &planned, encoder);

    tracing::info!(
        base = %base.display(),
        output = %output.display(),
        tracks = planned.len(),
        "Merging audio tracks into video"
    );
    tracing::debug!(binary = %encoder.binary, ?args, "Merge command");

    let result = tokio::process::Command::new(&encoder.binary)
        .args(&args)
        .output()
        .await
        .map_err(|e| RecordError::launch(format!("Failed to launch merge pass: {e}")))?;

    if !result.status.success() {
        return Err(RecordError::merge(format!(
            "merge pass exited {}: {}",
            result.status,
            String::from_utf8_lossy(&result.stderr).trim()
        )));
    }

    // The inputs are consumed; losing a deletion only leaves stale files.
    let mut removed = 0usize;
    for input in std::iter::once(base).chain(planned.iter().map(|t| t.path.as_path())) {
        match std::fs::remove_file(input) {
            Ok(()) => removed += 1,
            Err(e) => {
                tracing::warn!(input = %input.display(), error = %e, "Failed to delete merge input");
            }
        }
    }

    tracing::info!(
        output = %output.display(),
        removed,
        "Merge complete; inputs consumed"
    );

    Ok(MergeReport {
        output: output.to_path_buf(),
        mixed_tracks: planned.len(),
        removed_inputs: removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("deskrec-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    #[cfg(unix)]
    fn touch(path: &Path) {
        std::fs::write(path, b"media").expect("file should be writable");
    }

    #[tokio::test]
    async fn empty_track_map_is_rejected() {
        let err = merge_tracks(
            Path::new("/rec/video.mp4"),
            Path::new("/rec/merged.mp4"),
            &BTreeMap::new(),
            &EncoderConfig::default(),
        )
        .await
        .expect_err("empty map should be rejected");
        assert!(matches!(err, RecordError::Merge { .. }));
    }

    #[tokio::test]
    async fn output_aliasing_an_input_is_rejected() {
        let mut tracks = BTreeMap::new();
        tracks.insert(PathBuf::from("/rec/a.wav"), 0u64);

        let err = merge_tracks(
            Path::new("/rec/video.mp4"),
            Path::new("/rec/video.mp4"),
            &tracks,
            &EncoderConfig::default(),
        )
        .await
        .expect_err("aliased output should be rejected");
        assert!(matches!(err, RecordError::Merge { .. }));
    }

    #[tokio::test]
    async fn missing_inputs_fail_with_not_found() {
        let dir = temp_dir("merge-missing");
        let mut tracks = BTreeMap::new();
        tracks.insert(dir.join("gone.wav"), 0u64);

        let err = merge_tracks(
            &dir.join("gone.mp4"),
            &dir.join("merged.mp4"),
            &tracks,
            &EncoderConfig::default(),
        )
        .await
        .expect_err("missing base should fail");
        assert!(matches!(err, RecordError::FileNotFound { .. }));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_merge_consumes_all_inputs() {
        let dir = temp_dir("merge-ok");
        let base = dir.join("video.mp4");
        let track_a = dir.join("a.wav");
        let track_b = dir.join("b.wav");
        touch(&base);
        touch(&track_a);
        touch(&track_b);

        let mut tracks = BTreeMap::new();
        tracks.insert(track_a.clone(), 0u64);
        tracks.insert(track_b.clone(), 5000u64);

        // `true` stands in for a merge pass that exits 0.
        let encoder = EncoderConfig {
            binary: "true".to_string(),
            ..EncoderConfig::default()
        };
        let report = merge_tracks(&base, &dir.join("merged.mp4"), &tracks, &encoder)
            .await
            .expect("stubbed merge should succeed");

        assert_eq!(report.mixed_tracks, 2);
        assert_eq!(report.removed_inputs, 3);
        assert!(!base.exists());
        assert!(!track_a.exists());
        assert!(!track_b.exists());

        // A second merge of the same cycle now fails loudly.
        let err = merge_tracks(&base, &dir.join("merged2.mp4"), &tracks, &encoder)
            .await
            .expect_err("repeat merge should fail");
        assert!(matches!(err, RecordError::FileNotFound { .. }));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_merge_preserves_all_inputs() {
        let dir = temp_dir("merge-fail");
        let base = dir.join("video.mp4");
        let track = dir.join("a.wav");
        touch(&base);
        touch(&track);

        let mut tracks = BTreeMap::new();
        tracks.insert(track.clone(), 1500u64);

        let encoder = EncoderConfig {
            binary: "false".to_string(),
            ..EncoderConfig::default()
        };
        let err = merge_tracks(&base, &dir.join("merged.mp4"), &tracks, &encoder)
            .await
            .expect_err("stubbed merge should fail");

        assert!(matches!(err, RecordError::Merge { .. }));
        assert!(base.exists());
        assert!(track.exists());

        let _ = std::fs::remove_dir_all(dir);
    }
}
