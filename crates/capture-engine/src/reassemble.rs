//! Segmented-capture reassembly.
//!
//! A segmented capture leaves `<stem>_000<ext>`, `<stem>_001<ext>`, ... on
//! disk. Reassembly lists the shards, writes a concatenation manifest, runs
//! the encoder's stream-copy concat pass, and deletes the pieces once the
//! final file exists. Shard numbering is zero-padded, so lexicographic
//! filename order is temporal order.

use std::path::{Path, PathBuf};

use deskrec_common::config::EncoderConfig;
use deskrec_common::error::{RecordError, RecordResult};

use crate::command::{self, SegmentPlan};

/// Fixed manifest name, written next to the shards and truncated each run.
pub const MANIFEST_FILE: &str = "concat_list.txt";

/// What a reassembly pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassembleOutcome {
    /// Zero or one shard on disk; nothing to concatenate, nothing deleted.
    NotNeeded,
    /// Shards were concatenated into the final output and cleaned up.
    Concatenated { shard_count: usize },
}

/// Reassemble the shards described by `plan` into its final output path.
///
/// On a failed concatenation the shards and manifest are left on disk so the
/// capture is not lost; the error carries the encoder's diagnostics.
pub async fn reassemble(
    plan: &SegmentPlan,
    encoder: &EncoderConfig,
) -> RecordResult<ReassembleOutcome> {
    let shards = discover_shards(&plan.prefix)?;
    if shards.len() <= 1 {
        tracing::info!(
            prefix = %plan.prefix.display(),
            count = shards.len(),
            "Single-segment capture; no reassembly needed"
        );
        return Ok(ReassembleOutcome::NotNeeded);
    }

    let manifest_path = manifest_path(&plan.prefix);
    std::fs::write(&manifest_path, manifest_contents(&shards))?;
    tracing::info!(
        manifest = %manifest_path.display(),
        shards = shards.len(),
        output = %plan.output.display(),
        "Concatenating capture segments"
    );

    let output = tokio::process::Command::new(&encoder.binary)
        .args(command::concat_args(&manifest_path, &plan.output))
        .output()
        .await
        .map_err(|e| RecordError::launch(format!("Failed to launch concat pass: {e}")))?;

    if !output.status.success() {
        return Err(RecordError::reassembly(format!(
            "concat pass exited {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    // Cleanup failures affect only tidiness, never the produced artifact.
    for shard in &shards {
        if let Err(e) = std::fs::remove_file(shard) {
            tracing::warn!(shard = %shard.display(), error = %e, "Failed to delete shard");
        }
    }
    if let Err(e) = std::fs::remove_file(&manifest_path) {
        tracing::warn!(
            manifest = %manifest_path.display(),
            error = %e,
            "Failed to delete concat manifest"
        );
    }

    Ok(ReassembleOutcome::Concatenated {
        shard_count: shards.len(),
    })
}

/// List the shard files for a prefix, in filename order.
///
/// A missing parent directory yields an empty list rather than an error
/// (malformed paths surface later, as an empty capture).
pub fn discover_shards(prefix: &Path) -> RecordResult<Vec<PathBuf>> {
    let Some(dir) = prefix.parent() else {
        return Ok(Vec::new());
    };
    let Some(prefix_name) = prefix.file_name().map(|s| s.to_string_lossy().into_owned()) else {
        return Ok(Vec::new());
    };

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut shards = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with(&prefix_name) {
            shards.push(entry.path());
        }
    }
    shards.sort_by_key(|path| path.file_name().map(|n| n.to_os_string()));
    Ok(shards)
}

/// Manifest body: one `file '<path>'` directive per shard, in order.
fn manifest_contents(shards: &[PathBuf]) -> String {
    let mut contents = String::new();
    for shard in shards {
        contents.push_str(&format!("file '{}'\n", shard.display()));
    }
    contents
}

fn manifest_path(prefix: &Path) -> PathBuf {
    prefix.with_file_name(MANIFEST_FILE)
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

    fn touch(path: &Path) {
        std::fs::write(path, b"segment-data").expect("file should be writable");
    }

    #[test]
    fn discovery_sorts_by_filename_and_ignores_non_matches() {
        let dir = temp_dir("discover");
        touch(&dir.join("rec_002.mp4"));
        touch(&dir.join("rec_000.mp4"));
        touch(&dir.join("rec_001.mp4"));
        touch(&dir.join("other.mp4"));
        touch(&dir.join(MANIFEST_FILE));

        let shards = discover_shards(&dir.join("rec_")).expect("discovery should succeed");
        let names: Vec<_> = shards
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["rec_000.mp4", "rec_001.mp4", "rec_002.mp4"]);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn discovery_of_missing_directory_is_empty() {
        let shards = discover_shards(Path::new("/nonexistent/deskrec/rec_"))
            .expect("missing directory should not error");
        assert!(shards.is_empty());
    }

    #[test]
    fn manifest_lists_shards_in_order() {
        let shards = vec![PathBuf::from("/rec/a_000.mp4"), PathBuf::from("/rec/a_001.mp4")];
        assert_eq!(
            manifest_contents(&shards),
            "file '/rec/a_000.mp4'\nfile '/rec/a_001.mp4'\n"
        );
    }

    #[tokio::test]
    async fn single_shard_is_a_noop_with_no_deletions() {
        let dir = temp_dir("single-shard");
        let shard = dir.join("rec_000.mp4");
        touch(&shard);

        let plan = SegmentPlan::for_output(&dir.join("rec.mp4"));
        let outcome = reassemble(&plan, &EncoderConfig::default())
            .await
            .expect("single shard should be a no-op");

        assert_eq!(outcome, ReassembleOutcome::NotNeeded);
        assert!(shard.exists());
        assert!(!dir.join(MANIFEST_FILE).exists());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_concat_deletes_shards_and_manifest() {
        let dir = temp_dir("concat-ok");
        touch(&dir.join("rec_000.mp4"));
        touch(&dir.join("rec_001.mp4"));

        // `true` stands in for a concat pass that exits 0.
        let encoder = EncoderConfig {
            binary: "true".to_string(),
            ..EncoderConfig::default()
        };
        let plan = SegmentPlan::for_output(&dir.join("rec.mp4"));
        let outcome = reassemble(&plan, &encoder)
            .await
            .expect("stubbed concat should succeed");

        assert_eq!(outcome, ReassembleOutcome::Concatenated { shard_count: 2 });
        assert!(!dir.join("rec_000.mp4").exists());
        assert!(!dir.join("rec_001.mp4").exists());
        assert!(!dir.join(MANIFEST_FILE).exists());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_concat_preserves_shards_and_manifest() {
        let dir = temp_dir("concat-fail");
        touch(&dir.join("rec_000.mp4"));
        touch(&dir.join("rec_001.mp4"));

        let encoder = EncoderConfig {
            binary: "false".to_string(),
            ..EncoderConfig::default()
        };
        let plan = SegmentPlan::for_output(&dir.join("rec.mp4"));
        let err = reassemble(&plan, &encoder)
            .await
            .expect_err("stubbed concat should fail");

        assert!(matches!(err, RecordError::Reassembly { .. }));
        assert!(dir.join("rec_000.mp4").exists());
        assert!(dir.join("rec_001.mp4").exists());
        assert!(dir.join(MANIFEST_FILE).exists());

        let _ = std::fs::remove_dir_all(dir);
    }
}
