//! Encoder command-line construction.
//!
//! Every invocation is built as an explicit ordered token list; nothing is
//! ever joined into a single string and re-split, so paths and device names
//! containing spaces stay intact.

use std::path::{Path, PathBuf};

use deskrec_common::config::EncoderConfig;

/// Where a segmented capture writes its pieces and where the reassembled
/// file must end up.
#[derive(Debug, Clone)]
pub struct SegmentPlan {
    /// Full path prefix shared by every shard: `<dir>/<stem>_`.
    pub prefix: PathBuf,

    /// Shard filename suffix, including the dot (e.g. `.mp4`).
    pub suffix: String,

    /// Final output path the shards concatenate into.
    pub output: PathBuf,
}

impl SegmentPlan {
    /// Derive the plan from the requested output path.
    ///
    /// `D:\rec\1700000000000.mp4` segments into `1700000000000_000.mp4`,
    /// `1700000000000_001.mp4`, ... in the same directory.
    pub fn for_output(output: &Path) -> Self {
        let stem = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "capture".to_string());
        let suffix = output
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        Self {
            prefix: output.with_file_name(format!("{stem}_")),
            suffix,
            output: output.to_path_buf(),
        }
    }

    /// Numbered-segment output pattern handed to the encoder.
    pub fn pattern(&self) -> PathBuf {
        let prefix_name = self
            .prefix
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.prefix
            .with_file_name(format!("{prefix_name}%03d{}", self.suffix))
    }
}

/// Arguments for the device-listing mode.
///
/// The run exits nonzero on purpose (`-i dummy` never opens); only the
/// diagnostic stream matters.
pub fn list_devices_args() -> Vec<String> {
    [
        "-hide_banner",
        "-list_devices",
        "true",
        "-f",
        "dshow",
        "-i",
        "dummy",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Arguments for the segmented screen + system-audio capture.
pub fn screen_capture_args(encoder: &EncoderConfig, plan: &SegmentPlan) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-y".to_string(),
        "-f".to_string(),
        "dshow".to_string(),
        "-i".to_string(),
        format!(
            "video={}:audio={}",
            encoder.video_source, encoder.loopback_source
        ),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        encoder.preset.clone(),
        "-tune".to_string(),
        encoder.tune.clone(),
        "-b:v".to_string(),
        format!("{}k", encoder.video_bitrate_kbps),
        "-r".to_string(),
        encoder.fps.to_string(),
        "-g".to_string(),
        encoder.gop_size.to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        format!("{}k", encoder.audio_bitrate_kbps),
        "-ar".to_string(),
        encoder.sample_rate.to_string(),
        "-f".to_string(),
        "segment".to_string(),
        "-segment_time".to_string(),
        encoder.segment_secs.to_string(),
        "-reset_timestamps".to_string(),
        "1".to_string(),
        plan.pattern().display().to_string(),
    ]
}

/// Arguments for a microphone-only capture to raw PCM.
pub fn microphone_capture_args(
    encoder: &EncoderConfig,
    device: &str,
    output: &Path,
) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-y".to_string(),
        "-f".to_string(),
        "dshow".to_string(),
        "-i".to_string(),
        format!("audio={device}"),
        "-c:a".to_string(),
        "pcm_s16le".to_string(),
        "-ar".to_string(),
        encoder.sample_rate.to_string(),
        "-ac".to_string(),
        "2".to_string(),
        output.display().to_string(),
    ]
}

/// Arguments for the concatenation pass over a shard manifest.
pub fn concat_args(manifest: &Path, output: &Path) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-y".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        manifest.display().to_string(),
        "-c".to_string(),
        "copy".to_string(),
        output.display().to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_plan_derives_prefix_pattern_and_output() {
        let plan = SegmentPlan::for_output(Path::new("/rec/1700000000000.mp4"));
        assert_eq!(plan.prefix, Path::new("/rec/1700000000000_"));
        assert_eq!(plan.suffix, ".mp4");
        assert_eq!(plan.pattern(), Path::new("/rec/1700000000000_%03d.mp4"));
        assert_eq!(plan.output, Path::new("/rec/1700000000000.mp4"));
    }

    #[test]
    fn screen_args_are_segmented_and_carry_fixed_parameters() {
        let encoder = EncoderConfig::default();
        let plan = SegmentPlan::for_output(Path::new("/rec/out.mp4"));
        let args = screen_capture_args(&encoder, &plan);

        assert!(args.contains(&"-f".to_string()));
        assert!(args.contains(&"segment".to_string()));
        assert!(args.contains(&"-reset_timestamps".to_string()));
        assert!(args.contains(&"/rec/out_%03d.mp4".to_string()));
        assert!(args
            .contains(&"video=screen-capture-recorder:audio=virtual-audio-capturer".to_string()));
        assert!(args.contains(&"5000k".to_string()));
        assert!(args.contains(&"192k".to_string()));
        assert!(args.contains(&"44100".to_string()));
    }

    #[test]
    fn device_names_with_spaces_stay_single_tokens() {
        let encoder = EncoderConfig::default();
        let args = microphone_capture_args(
            &encoder,
            "Microphone (Realtek High Definition Audio)",
            Path::new("/tmp/my recordings/take 1.wav"),
        );

        assert!(args.contains(&"audio=Microphone (Realtek High Definition Audio)".to_string()));
        assert!(args.contains(&"/tmp/my recordings/take 1.wav".to_string()));
        assert!(args.contains(&"pcm_s16le".to_string()));
    }

    #[test]
    fn concat_args_reference_manifest_and_stream_copy() {
        let args = concat_args(Path::new("/rec/concat_list.txt"), Path::new("/rec/out.mp4"));
        assert_eq!(
            args,
            vec![
                "-hide_banner",
                "-y",
                "-f",
                "concat",
                "-safe",
                "0",
                "-i",
                "/rec/concat_list.txt",
                "-c",
                "copy",
                "/rec/out.mp4",
            ]
        );
    }
}
