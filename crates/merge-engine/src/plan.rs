//! Merge-plan construction.
//!
//! The plan is a deterministic filter graph over N+1 audio inputs: input 0
//! is the base video, inputs 1..=N are the secondary tracks in map order.
//! Every stream gets a delay filter (zero for the base, the recorded start
//! offset for each track) and a distinct label `[a<i>]` that is referenced
//! exactly once by the final mix. The delay value is applied to both channel
//! slots of `adelay`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use deskrec_common::config::EncoderConfig;

/// One secondary audio track and its start delay relative to the video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    pub path: PathBuf,
    pub offset_millis: u64,
}

/// Flatten the offset map into plan order (the map's natural path order).
pub fn planned_tracks(tracks: &BTreeMap<PathBuf, u64>) -> Vec<AudioTrack> {
    tracks
        .iter()
        .map(|(path, offset)| AudioTrack {
            path: path.clone(),
            offset_millis: *offset,
        })
        .collect()
}

/// Build the `-filter_complex` expression for the given track offsets.
pub fn build_filter_graph(offsets: &[u64]) -> String {
    // Zero delay on the base stream normalizes its label alongside the rest.
    let mut graph = String::from("[0:a]adelay=0|0[a0]");
    for (idx, offset) in offsets.iter().enumerate() {
        let input = idx + 1;
        graph.push_str(&format!(";[{input}:a]adelay={offset}|{offset}[a{input}]"));
    }

    graph.push(';');
    for idx in 0..=offsets.len() {
        graph.push_str(&format!("[a{idx}]"));
    }
    graph.push_str(&format!(
        "amix=inputs={}:duration=longest:normalize=1[aout]",
        offsets.len() + 1
    ));
    graph
}

/// Build the full merge invocation: all inputs, the filter graph, a
/// stream-copied video map, and the re-encoded mixed audio map.
pub fn build_merge_args(
    base: &Path,
    output: &Path,
    tracks: &[AudioTrack],
    encoder: &EncoderConfig,
) -> Vec<String> {
    let mut args = vec![
        "-hide_banner".to_string(),
        "-y".to_string(),
        "-i".to_string(),
        base.display().to_string(),
    ];

    for track in tracks {
        args.push("-i".to_string());
        args.push(track.path.display().to_string());
    }

    let offsets: Vec<u64> = tracks.iter().map(|t| t.offset_millis).collect();
    args.push("-filter_complex".to_string());
    args.push(build_filter_graph(&offsets));

    args.push("-map".to_string());
    args.push("0:v".to_string());
    args.push("-c:v".to_string());
    args.push("copy".to_string());
    args.push("-map".to_string());
    args.push("[aout]".to_string());
    args.push("-c:a".to_string());
    args.push("aac".to_string());
    args.push("-b:a".to_string());
    args.push(format!("{}k", encoder.audio_bitrate_kbps));
    args.push(output.display().to_string());

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn two_track_graph_delays_and_mixes_three_streams() {
        let graph = build_filter_graph(&[0, 5000]);
        assert_eq!(
            graph,
            "[0:a]adelay=0|0[a0];[1:a]adelay=0|0[a1];[2:a]adelay=5000|5000[a2];\
             [a0][a1][a2]amix=inputs=3:duration=longest:normalize=1[aout]"
        );
    }

    #[test]
    fn merge_args_interleave_inputs_before_the_graph() {
        let encoder = EncoderConfig::default();
        let tracks = vec![
            AudioTrack {
                path: PathBuf::from("/rec/a.wav"),
                offset_millis: 0,
            },
            AudioTrack {
                path: PathBuf::from("/rec/b.wav"),
                offset_millis: 5000,
            },
        ];
        let args = build_merge_args(
            Path::new("/rec/video.mp4"),
            Path::new("/rec/merged.mp4"),
            &tracks,
            &encoder,
        );

        let inputs: Vec<&String> = args
            .iter()
            .zip(args.iter().skip(1))
            .filter(|(flag, _)| *flag == "-i")
            .map(|(_, value)| value)
            .collect();
        assert_eq!(inputs, vec!["/rec/video.mp4", "/rec/a.wav", "/rec/b.wav"]);

        assert!(args.windows(2).any(|w| w[0] == "-c:v" && w[1] == "copy"));
        assert!(args.windows(2).any(|w| w[0] == "-map" && w[1] == "[aout]"));
        assert_eq!(args.last().map(String::as_str), Some("/rec/merged.mp4"));
    }

    #[test]
    fn planned_tracks_follow_map_order() {
        let mut map = BTreeMap::new();
        map.insert(PathBuf::from("/rec/b.wav"), 5000u64);
        map.insert(PathBuf::from("/rec/a.wav"), 0u64);

        let tracks = planned_tracks(&map);
        assert_eq!(tracks[0].path, PathBuf::from("/rec/a.wav"));
        assert_eq!(tracks[1].path, PathBuf::from("/rec/b.wav"));
    }

    fn count_occurrences(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    proptest! {
        // Each label must appear exactly twice: once as a delay output and
        // once as a mix input.
        #[test]
        fn every_label_is_used_exactly_twice(offsets in prop::collection::vec(0u64..10_000_000, 1..8)) {
            let graph = build_filter_graph(&offsets);
            for idx in 0..=offsets.len() {
                prop_assert_eq!(count_occurrences(&graph, &format!("[a{idx}]")), 2);
            }
            prop_assert_eq!(
                count_occurrences(&graph, &format!("amix=inputs={}", offsets.len() + 1)),
                1
            );
        }

        #[test]
        fn every_track_delay_uses_one_value_for_both_channels(
            offsets in prop::collection::vec(0u64..10_000_000, 1..8)
        ) {
            let graph = build_filter_graph(&offsets);
            for (idx, offset) in offsets.iter().enumerate() {
                let directive = format!("[{}:a]adelay={offset}|{offset}[a{}]", idx + 1, idx + 1);
                prop_assert!(graph.contains(&directive));
            }
        }
    }
}
