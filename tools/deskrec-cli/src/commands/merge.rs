//! Merge audio tracks into a video file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use deskrec_common::config::AppConfig;

pub async fn run(
    video: PathBuf,
    output: PathBuf,
    track_args: Vec<String>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let mut tracks = BTreeMap::new();
    for arg in &track_args {
        let (path, offset) = arg
            .rsplit_once('=')
            .ok_or_else(|| anyhow::anyhow!("invalid track '{arg}', expected PATH=OFFSET_MS"))?;
        let offset_millis: u64 = offset
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid offset in track '{arg}'"))?;
        tracks.insert(PathBuf::from(path), offset_millis);
    }

    let report = deskrec_merge_engine::merge_tracks(&video, &output, &tracks, &config.encoder).await?;
    println!(
        "Merged {} track(s) into {}",
        report.mixed_tracks,
        report.output.display()
    );
    Ok(())
}
