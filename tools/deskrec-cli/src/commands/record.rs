//! Record the desktop until Ctrl+C, then merge any microphone tracks.

use std::path::PathBuf;

use deskrec_capture_engine::{SessionRegistry, SessionState};
use deskrec_common::config::AppConfig;

pub async fn run(
    output: Option<PathBuf>,
    mic: Option<String>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
    std::fs::create_dir_all(&output_dir)?;

    let registry = SessionRegistry::new(config.encoder.clone());

    let video_path = output_dir.join(format!("{}.mp4", chrono::Utc::now().timestamp_millis()));
    registry.start_video_capture(&video_path)?;
    println!("Recording screen to {}", video_path.display());

    if let Some(device) = &mic {
        let audio_path = output_dir.join(format!("{}.wav", chrono::Utc::now().timestamp_millis()));
        registry.start_audio_capture(&audio_path, device)?;
        println!("Recording microphone '{device}' to {}", audio_path.display());
    }

    println!("Press Ctrl+C to stop recording...");
    tokio::signal::ctrl_c().await?;
    println!();

    // Stop the microphone first, then the screen, the way the offsets were
    // opened in the opposite order at start.
    registry.stop_audio_capture();
    registry.stop_video_capture();
    registry.wait_for_completion().await;

    if let Some(SessionState::Failed(reason)) = registry.video_state() {
        anyhow::bail!("video capture failed: {reason:?}");
    }
    if let Some(SessionState::Failed(reason)) = registry.audio_state() {
        println!("Warning: microphone capture failed ({reason:?}); keeping the raw video.");
        println!("Recording saved to {}", video_path.display());
        return Ok(());
    }

    if registry.tracks().is_empty() {
        println!("Recording saved to {}", video_path.display());
        return Ok(());
    }

    let merged_path = output_dir.join(format!("{}.mp4", chrono::Utc::now().timestamp_millis()));
    let report = registry.merge_tracks(&video_path, &merged_path).await?;
    println!(
        "Merged {} audio track(s); recording saved to {}",
        report.mixed_tracks,
        report.output.display()
    );
    Ok(())
}
