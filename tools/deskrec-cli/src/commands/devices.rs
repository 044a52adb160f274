//! List microphone input devices.

use deskrec_capture_engine::SessionRegistry;
use deskrec_common::config::AppConfig;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    let registry = SessionRegistry::new(config.encoder.clone());
    let devices = registry.list_microphones();

    if devices.is_empty() {
        println!("No microphone devices found.");
        return Ok(());
    }

    for device in devices {
        println!("{device}");
    }
    Ok(())
}
