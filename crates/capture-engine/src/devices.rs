//! Audio input device enumeration.
//!
//! The encoder's device-listing mode prints a device table on its diagnostic
//! stream. Audio inputs are the lines tagged `(audio)`; the loopback capture
//! device is excluded because it is the system-audio source, not a
//! microphone.

use deskrec_common::config::EncoderConfig;

use crate::command;

/// List usable microphone device names, preserving the encoder's order.
///
/// Never fails: if the encoder cannot be launched the failure is logged and
/// an empty list is returned.
pub fn list_microphones(encoder: &EncoderConfig) -> Vec<String> {
    let output = match std::process::Command::new(&encoder.binary)
        .args(command::list_devices_args())
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            tracing::error!(
                binary = %encoder.binary,
                error = %e,
                "Failed to launch encoder for device listing"
            );
            return Vec::new();
        }
    };

    // The device table normally lands on stderr; the listing run exits
    // nonzero by design, so only the streams are inspected.
    let diagnostics = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    );

    let devices = parse_microphone_lines(&diagnostics, &encoder.loopback_source);
    tracing::info!(count = devices.len(), "Enumerated microphone devices");
    devices
}

/// Extract microphone names from device-listing diagnostics.
pub(crate) fn parse_microphone_lines(diagnostics: &str, loopback_source: &str) -> Vec<String> {
    diagnostics
        .lines()
        .filter(|line| line.contains("(audio)"))
        .filter(|line| !line.contains("(video)"))
        .filter(|line| !line.contains(loopback_source))
        .filter_map(quoted_name)
        .collect()
}

/// The device name is the first double-quoted substring on the line.
fn quoted_name(line: &str) -> Option<String> {
    let start = line.find('"')? + 1;
    let end = start + line[start..].find('"')?;
    if end > start {
        Some(line[start..end].to_string())
    } else {
        None
    }
}
