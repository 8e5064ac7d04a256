//! Metadata probing.
//!
//! The probe prints a human-readable stream summary on stderr. Only two
//! lines of it matter: the container line carrying duration and bitrate,
//! and the first video stream line carrying dimensions and frame rate.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use vidg_core::ExtractConfig;

use crate::error::ExtractionError;
use crate::process;

static GENERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bDuration: (\d+):(\d+):(\d+\.\d+), start: [^,]+, bitrate: (\d+) kb/s\b")
        .unwrap_or_else(|e| panic!("invalid duration pattern: {e}"))
});

static VIDEO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bStream #.+: Video: .+, (\d+)x(\d+).+, (\d+(?:\.\d+)?) fps,")
        .unwrap_or_else(|e| panic!("invalid stream pattern: {e}"))
});

/// Technical attributes reported by the probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeInfo {
    /// Seconds; `None` when the probe reports zero.
    pub duration: Option<f64>,
    /// kb/s.
    pub bitrate: u32,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Parse probe diagnostics. Returns `None` when either line is missing.
pub fn parse_probe_output(text: &str) -> Option<ProbeInfo> {
    let general = GENERAL.captures(text)?;
    let video = VIDEO.captures(text)?;

    let hours: f64 = general[1].parse().ok()?;
    let minutes: f64 = general[2].parse().ok()?;
    let seconds: f64 = general[3].parse().ok()?;
    let duration = hours * 3600.0 + minutes * 60.0 + seconds;

    Some(ProbeInfo {
        duration: (duration > 0.0).then_some(duration),
        bitrate: general[4].parse().ok()?,
        width: video[1].parse().ok()?,
        height: video[2].parse().ok()?,
        fps: video[3].parse().ok()?,
    })
}

/// Run the probe against `path`.
pub async fn probe(config: &ExtractConfig, path: &Path) -> Result<ProbeInfo, ExtractionError> {
    let output = process::run(
        &config.probe_program,
        [path.as_os_str()],
        config.process_timeout(),
        path,
    )
    .await?;

    let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stdout));

    let info = parse_probe_output(&text).ok_or_else(|| ExtractionError::Unprobable {
        path: path.to_path_buf(),
    })?;
    debug!(path = %path.display(), ?info, "Probed");
    Ok(info)
}
