//! Frame position planning and sequential frame sampling.

use std::path::Path;

use image::RgbImage;
use image::imageops::{self, FilterType};
use tracing::debug;

use vidg_core::ExtractConfig;

use crate::error::ExtractionError;
use crate::process;

/// `count` timestamps evenly spaced strictly inside `(0, duration)`.
///
/// Unknown or non-positive durations use `fallback` instead.
pub fn plan_positions(duration: Option<f64>, count: u32, fallback: f64) -> Vec<f64> {
    let span = duration.filter(|d| *d > 0.0).unwrap_or(fallback);
    let step = span / f64::from(count + 1);
    (1..=count).map(|i| step * f64::from(i)).collect()
}

/// Arguments for grabbing one frame at `position` as PNG on stdout.
fn sampler_args(config: &ExtractConfig, path: &Path, position: f64) -> Vec<std::ffi::OsString> {
    let mut args: Vec<std::ffi::OsString> = Vec::with_capacity(20);
    for arg in ["-nostdin", "-v", "error", "-threads", "1", "-ss"] {
        args.push(arg.into());
    }
    args.push(format!("{position:.3}").into());
    args.push("-i".into());
    args.push(path.as_os_str().to_owned());
    args.push("-y".into());
    args.push("-filter_complex".into());
    args.push(format!("scale=w={}:h={}", config.frame_width, config.frame_height).into());
    for arg in ["-f", "image2pipe", "-vcodec", "png", "-vframes", "1", "-"] {
        args.push(arg.into());
    }
    args
}

/// Sample one frame per position, one process at a time.
///
/// A frame the sampler cannot produce (non-zero exit, empty or undecodable
/// output, timeout) comes back as `None`. Only a sampler that cannot be
/// started at all fails the whole call.
pub async fn sample_frames(
    config: &ExtractConfig,
    path: &Path,
    positions: &[f64],
) -> Result<Vec<Option<RgbImage>>, ExtractionError> {
    let mut frames = Vec::with_capacity(positions.len());

    for &position in positions {
        let args = sampler_args(config, path, position);
        let output = match process::run(&config.sampler_program, args, config.process_timeout(), path)
            .await
        {
            Ok(output) => output,
            Err(err @ ExtractionError::Timeout { .. }) => {
                debug!(path = %path.display(), position, "Frame skipped: {err}");
                frames.push(None);
                continue;
            }
            Err(err) => return Err(err),
        };

        frames.push(decode_frame(config, &output.stdout));
        if frames.last().is_some_and(Option::is_none) {
            debug!(
                path = %path.display(),
                position,
                status = ?output.status.code(),
                "Frame came back empty"
            );
        }
    }

    Ok(frames)
}

/// Decode sampler output into a frame of the configured size.
pub(crate) fn decode_frame(config: &ExtractConfig, bytes: &[u8]) -> Option<RgbImage> {
    if bytes.is_empty() {
        return None;
    }
    let frame = image::load_from_memory(bytes).ok()?.to_rgb8();
    if frame.dimensions() == (config.frame_width, config.frame_height) {
        Some(frame)
    } else {
        Some(imageops::resize(
            &frame,
            config.frame_width,
            config.frame_height,
            FilterType::Triangle,
        ))
    }
}
