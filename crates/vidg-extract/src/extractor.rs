//! The full probe → sample → composite → colors pipeline.

use std::future::Future;
use std::path::Path;

use tracing::{debug, info};

use vidg_core::{ExtractConfig, Media};

use crate::colors::dominant_colors;
use crate::error::ExtractionError;
use crate::frames::{plan_positions, sample_frames};
use crate::probe::probe;
use crate::sheet::{color_sample, compose, encode_jpeg};

/// Derives [`Media`] for one file.
///
/// Implementations must keep failures scoped to the file they were given.
pub trait MediaExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> impl Future<Output = Result<Media, ExtractionError>> + Send;
}

/// Extractor driving an external probe and frame sampler.
#[derive(Debug, Clone, Default)]
pub struct FfmpegExtractor {
    config: ExtractConfig,
}

impl FfmpegExtractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }
}

impl MediaExtractor for FfmpegExtractor {
    async fn extract(&self, path: &Path) -> Result<Media, ExtractionError> {
        let config = &self.config;
        let info = probe(config, path).await?;

        let positions = plan_positions(
            info.duration,
            config.frame_count,
            config.fallback_duration(),
        );
        let frames = sample_frames(config, path, &positions).await?;

        let sampled = frames.iter().filter(|f| f.is_some()).count();
        if sampled == 0 {
            return Err(ExtractionError::NoFrames {
                path: path.to_path_buf(),
            });
        }
        debug!(path = %path.display(), sampled, total = frames.len(), "Frames sampled");

        let sheet = compose(config, &frames);
        let preview = encode_jpeg(&sheet, config.jpeg_quality)?;
        let colors = dominant_colors(
            &color_sample(config, &sheet),
            config.color_bin,
            config.color_count,
        );

        info!(path = %path.display(), preview_bytes = preview.len(), "Extracted");

        Ok(Media {
            bitrate: Some(info.bitrate),
            duration: info.duration,
            fps: Some(info.fps),
            height: Some(info.height),
            width: Some(info.width),
            preview,
            colors,
        })
    }
}
