//! Media extraction pipeline for vidg.
//!
//! For each file the pipeline
//!
//! 1. runs the metadata probe and parses duration, bitrate, size and frame rate,
//! 2. plans evenly spaced positions inside the duration,
//! 3. samples one frame per position with the frame sampler, sequentially,
//! 4. lays the frames out on a contact sheet and encodes it as JPEG,
//! 5. summarizes the sheet's dominant colors.
//!
//! External processes are killed on timeout or when the extraction future
//! is dropped, so cancelling a sync never leaves a sampler running.
//!
//! ```rust,no_run
//! use std::path::Path;
//! use vidg_extract::{ExtractConfig, FfmpegExtractor, MediaExtractor};
//!
//! # async fn run() -> Result<(), vidg_extract::ExtractionError> {
//! let extractor = FfmpegExtractor::new(ExtractConfig::default());
//! let media = extractor.extract(Path::new("/videos/clip.mp4")).await?;
//! println!("{}x{} colors {}", media.width.unwrap_or(0), media.height.unwrap_or(0), media.colors);
//! # Ok(())
//! # }
//! ```

mod colors;
mod error;
mod extractor;
mod frames;
mod probe;
mod process;
mod sheet;

pub use colors::dominant_colors;
pub use error::ExtractionError;
pub use extractor::{FfmpegExtractor, MediaExtractor};
pub use frames::{plan_positions, sample_frames};
pub use probe::{ProbeInfo, parse_probe_output, probe};
pub use sheet::{color_sample, compose, encode_jpeg};

pub use vidg_core::{ExtractConfig, Media};
