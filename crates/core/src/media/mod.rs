//! Audio enhancement and video composition.
//!
//! Both stages shell out to ffmpeg. The enhancer cleans up a speech
//! recording (rumble and hiss removal, compression, loudness normalization);
//! the composer loops stock clips into a 1080p visual track and muxes it with
//! the enhanced audio and a title overlay.

mod composer;
mod enhancer;
mod error;
mod traits;

pub use composer::{concat_entries, escape_drawtext, FfmpegComposer};
pub use enhancer::{FfmpegEnhancer, ENHANCE_FILTERS};
pub use error::MediaError;
pub use traits::{AudioEnhancer, VideoComposer};
