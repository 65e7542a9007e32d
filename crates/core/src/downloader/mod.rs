//! Audio acquisition.
//!
//! Direct links to audio files are fetched over HTTP; every other reference
//! (video pages, podcasts, streaming sites) is handed to yt-dlp.

mod error;
mod http;
mod traits;

pub use error::DownloadError;
pub use http::{direct_audio_extension, HttpAudioSource, DIRECT_AUDIO_EXTENSIONS};
pub use traits::AudioSource;
