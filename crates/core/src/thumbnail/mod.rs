//! Thumbnail generation.

mod error;
mod openai;
mod traits;

pub use error::ThumbnailError;
pub use openai::{build_prompt, OpenAiThumbnailGenerator, DEFAULT_PROMPT_TEMPLATE};
pub use traits::ThumbnailGenerator;
