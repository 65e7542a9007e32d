//! Publication channels.
//!
//! Each channel uploads the finished video (and the thumbnail when there is
//! one) and reports a channel-specific success descriptor: a message
//! confirmation for Telegram, a watch URL for YouTube.

mod error;
mod telegram;
mod traits;
mod youtube;

pub use error::PublishError;
pub use telegram::{build_caption, TelegramPublisher};
pub use traits::{Channel, PublishRequest, Publisher};
pub use youtube::YouTubePublisher;
