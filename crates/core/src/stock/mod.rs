//! Stock footage sourcing.

mod error;
mod pexels;
mod traits;

pub use error::StockError;
pub use pexels::PexelsStockFootage;
pub use traits::StockFootage;
