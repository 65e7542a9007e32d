//! Trait definitions for stock footage sourcing.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::job::JobContext;

use super::error::StockError;

/// Provides background video clips for a composition.
#[async_trait]
pub trait StockFootage: Send + Sync {
    /// Returns the name of this provider.
    fn name(&self) -> &str;

    /// Download up to `count` clips. On success at least one path is returned.
    async fn fetch(&self, ctx: &JobContext, count: u32) -> Result<Vec<PathBuf>, StockError>;
}
