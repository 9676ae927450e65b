//! Provisional resolver abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::Destination;

/// Turns a provisional destination into a concrete one.
///
/// Callers must not resolve the same destination concurrently.
#[async_trait]
pub trait ProvisionalResolver: Send + Sync {
    async fn resolve(&self, destination: &Destination) -> CoreResult<Destination>;
}
