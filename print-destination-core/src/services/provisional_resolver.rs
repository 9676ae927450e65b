//! Provisional destination resolution

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{CoreError, CoreResult};
use crate::traits::{DestinationRegistry, ProvisionalResolver};
use crate::types::Destination;

/// Progress of the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    Idle,
    /// Handshake with the registry is running
    Granting,
    Done,
    Failed,
}

struct ResolverProgress {
    state: ResolverState,
    destination_id: Option<String>,
}

/// Provisional Destination Resolver
///
/// Runs the registry handshake that turns a provisional destination into a
/// concrete one. No retries: a failure is reported once and the caller
/// decides what to do next.
pub struct ProvisionalDestinationResolver {
    registry: Arc<dyn DestinationRegistry>,
    progress: Mutex<ResolverProgress>,
}

impl ProvisionalDestinationResolver {
    #[must_use]
    pub fn new(registry: Arc<dyn DestinationRegistry>) -> Self {
        Self {
            registry,
            progress: Mutex::new(ResolverProgress {
                state: ResolverState::Idle,
                destination_id: None,
            }),
        }
    }

    pub async fn state(&self) -> ResolverState {
        self.progress.lock().await.state
    }

    async fn finish(&self, state: ResolverState) {
        self.progress.lock().await.state = state;
    }
}

#[async_trait]
impl ProvisionalResolver for ProvisionalDestinationResolver {
    async fn resolve(&self, destination: &Destination) -> CoreResult<Destination> {
        if !destination.is_provisional() {
            return Err(CoreError::NotProvisional(destination.id.clone()));
        }

        {
            let mut progress = self.progress.lock().await;
            if progress.state == ResolverState::Granting {
                let current = progress.destination_id.clone().unwrap_or_default();
                return Err(CoreError::ResolutionInProgress(current));
            }
            progress.state = ResolverState::Granting;
            progress.destination_id = Some(destination.id.clone());
        }

        log::info!("Resolving provisional destination: {}", destination.id);
        let result = match self.registry.resolve_provisional(destination).await {
            Ok(resolved) if resolved.is_provisional() => {
                Err(CoreError::ProvisionalResolutionFailed {
                    destination_id: destination.id.clone(),
                    message: "handshake returned a provisional destination".to_string(),
                })
            }
            Ok(resolved) => Ok(resolved),
            Err(e @ CoreError::ProvisionalResolutionFailed { .. }) => Err(e),
            Err(e) => Err(CoreError::ProvisionalResolutionFailed {
                destination_id: destination.id.clone(),
                message: e.to_string(),
            }),
        };

        match &result {
            Ok(resolved) => {
                log::info!(
                    "Provisional destination {} resolved to {}",
                    destination.id,
                    resolved.id
                );
                self.finish(ResolverState::Done).await;
            }
            Err(_) => self.finish(ResolverState::Failed).await,
        }
        result
    }
}
