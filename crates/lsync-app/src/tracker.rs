//! Context tracker - owns the active build context
//!
//! The tracker is the single writer of the current [`BuildContext`]. Every
//! refresh starts a new generation; a refresh only commits its result when no
//! newer refresh has started since, so a slow query can never overwrite a
//! fresher answer.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;

use lsync_cmake::BuildToolIntegration;
use lsync_core::prelude::*;
use lsync_core::{is_placeholder, normalize_label, BuildContext, ContextKind};

/// Holds the current build context and refreshes it from an integration
#[derive(Debug)]
pub struct ContextTracker {
    context: RwLock<BuildContext>,
    generation: AtomicU64,
    query_timeout: Duration,
}

impl ContextTracker {
    /// Create a tracker with an empty context
    pub fn new(query_timeout: Duration) -> Self {
        Self {
            context: RwLock::new(BuildContext::none()),
            generation: AtomicU64::new(0),
            query_timeout,
        }
    }

    /// Copy of the current context
    pub async fn snapshot(&self) -> BuildContext {
        self.context.read().await.clone()
    }

    /// Number of refreshes started so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Re-read the context after `kind` changed.
    ///
    /// Preset kinds look at the build preset, then the configure preset; the
    /// kit kind looks at the kit only. Returns the committed context, or
    /// `None` when a newer refresh superseded this one.
    pub async fn refresh<I: BuildToolIntegration>(
        &self,
        kind: ContextKind,
        integration: &I,
    ) -> Option<BuildContext> {
        let generation = self.begin().await;
        debug!("Refreshing context after {} change (generation {})", kind, generation);

        let context = if kind.is_preset() {
            self.query_preset(integration)
                .await
                .map(BuildContext::with_preset)
        } else {
            self.query_kit(integration).await.map(BuildContext::with_kit)
        };

        self.commit(generation, context.unwrap_or_default()).await
    }

    /// Establish the context from scratch: a preset when there is one,
    /// otherwise the kit
    pub async fn initialize<I: BuildToolIntegration>(&self, integration: &I) -> Option<BuildContext> {
        let generation = self.begin().await;
        debug!("Initializing context (generation {})", generation);

        let context = match self.query_preset(integration).await {
            Some(preset) => BuildContext::with_preset(preset),
            None => self
                .query_kit(integration)
                .await
                .map(BuildContext::with_kit)
                .unwrap_or_default(),
        };

        self.commit(generation, context).await
    }

    /// Start a generation and clear the context
    async fn begin(&self) -> u64 {
        let mut context = self.context.write().await;
        // Incremented under the lock so generation order matches lock order
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *context = BuildContext::none();
        generation
    }

    async fn commit(&self, generation: u64, next: BuildContext) -> Option<BuildContext> {
        let mut context = self.context.write().await;
        let latest = self.generation.load(Ordering::SeqCst);
        if latest != generation {
            debug!(
                "Dropping stale context {} (generation {} superseded by {})",
                next, generation, latest
            );
            return None;
        }

        info!("Build context: {}", next);
        *context = next.clone();
        Some(next)
    }

    async fn query_preset<I: BuildToolIntegration>(&self, integration: &I) -> Option<String> {
        let build = self
            .query("activeBuildPreset", integration.active_build_preset())
            .await
            .filter(|label| !is_placeholder(label));
        if build.is_some() {
            return build;
        }

        self.query("activeConfigurePreset", integration.active_configure_preset())
            .await
            .filter(|label| !is_placeholder(label))
    }

    async fn query_kit<I: BuildToolIntegration>(&self, integration: &I) -> Option<String> {
        self.query("activeKit", integration.active_kit()).await
    }

    /// Run one query under the timeout; failures count as "no value"
    async fn query<F>(&self, query: &str, future: F) -> Option<String>
    where
        F: Future<Output = Result<Option<String>>>,
    {
        match tokio::time::timeout(self.query_timeout, future).await {
            Ok(Ok(label)) => label.and_then(normalize_label),
            Ok(Err(e)) => {
                debug!("Context query failed: {}", e);
                None
            }
            Err(_) => {
                debug!("{}", Error::query_timeout(query, self.query_timeout));
                None
            }
        }
    }
}
