//! Validity scope for in-flight results
//!
//! A view that goes away must not have late results written into it.
//! Each operation captures a [`ValidityToken`] when it starts; the owner
//! calls [`ValidityScope::invalidate`] on teardown, and any token taken
//! before that reports stale from then on.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Generation counter shared by one view and its in-flight work
#[derive(Debug, Clone, Default)]
pub struct ValidityScope {
    generation: Arc<AtomicU64>,
}

impl ValidityScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current generation
    pub fn token(&self) -> ValidityToken {
        ValidityToken {
            generation: self.generation.clone(),
            captured: self.generation.load(Ordering::SeqCst),
        }
    }

    /// Make every outstanding token stale
    pub fn invalidate(&self) {
        let previous = self.generation.fetch_add(1, Ordering::SeqCst);
        debug!("🧹 Validity scope advanced to generation {}", previous + 1);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// Proof that the scope has not been torn down since capture
#[derive(Debug, Clone)]
pub struct ValidityToken {
    generation: Arc<AtomicU64>,
    captured: u64,
}

impl ValidityToken {
    pub fn is_valid(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.captured
    }

    /// Drive `fut` to completion, yielding `None` if the scope was
    /// invalidated while it ran
    pub async fn run<F, T>(&self, fut: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let output = fut.await;
        if self.is_valid() {
            Some(output)
        } else {
            debug!("🗑️ Discarding result that arrived after teardown");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_goes_stale_on_invalidate() {
        let scope = ValidityScope::new();
        let token = scope.token();
        assert!(token.is_valid());

        scope.invalidate();
        assert!(!token.is_valid());
        assert!(scope.token().is_valid());
        assert_eq!(scope.generation(), 1);
    }

    #[test]
    fn test_clones_share_generation() {
        let scope = ValidityScope::new();
        let token = scope.token();
        scope.clone().invalidate();
        assert!(!token.is_valid());
    }

    #[tokio::test]
    async fn test_run_discards_late_result() {
        let scope = ValidityScope::new();
        let token = scope.token();
        let (tx, rx) = tokio::sync::oneshot::channel::<u32>();

        let handle = tokio::spawn({
            let token = token.clone();
            async move { token.run(async { rx.await.unwrap_or(0) }).await }
        });

        scope.invalidate();
        tx.send(7).unwrap();
        assert_eq!(handle.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_run_keeps_result_while_valid() {
        let scope = ValidityScope::new();
        let output = scope.token().run(async { "done" }).await;
        assert_eq!(output, Some("done"));
    }
}
