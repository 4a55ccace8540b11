//! Call context for batch operations
//!
//! Every batch call takes a [`CallContext`]: a cancellation token plus an
//! optional deadline, both owned by the caller. The cache never imposes a
//! timeout of its own.

use crate::error::{CacheError, CacheResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline scope of one call
///
/// # Example
///
/// ```rust
/// use imcache_core::concurrency::CallContext;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let ctx = CallContext::new().with_timeout(Duration::from_millis(500));
///     let child = ctx.child();
///
///     ctx.cancel();
///     assert!(child.is_cancelled());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
    /// When the call started; deadline errors report time since then
    started: Instant,
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CallContext {
    /// Context that never expires unless cancelled
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
            started: Instant::now(),
        }
    }

    /// Set an absolute deadline
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline relative to now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Child context: cancelled with the parent, same deadline and start
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
            started: self.started,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time since the context was created
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn deadline_exceeded(&self) -> CacheError {
        CacheError::deadline_exceeded(self.elapsed().as_millis() as u64)
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Error if the context has already expired
    pub fn check(&self) -> CacheResult<()> {
        if self.token.is_cancelled() {
            return Err(CacheError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(self.deadline_exceeded());
            }
        }
        Ok(())
    }

    /// Resolve once the context is cancelled or its deadline passes,
    /// yielding the matching error. Never resolves for a plain context.
    pub async fn expired(&self) -> CacheError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => CacheError::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => self.deadline_exceeded(),
                }
            }
            None => {
                self.token.cancelled().await;
                CacheError::Cancelled
            }
        }
    }

    /// Run `fut` unless the context expires first
    pub async fn run<F, T>(&self, fut: F) -> CacheResult<T>
    where
        F: Future<Output = CacheResult<T>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            err = self.expired() => Err(err),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes_without_expiry() {
        let ctx = CallContext::new();
        let value = ctx.run(async { Ok::<_, CacheError>(42) }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_run_returns_cancelled() {
        let ctx = CallContext::new();
        ctx.cancel();
        let err = ctx.run(async { Ok::<_, CacheError>(1) }).await.unwrap_err();
        assert_eq!(err, CacheError::Cancelled);
    }

    #[tokio::test]
    async fn test_run_cancelled_while_pending() {
        let ctx = CallContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, CacheError>(())
            })
            .await
            .unwrap_err();
        assert_eq!(err, CacheError::Cancelled);
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let ctx = CallContext::new().with_timeout(Duration::from_millis(50));
        let err = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, CacheError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::DeadlineExceeded { .. }));
    }

    #[tokio::test]
    async fn test_deadline_reports_time_since_creation() {
        let ctx = CallContext::new().with_timeout(Duration::from_millis(30));
        tokio::time::sleep(Duration::from_millis(60)).await;

        // Already past the deadline before anything was awaited on the context
        match ctx.check() {
            Err(CacheError::DeadlineExceeded { after_ms, .. }) => assert!(after_ms >= 60),
            other => panic!("expected deadline error, got {:?}", other),
        }
        match ctx.child().expired().await {
            CacheError::DeadlineExceeded { after_ms, .. } => assert!(after_ms >= 60),
            other => panic!("expected deadline error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_expired_measures_from_creation_not_first_poll() {
        let ctx = CallContext::new().with_timeout(Duration::from_millis(80));
        tokio::time::sleep(Duration::from_millis(40)).await;

        let err = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, CacheError>(())
            })
            .await
            .unwrap_err();
        match err {
            CacheError::DeadlineExceeded { after_ms, .. } => assert!(after_ms >= 80),
            other => panic!("expected deadline error, got {:?}", other),
        }
    }

    #[test]
    fn test_child_follows_parent() {
        let parent = CallContext::new();
        let child = parent.child();
        assert!(!child.is_cancelled());
        parent.cancel();
        assert!(child.is_cancelled());
        assert_eq!(child.check(), Err(CacheError::Cancelled));
    }
}
