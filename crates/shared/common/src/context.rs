//! Call-scoped context threaded through every backend call.
//!
//! A [`CallContext`] carries the caller's cancellation token, an optional
//! deadline and the tracing span of the originating request. Adapters wrap
//! each network call in [`CallContext::run`], which drops the in-flight
//! future as soon as the token fires or the deadline passes.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};

use crate::error::{AppError, AppResult};

/// Cancellation, deadline and span for one logical request.
#[derive(Debug, Clone)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
    span: Span,
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CallContext {
    /// Context with no deadline, a fresh token and the current span.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
            span: Span::current(),
        }
    }

    /// Set a deadline `timeout` from now. An earlier existing deadline wins.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Set an absolute deadline. An earlier existing deadline wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail if the context is already cancelled or past its deadline.
    pub fn check(&self) -> AppResult<()> {
        if self.token.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        if matches!(self.deadline, Some(deadline) if deadline <= Instant::now()) {
            return Err(AppError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Run a backend call under this context.
    ///
    /// The call is instrumented with the context span and raced against the
    /// cancellation token and the deadline; whichever fires first drops the
    /// call future, aborting the underlying network operation.
    pub async fn run<F, T>(&self, call: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        self.check()?;

        let call = call.instrument(self.span.clone());
        let bounded = async {
            match self.deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, call).await {
                    Ok(result) => result,
                    Err(_) => Err(AppError::DeadlineExceeded),
                },
                None => call.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(AppError::Cancelled),
            result = bounded => result,
        }
    }
}
