// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::chunk::Chunk;
use crate::error::{ConfigurationError, ExecutionError, SubmissionError};
use crate::user_function::UserFn;
use async_trait::async_trait;
use tokio::sync::oneshot;

/// Resolves to the outcome of one dispatched chunk.
///
/// The sender side lives with the worker. A sender dropped before reporting
/// (worker panic, lost transport) resolves as an execution error rather than
/// hanging the barrier.
pub struct TaskHandle<R> {
    receiver: oneshot::Receiver<Result<R, ExecutionError>>,
}

impl<R> TaskHandle<R> {
    /// Create a handle together with the sender its worker reports through.
    pub fn channel() -> (oneshot::Sender<Result<R, ExecutionError>>, Self) {
        let (sender, receiver) = oneshot::channel();
        (sender, Self { receiver })
    }

    pub async fn outcome(self) -> Result<R, ExecutionError> {
        match self.receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(ExecutionError::new(
                "worker dropped without reporting a result",
            )),
        }
    }
}

/// Scoped lifecycle of a pool of compute workers.
///
/// `acquire` brings up the pool's resources (worker slots for local pools,
/// sessions and endpoint bindings for remote ones); `release` tears them
/// down. Implementations also release from `Drop`, so the resources go away
/// on every exit path.
#[async_trait]
pub trait ManagedPool: Send + Sync {
    async fn acquire(&self) -> Result<(), ConfigurationError>;

    /// Idempotent teardown.
    fn release(&self);

    fn is_acquired(&self) -> bool;

    /// Currently usable parallelism. Advisory: consumed by distribution
    /// strategies and diagnostics, not a hard cap on concurrency.
    fn worker_count(&self) -> usize;
}

/// A pool of compute workers accepting task submissions.
///
/// Local and remote implementations are substitutable: same submission
/// contract, same error taxonomy, differing only in where execution happens
/// and which scoped resources `acquire` brings up.
#[async_trait]
pub trait WorkerManager<T, R>: ManagedPool
where
    T: Send + 'static,
    R: Send + 'static,
{
    /// Dispatch one chunk. Awaits only the dispatch round-trip; the returned
    /// handle resolves once the user function finishes (or fails) on a
    /// worker. Submissions go through `&self` and may be issued concurrently.
    async fn submit(
        &self,
        function: &UserFn<T, R>,
        chunk: Chunk<T>,
    ) -> Result<TaskHandle<R>, SubmissionError>;
}

/// RAII guard pairing `acquire` with a guaranteed `release` on drop.
pub struct PoolGuard<'a, M: ManagedPool + ?Sized> {
    pool: &'a M,
}

impl<'a, M: ManagedPool + ?Sized> PoolGuard<'a, M> {
    pub async fn acquire(pool: &'a M) -> Result<PoolGuard<'a, M>, ConfigurationError> {
        pool.acquire().await?;
        Ok(Self { pool })
    }
}

impl<M: ManagedPool + ?Sized> Drop for PoolGuard<'_, M> {
    fn drop(&mut self) {
        self.pool.release();
    }
}
