// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::distribution_strategy::{DistributionStrategy, ListDistributionStrategy};
use crate::error::{OrchestrationError, TaskError};
use crate::task::{TaskRegistry, TaskStatusRecord};
use crate::user_function::UserFn;
use crate::worker_manager::WorkerManager;
use std::marker::PhantomData;
use tokio::sync::mpsc;

/// Session-scoped orchestrator: splits input through the distribution
/// strategy, fans one task per chunk out to the worker manager, collects
/// completions into the task registry, and returns results in chunk order.
pub struct Master<'m, T, R, M, S>
where
    M: WorkerManager<T, R>,
    S: DistributionStrategy<T>,
    T: Send + 'static,
    R: Send + 'static,
{
    manager: &'m M,
    strategy: S,
    registry: TaskRegistry<R>,
    _items: PhantomData<fn(T)>,
}

impl<'m, T, R, M> Master<'m, T, R, M, ListDistributionStrategy>
where
    M: WorkerManager<T, R>,
    T: Send + 'static,
    R: Clone + Send + 'static,
{
    /// Master with the default equal-size split.
    pub fn with_equal_split(manager: &'m M) -> Self {
        Self::new(manager, ListDistributionStrategy)
    }
}

impl<'m, T, R, M, S> Master<'m, T, R, M, S>
where
    M: WorkerManager<T, R>,
    S: DistributionStrategy<T>,
    T: Send + 'static,
    R: Clone + Send + 'static,
{
    pub fn new(manager: &'m M, strategy: S) -> Self {
        Self {
            manager,
            strategy,
            registry: TaskRegistry::new(),
            _items: PhantomData,
        }
    }

    /// Process `data_input` by fanning chunks out to the worker manager.
    ///
    /// Returns one slot per chunk, in chunk order: the computed value, or the
    /// captured error for the chunks whose dispatch or execution failed. A
    /// failing chunk never aborts its siblings; only engine-level faults
    /// (unacquired manager, violated strategy contract) error the run itself.
    pub async fn run(
        &mut self,
        data_input: Vec<T>,
        user_function: UserFn<T, R>,
    ) -> Result<Vec<Result<R, TaskError>>, OrchestrationError> {
        if !self.manager.is_acquired() {
            return Err(OrchestrationError::ManagerNotAcquired);
        }

        let chunks = self
            .strategy
            .split(data_input, self.manager.worker_count())
            .map_err(OrchestrationError::Strategy)?;
        let chunk_count = chunks.len();
        self.registry.reset();

        // Fan-out: submit every chunk without waiting on earlier ones to
        // resolve. A failed dispatch is recorded and the loop moves on.
        let mut outstanding = Vec::with_capacity(chunk_count);
        for chunk in chunks {
            let chunk_index = chunk.index;
            self.registry.create_task(chunk_index);
            match self.manager.submit(&user_function, chunk).await {
                Ok(handle) => {
                    self.registry.mark_submitted(chunk_index);
                    outstanding.push((chunk_index, handle));
                }
                Err(error) => {
                    self.registry.mark_submission_failed(chunk_index, error);
                }
            }
        }

        // Barrier: funnel every resolving handle through one completion
        // channel and record outcomes in whatever order they finish.
        let (complete_tx, mut complete_rx) = mpsc::channel(chunk_count.max(1));
        let mut in_flight = 0usize;
        for (chunk_index, handle) in outstanding {
            let tx = complete_tx.clone();
            tokio::spawn(async move {
                let outcome = handle.outcome().await;
                let _ = tx.send((chunk_index, outcome)).await;
            });
            in_flight += 1;
        }
        drop(complete_tx);

        while in_flight > 0 {
            match complete_rx.recv().await {
                Some((chunk_index, Ok(value))) => {
                    self.registry.mark_completed(chunk_index, value);
                    in_flight -= 1;
                }
                Some((chunk_index, Err(error))) => {
                    self.registry.mark_failed(chunk_index, error);
                    in_flight -= 1;
                }
                None => break,
            }
        }

        if self.registry.len() != chunk_count {
            return Err(OrchestrationError::TaskCountMismatch {
                chunks: chunk_count,
                tasks: self.registry.len(),
            });
        }
        self.registry
            .ordered_results()
            .map_err(|chunk_index| OrchestrationError::IncompleteTask { chunk_index })
    }

    /// Non-blocking snapshot of the current task registry. Safe to call
    /// during or after `run()` (see [`Master::task_registry`] for observing a
    /// run in flight).
    pub fn get_task_statuses(&self) -> Vec<TaskStatusRecord<R>> {
        self.registry.snapshot()
    }

    /// Shared handle to the run's registry, for observers that want status
    /// snapshots while `run()` holds the master mutably.
    pub fn task_registry(&self) -> TaskRegistry<R> {
        self.registry.clone()
    }

    /// Apply `reduce_function` to the result sequence exactly as given.
    ///
    /// This performs no fault filtering: callers drop failed slots themselves
    /// before reducing the successful subset.
    pub fn reduce<V, A, F>(&self, results: Vec<V>, reduce_function: F) -> A
    where
        F: FnOnce(Vec<V>) -> A,
    {
        reduce_function(results)
    }
}
