// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::chunk::Chunk;
use crate::error::{ConfigurationError, ExecutionError, SubmissionError};
use crate::user_function::UserFn;
use crate::worker_manager::{ManagedPool, TaskHandle, WorkerManager};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task;

/// In-process worker pool.
///
/// Execution happens on tokio's blocking thread pool; a semaphore holds the
/// number of concurrently running user functions at the configured
/// parallelism. Releasing the pool does not cancel work already dispatched.
pub struct LocalWorkerManager {
    worker_count: usize,
    slots: Mutex<Option<Arc<Semaphore>>>,
}

impl LocalWorkerManager {
    pub fn new(worker_count: usize) -> Result<Self, ConfigurationError> {
        if worker_count == 0 {
            return Err(ConfigurationError::new("worker count must be at least 1"));
        }
        Ok(Self {
            worker_count,
            slots: Mutex::new(None),
        })
    }
}

#[async_trait]
impl ManagedPool for LocalWorkerManager {
    async fn acquire(&self) -> Result<(), ConfigurationError> {
        let mut slots = self.slots.lock().unwrap();
        if slots.is_none() {
            *slots = Some(Arc::new(Semaphore::new(self.worker_count)));
        }
        Ok(())
    }

    fn release(&self) {
        *self.slots.lock().unwrap() = None;
    }

    fn is_acquired(&self) -> bool {
        self.slots.lock().unwrap().is_some()
    }

    fn worker_count(&self) -> usize {
        self.worker_count
    }
}

impl Drop for LocalWorkerManager {
    fn drop(&mut self) {
        self.release();
    }
}

#[async_trait]
impl<T, R> WorkerManager<T, R> for LocalWorkerManager
where
    T: Send + 'static,
    R: Send + 'static,
{
    async fn submit(
        &self,
        function: &UserFn<T, R>,
        chunk: Chunk<T>,
    ) -> Result<TaskHandle<R>, SubmissionError> {
        let slots = match self.slots.lock().unwrap().as_ref() {
            Some(slots) => slots.clone(),
            None => return Err(SubmissionError::rejected("worker pool is not acquired")),
        };

        let function = function.clone();
        let (report, handle) = TaskHandle::channel();
        task::spawn(async move {
            // Hold one worker slot for the whole execution.
            let _slot = match slots.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    let _ = report.send(Err(ExecutionError::new("worker pool shut down mid-run")));
                    return;
                }
            };
            let outcome = match task::spawn_blocking(move || function.call(chunk.items)).await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(error)) => Err(ExecutionError::new(error.to_string())),
                Err(join_error) if join_error.is_panic() => {
                    Err(ExecutionError::new("user function panicked"))
                }
                Err(join_error) => Err(ExecutionError::new(join_error.to_string())),
            };
            let _ = report.send(outcome);
        });
        Ok(handle)
    }
}
