// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::{ExecutionError, SubmissionError, TaskError};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Lifecycle of one dispatched unit of work.
///
/// `Pending -> Submitted -> Completed | Failed`, or
/// `Pending -> SubmissionFailed`. The three right-hand states are terminal
/// and never change again for the rest of the run.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskState<R> {
    Pending,
    Submitted,
    Completed(R),
    Failed(ExecutionError),
    SubmissionFailed(SubmissionError),
}

impl<R> TaskState<R> {
    pub fn label(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Submitted => "submitted",
            TaskState::Completed(_) => "completed",
            TaskState::Failed(_) => "failed",
            TaskState::SubmissionFailed(_) => "submission_failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed(_) | TaskState::Failed(_) | TaskState::SubmissionFailed(_)
        )
    }
}

/// One unit of dispatched work, tied to a chunk.
#[derive(Debug, Clone)]
pub struct Task<R> {
    pub id: String,
    pub chunk_index: usize,
    pub state: TaskState<R>,
    pub submitted_at: Option<SystemTime>,
}

impl<R> Task<R> {
    fn new(chunk_index: usize) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chunk_index,
            state: TaskState::Pending,
            submitted_at: None,
        }
    }
}

/// Status snapshot exposed to reporting layers.
#[derive(Debug, Clone)]
pub struct TaskStatusRecord<R> {
    pub id: String,
    pub chunk_index: usize,
    pub status: &'static str,
    pub result: Option<R>,
    pub error: Option<TaskError>,
}

/// Per-run collection of task records.
///
/// Shared so status snapshots stay available while `run()` is in flight. All
/// writes funnel through the master's completion loop; the mutex only guards
/// against snapshots racing those writes.
#[derive(Clone)]
pub struct TaskRegistry<R> {
    tasks: Arc<Mutex<Vec<Task<R>>>>,
}

impl<R> Default for TaskRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> TaskRegistry<R> {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().unwrap().is_empty()
    }

    pub(crate) fn reset(&self) {
        self.tasks.lock().unwrap().clear();
    }

    /// Create a pending task for the chunk. Tasks are created in chunk order,
    /// so the vector position equals the chunk index.
    pub(crate) fn create_task(&self, chunk_index: usize) -> String {
        let mut tasks = self.tasks.lock().unwrap();
        debug_assert_eq!(tasks.len(), chunk_index);
        let task = Task::new(chunk_index);
        let id = task.id.clone();
        tasks.push(task);
        id
    }

    pub(crate) fn mark_submitted(&self, chunk_index: usize) {
        let mut tasks = self.tasks.lock().unwrap();
        let task = &mut tasks[chunk_index];
        if matches!(task.state, TaskState::Pending) {
            task.state = TaskState::Submitted;
            task.submitted_at = Some(SystemTime::now());
        }
    }

    pub(crate) fn mark_submission_failed(&self, chunk_index: usize, error: SubmissionError) {
        let mut tasks = self.tasks.lock().unwrap();
        let task = &mut tasks[chunk_index];
        if matches!(task.state, TaskState::Pending) {
            task.state = TaskState::SubmissionFailed(error);
        }
    }

    pub(crate) fn mark_completed(&self, chunk_index: usize, value: R) {
        let mut tasks = self.tasks.lock().unwrap();
        let task = &mut tasks[chunk_index];
        if matches!(task.state, TaskState::Submitted) {
            task.state = TaskState::Completed(value);
        }
    }

    pub(crate) fn mark_failed(&self, chunk_index: usize, error: ExecutionError) {
        let mut tasks = self.tasks.lock().unwrap();
        let task = &mut tasks[chunk_index];
        if matches!(task.state, TaskState::Submitted) {
            task.state = TaskState::Failed(error);
        }
    }
}

impl<R: Clone> TaskRegistry<R> {
    /// Non-blocking snapshot of every task's current status.
    pub fn snapshot(&self) -> Vec<TaskStatusRecord<R>> {
        let tasks = self.tasks.lock().unwrap();
        tasks
            .iter()
            .map(|task| {
                let (result, error) = match &task.state {
                    TaskState::Completed(value) => (Some(value.clone()), None),
                    TaskState::Failed(e) => (None, Some(TaskError::Execution(e.clone()))),
                    TaskState::SubmissionFailed(e) => {
                        (None, Some(TaskError::Submission(e.clone())))
                    }
                    _ => (None, None),
                };
                TaskStatusRecord {
                    id: task.id.clone(),
                    chunk_index: task.chunk_index,
                    status: task.state.label(),
                    result,
                    error,
                }
            })
            .collect()
    }

    /// Read back one slot per task in chunk order. A task still short of a
    /// terminal state is an engine invariant violation, reported by index.
    pub(crate) fn ordered_results(&self) -> Result<Vec<Result<R, TaskError>>, usize> {
        let tasks = self.tasks.lock().unwrap();
        tasks
            .iter()
            .map(|task| match &task.state {
                TaskState::Completed(value) => Ok(Ok(value.clone())),
                TaskState::Failed(e) => Ok(Err(TaskError::Execution(e.clone()))),
                TaskState::SubmissionFailed(e) => Ok(Err(TaskError::Submission(e.clone()))),
                TaskState::Pending | TaskState::Submitted => Err(task.chunk_index),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_do_not_regress() {
        // Arrange
        let registry: TaskRegistry<i64> = TaskRegistry::new();
        registry.create_task(0);
        registry.mark_submitted(0);
        registry.mark_completed(0, 42);

        // Act: late signals for an already-terminal task are dropped
        registry.mark_failed(0, ExecutionError::new("late failure"));

        // Assert
        let snapshot = registry.snapshot();
        assert_eq!(snapshot[0].status, "completed");
        assert_eq!(snapshot[0].result, Some(42));
    }

    #[test]
    fn submission_failure_skips_submitted() {
        // Arrange
        let registry: TaskRegistry<i64> = TaskRegistry::new();
        registry.create_task(0);

        // Act
        registry.mark_submission_failed(0, SubmissionError::network("unreachable"));

        // Assert: terminal straight from pending, execution outcomes ignored
        registry.mark_completed(0, 1);
        let snapshot = registry.snapshot();
        assert_eq!(snapshot[0].status, "submission_failed");
        assert!(snapshot[0].result.is_none());
        assert!(snapshot[0].error.is_some());
    }

    #[test]
    fn ordered_results_flags_incomplete_tasks() {
        // Arrange
        let registry: TaskRegistry<i64> = TaskRegistry::new();
        registry.create_task(0);
        registry.create_task(1);
        registry.mark_submitted(0);
        registry.mark_completed(0, 7);
        registry.mark_submitted(1);

        // Act / Assert
        assert_eq!(registry.ordered_results(), Err(1));
    }
}
