// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::error::Error;
use std::fmt;

/// Invalid engine configuration: worker counts, strategy parameters,
/// endpoint store contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationError {
    pub message: String,
}

impl ConfigurationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration: {}", self.message)
    }
}

impl Error for ConfigurationError {}

/// Why the worker manager rejected a task at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionErrorKind {
    /// The endpoint or pool could not be reached
    Network,
    /// The endpoint refused the caller's credentials
    Auth,
    /// The chunk payload could not be encoded for transport
    Serialization,
    /// The manager or endpoint declined the task (unknown function, unacquired pool)
    Rejected,
}

impl SubmissionErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            SubmissionErrorKind::Network => "network",
            SubmissionErrorKind::Auth => "auth",
            SubmissionErrorKind::Serialization => "serialization",
            SubmissionErrorKind::Rejected => "rejected",
        }
    }
}

/// Dispatch-time failure. The task never reached a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionError {
    pub kind: SubmissionErrorKind,
    pub message: String,
}

impl SubmissionError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: SubmissionErrorKind::Network,
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self {
            kind: SubmissionErrorKind::Auth,
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self {
            kind: SubmissionErrorKind::Serialization,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            kind: SubmissionErrorKind::Rejected,
            message: message.into(),
        }
    }
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "submission failed ({}): {}", self.kind.label(), self.message)
    }
}

impl Error for SubmissionError {}

/// The user function failed while running on a worker, or the worker was lost
/// after the task had been dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionError {
    pub message: String,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "execution failed: {}", self.message)
    }
}

impl Error for ExecutionError {}

/// Per-task error marker stored in the registry and surfaced in result slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    Submission(SubmissionError),
    Execution(ExecutionError),
}

impl TaskError {
    /// Short kind label for status reporting.
    pub fn kind_label(&self) -> &'static str {
        match self {
            TaskError::Submission(e) => e.kind.label(),
            TaskError::Execution(_) => "execution",
        }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::Submission(e) => e.fmt(f),
            TaskError::Execution(e) => e.fmt(f),
        }
    }
}

impl Error for TaskError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TaskError::Submission(e) => Some(e),
            TaskError::Execution(e) => Some(e),
        }
    }
}

/// Engine-level fault. Unlike per-task errors this aborts the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestrationError {
    /// `run()` was called while the worker manager was not acquired
    ManagerNotAcquired,
    /// The distribution strategy rejected its parameters
    Strategy(ConfigurationError),
    /// Registry bookkeeping diverged from the chunk count
    TaskCountMismatch { chunks: usize, tasks: usize },
    /// A task never reached a terminal state before result assembly
    IncompleteTask { chunk_index: usize },
}

impl fmt::Display for OrchestrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestrationError::ManagerNotAcquired => {
                write!(f, "worker manager is not acquired")
            }
            OrchestrationError::Strategy(e) => {
                write!(f, "distribution strategy rejected the run: {}", e)
            }
            OrchestrationError::TaskCountMismatch { chunks, tasks } => {
                write!(f, "task count {} does not match chunk count {}", tasks, chunks)
            }
            OrchestrationError::IncompleteTask { chunk_index } => {
                write!(f, "task for chunk {} never reached a terminal state", chunk_index)
            }
        }
    }
}

impl Error for OrchestrationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            OrchestrationError::Strategy(e) => Some(e),
            _ => None,
        }
    }
}
