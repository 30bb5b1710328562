// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::chunk::Chunk;
use crate::error::ConfigurationError;
use std::mem;

/// Policy turning input data into ordered chunks.
///
/// Contract shared by every implementation: each input element lands in
/// exactly one chunk, chunk order follows input order, and concatenating the
/// chunks in index order reproduces the input. Empty input yields zero chunks.
pub trait DistributionStrategy<T>: Send + Sync {
    fn split(&self, data: Vec<T>, worker_count: usize) -> Result<Vec<Chunk<T>>, ConfigurationError>;
}

/// Equal-size list splitting into at most `worker_count` chunks.
///
/// When the input does not divide evenly, the leading chunks carry one extra
/// element so sizes differ by at most one.
pub struct ListDistributionStrategy;

impl<T: Send> DistributionStrategy<T> for ListDistributionStrategy {
    fn split(&self, data: Vec<T>, worker_count: usize) -> Result<Vec<Chunk<T>>, ConfigurationError> {
        if worker_count == 0 {
            return Err(ConfigurationError::new("worker count must be at least 1"));
        }
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let chunk_count = worker_count.min(data.len());
        let base = data.len() / chunk_count;
        let extra = data.len() % chunk_count;

        let mut chunks = Vec::with_capacity(chunk_count);
        let mut items = data.into_iter();
        for index in 0..chunk_count {
            let take = base + usize::from(index < extra);
            chunks.push(Chunk::new(index, items.by_ref().take(take).collect()));
        }
        Ok(chunks)
    }
}

/// Size-bounded batching: chunks hold at most `max_chunk_size` elements and
/// the chunk count follows from the input length, not the worker count.
pub struct BatchDistributionStrategy {
    pub max_chunk_size: usize,
}

impl<T: Send> DistributionStrategy<T> for BatchDistributionStrategy {
    fn split(&self, data: Vec<T>, _worker_count: usize) -> Result<Vec<Chunk<T>>, ConfigurationError> {
        if self.max_chunk_size == 0 {
            return Err(ConfigurationError::new("max chunk size must be at least 1"));
        }

        let mut chunks = Vec::new();
        let mut current = Vec::new();
        for item in data {
            current.push(item);
            if current.len() == self.max_chunk_size {
                let index = chunks.len();
                chunks.push(Chunk::new(index, mem::take(&mut current)));
            }
        }
        if !current.is_empty() {
            let index = chunks.len();
            chunks.push(Chunk::new(index, current));
        }
        Ok(chunks)
    }
}

/// Key/partition-based splitting: a new chunk starts wherever the partition
/// key of adjacent elements changes, so contiguity and input order are
/// preserved.
pub struct PartitionDistributionStrategy<F> {
    partition: F,
}

impl<F> PartitionDistributionStrategy<F> {
    pub fn new(partition: F) -> Self {
        Self { partition }
    }
}

impl<T, K, F> DistributionStrategy<T> for PartitionDistributionStrategy<F>
where
    T: Send,
    K: PartialEq,
    F: Fn(&T) -> K + Send + Sync,
{
    fn split(&self, data: Vec<T>, _worker_count: usize) -> Result<Vec<Chunk<T>>, ConfigurationError> {
        let mut chunks: Vec<Chunk<T>> = Vec::new();
        let mut current = Vec::new();
        let mut current_key: Option<K> = None;

        for item in data {
            let key = (self.partition)(&item);
            if current_key.as_ref() != Some(&key) && !current.is_empty() {
                let index = chunks.len();
                chunks.push(Chunk::new(index, mem::take(&mut current)));
            }
            current_key = Some(key);
            current.push(item);
        }
        if !current.is_empty() {
            let index = chunks.len();
            chunks.push(Chunk::new(index, current));
        }
        Ok(chunks)
    }
}
