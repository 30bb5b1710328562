// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use mwfaas_core::error::{OrchestrationError, TaskError};
use mwfaas_core::local_worker_manager::LocalWorkerManager;
use mwfaas_core::master::Master;
use mwfaas_core::user_function::{user_fn, UserFn};
use mwfaas_core::worker_manager::{ManagedPool, PoolGuard};

fn sum_chunk() -> UserFn<i64, i64> {
    user_fn("sum_chunk", |items: Vec<i64>| Ok(items.iter().sum::<i64>()))
}

#[tokio::test]
async fn test_run_six_numbers_three_workers() {
    // Arrange
    let manager = LocalWorkerManager::new(3).unwrap();
    let _pool = PoolGuard::acquire(&manager).await.unwrap();
    let mut master = Master::with_equal_split(&manager);

    // Act
    let results = master.run(vec![1, 2, 3, 4, 5, 6], sum_chunk()).await.unwrap();

    // Assert: chunks [1,2] [3,4] [5,6] in chunk order
    let values: Vec<i64> = results.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(values, vec![3, 7, 11]);
    assert_eq!(master.reduce(values, |v| v.iter().sum::<i64>()), 21);
}

#[tokio::test]
async fn test_run_hundred_numbers_reduces_to_5050() {
    // Arrange
    let manager = LocalWorkerManager::new(4).unwrap();
    let _pool = PoolGuard::acquire(&manager).await.unwrap();
    let mut master = Master::with_equal_split(&manager);
    let numbers: Vec<i64> = (1..=100).collect();

    // Act
    let results = master.run(numbers, sum_chunk()).await.unwrap();

    // Assert: four partial sums over 25 elements each
    assert_eq!(results.len(), 4);
    let partial_sums: Vec<i64> = results.into_iter().map(|r| r.unwrap()).collect();
    let total = master.reduce(partial_sums, |v| v.iter().sum::<i64>());
    assert_eq!(total, 5050);
}

#[tokio::test]
async fn test_failing_chunk_does_not_poison_siblings() {
    // Arrange: the function fails only on the chunk holding 3
    let manager = LocalWorkerManager::new(3).unwrap();
    let _pool = PoolGuard::acquire(&manager).await.unwrap();
    let mut master = Master::with_equal_split(&manager);
    let flaky = user_fn("flaky_sum", |items: Vec<i64>| {
        if items.contains(&3) {
            return Err("cannot handle 3".into());
        }
        Ok(items.iter().sum::<i64>())
    });

    // Act
    let results = master.run(vec![1, 2, 3, 4, 5, 6], flaky).await.unwrap();

    // Assert: slot 1 carries the error, the other slots their values
    assert_eq!(results.len(), 3);
    assert_eq!(results[0], Ok(3));
    assert!(matches!(results[1], Err(TaskError::Execution(_))));
    assert_eq!(results[2], Ok(11));
}

#[tokio::test]
async fn test_statuses_are_terminal_after_run() {
    // Arrange
    let manager = LocalWorkerManager::new(3).unwrap();
    let _pool = PoolGuard::acquire(&manager).await.unwrap();
    let mut master = Master::with_equal_split(&manager);
    let flaky = user_fn("flaky_sum", |items: Vec<i64>| {
        if items.contains(&3) {
            return Err("cannot handle 3".into());
        }
        Ok(items.iter().sum::<i64>())
    });

    // Act
    master.run(vec![1, 2, 3, 4, 5, 6], flaky).await.unwrap();
    let statuses = master.get_task_statuses();

    // Assert: one record per chunk, none still pending or submitted
    assert_eq!(statuses.len(), 3);
    assert!(statuses
        .iter()
        .all(|s| s.status != "pending" && s.status != "submitted"));
    assert_eq!(statuses[0].status, "completed");
    assert_eq!(statuses[0].result, Some(3));
    assert_eq!(statuses[1].status, "failed");
    assert!(statuses[1].error.is_some());
    assert_eq!(statuses[2].status, "completed");

    // Task ids are unique per run
    assert_ne!(statuses[0].id, statuses[1].id);
    assert_ne!(statuses[1].id, statuses[2].id);
}

#[tokio::test]
async fn test_run_with_unacquired_manager_fails() {
    // Arrange: no guard, the pool was never acquired
    let manager = LocalWorkerManager::new(3).unwrap();
    let mut master = Master::with_equal_split(&manager);

    // Act
    let result = master.run(vec![1, 2, 3], sum_chunk()).await;

    // Assert
    assert_eq!(result.unwrap_err(), OrchestrationError::ManagerNotAcquired);
}

#[tokio::test]
async fn test_run_with_empty_input_returns_no_results() {
    // Arrange
    let manager = LocalWorkerManager::new(3).unwrap();
    let _pool = PoolGuard::acquire(&manager).await.unwrap();
    let mut master = Master::with_equal_split(&manager);

    // Act
    let results = master.run(Vec::new(), sum_chunk()).await.unwrap();

    // Assert
    assert!(results.is_empty());
    assert!(master.get_task_statuses().is_empty());
}

#[tokio::test]
async fn test_second_run_resets_the_registry() {
    // Arrange
    let manager = LocalWorkerManager::new(2).unwrap();
    let _pool = PoolGuard::acquire(&manager).await.unwrap();
    let mut master = Master::with_equal_split(&manager);
    master.run((1..=8).collect(), sum_chunk()).await.unwrap();
    assert_eq!(master.get_task_statuses().len(), 2);

    // Act: a shorter second run
    let results = master.run(vec![5], sum_chunk()).await.unwrap();

    // Assert: the registry reflects only the latest run
    assert_eq!(results, vec![Ok(5)]);
    assert_eq!(master.get_task_statuses().len(), 1);
}

#[tokio::test]
async fn test_pool_guard_releases_on_drop() {
    // Arrange
    let manager = LocalWorkerManager::new(2).unwrap();

    // Act
    {
        let _pool = PoolGuard::acquire(&manager).await.unwrap();
        assert!(manager.is_acquired());
    }

    // Assert
    assert!(!manager.is_acquired());
}

#[tokio::test]
async fn test_zero_worker_pool_is_rejected() {
    // Act / Assert
    assert!(LocalWorkerManager::new(0).is_err());
}
