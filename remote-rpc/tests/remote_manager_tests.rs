// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use mwfaas_core::error::{SubmissionErrorKind, TaskError};
use mwfaas_core::master::Master;
use mwfaas_core::user_function::{user_fn, UserFn};
use mwfaas_core::worker_manager::{ManagedPool, PoolGuard};
use mwfaas_remote_rpc::endpoint_server;
use mwfaas_remote_rpc::endpoint_store::{EndpointConfig, EndpointStore};
use mwfaas_remote_rpc::function_registry::FunctionRegistry;
use mwfaas_remote_rpc::remote_worker_manager::RemoteWorkerManager;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;

fn sum_chunk() -> UserFn<i64, i64> {
    user_fn("sum_chunk", |items: Vec<i64>| Ok(items.iter().sum::<i64>()))
}

fn flaky_sum() -> UserFn<i64, i64> {
    user_fn("flaky_sum", |items: Vec<i64>| {
        if items.contains(&3) {
            return Err("cannot handle 3".into());
        }
        Ok(items.iter().sum::<i64>())
    })
}

fn demo_registry() -> FunctionRegistry {
    let registry = FunctionRegistry::new();
    registry.register(sum_chunk());
    registry.register(flaky_sum());
    registry
}

/// Serve a demo endpoint on an ephemeral port; the token stops it.
async fn start_endpoint(auth_token: Option<String>) -> (SocketAddr, CancellationToken) {
    let shutdown = CancellationToken::new();
    let addr = "127.0.0.1:0".parse().unwrap();
    let (local_addr, _server) =
        endpoint_server::serve(demo_registry(), auth_token, addr, shutdown.clone())
            .await
            .expect("failed to bind test endpoint");
    (local_addr, shutdown)
}

/// Persist an endpoint store under a unique temp path.
fn temp_store(endpoints: &[EndpointConfig]) -> EndpointStore {
    let path = std::env::temp_dir().join(format!("mwfaas-endpoints-{}.json", uuid::Uuid::new_v4()));
    let store = EndpointStore::new(path);
    store.save(endpoints).expect("failed to write test store");
    store
}

fn endpoint(name: &str, addr: SocketAddr) -> EndpointConfig {
    EndpointConfig {
        name: name.to_string(),
        addr: addr.to_string(),
        auth_token: None,
    }
}

#[tokio::test]
async fn test_remote_run_end_to_end() {
    // Arrange: two live endpoints
    let (addr_a, stop_a) = start_endpoint(None).await;
    let (addr_b, stop_b) = start_endpoint(None).await;
    let store = temp_store(&[endpoint("worker-a", addr_a), endpoint("worker-b", addr_b)]);
    let manager = RemoteWorkerManager::new(store);
    let _session = PoolGuard::acquire(&manager).await.unwrap();
    let mut master = Master::with_equal_split(&manager);

    // Act
    let results = master.run(vec![1, 2, 3, 4, 5, 6], sum_chunk()).await.unwrap();

    // Assert: chunks [1,2,3] and [4,5,6], one per endpoint
    assert_eq!(manager.worker_count(), 2);
    assert_eq!(results, vec![Ok(6), Ok(15)]);
    let statuses = master.get_task_statuses();
    assert!(statuses.iter().all(|s| s.status == "completed"));

    stop_a.cancel();
    stop_b.cancel();
}

#[tokio::test]
async fn test_unreachable_endpoint_does_not_poison_siblings() {
    // Arrange: endpoint 2 of 3 has nobody listening
    let (addr_a, stop_a) = start_endpoint(None).await;
    let (addr_b, stop_b) = start_endpoint(None).await;
    let dead: SocketAddr = "127.0.0.1:1".parse().unwrap();
    let store = temp_store(&[
        endpoint("worker-a", addr_a),
        endpoint("worker-b", addr_b),
        endpoint("worker-dead", dead),
    ]);
    let manager = RemoteWorkerManager::new(store);
    let _session = PoolGuard::acquire(&manager).await.unwrap();
    let mut master = Master::with_equal_split(&manager);

    // Act
    let results = master.run(vec![1, 2, 3, 4, 5, 6], sum_chunk()).await.unwrap();

    // Assert: slot 2 failed at submission, slots 0 and 1 completed
    assert_eq!(results.len(), 3);
    assert_eq!(results[0], Ok(3));
    assert_eq!(results[1], Ok(7));
    match &results[2] {
        Err(TaskError::Submission(error)) => {
            assert_eq!(error.kind, SubmissionErrorKind::Network)
        }
        other => panic!("expected a submission failure, got {:?}", other),
    }

    let statuses = master.get_task_statuses();
    assert_eq!(statuses[0].status, "completed");
    assert_eq!(statuses[1].status, "completed");
    assert_eq!(statuses[2].status, "submission_failed");
    assert!(statuses[2].error.is_some());

    stop_a.cancel();
    stop_b.cancel();
}

#[tokio::test]
async fn test_remote_execution_failure_is_captured() {
    // Arrange
    let (addr, stop) = start_endpoint(None).await;
    let store = temp_store(&[endpoint("worker-a", addr)]);
    let manager = RemoteWorkerManager::new(store);
    let _session = PoolGuard::acquire(&manager).await.unwrap();
    let mut master = Master::with_equal_split(&manager);

    // Act: one endpoint, one chunk, and it fails on the worker
    let results = master.run(vec![1, 2, 3], flaky_sum()).await.unwrap();

    // Assert
    assert_eq!(results.len(), 1);
    match &results[0] {
        Err(TaskError::Execution(error)) => {
            assert!(error.message.contains("cannot handle 3"))
        }
        other => panic!("expected an execution failure, got {:?}", other),
    }
    assert_eq!(master.get_task_statuses()[0].status, "failed");

    stop.cancel();
}

#[tokio::test]
async fn test_unknown_function_is_rejected_at_dispatch() {
    // Arrange
    let (addr, stop) = start_endpoint(None).await;
    let store = temp_store(&[endpoint("worker-a", addr)]);
    let manager = RemoteWorkerManager::new(store);
    let _session = PoolGuard::acquire(&manager).await.unwrap();
    let mut master = Master::with_equal_split(&manager);
    let unregistered = user_fn("not_registered", |items: Vec<i64>| {
        Ok(items.iter().sum::<i64>())
    });

    // Act
    let results = master.run(vec![1, 2, 3], unregistered).await.unwrap();

    // Assert
    match &results[0] {
        Err(TaskError::Submission(error)) => {
            assert_eq!(error.kind, SubmissionErrorKind::Rejected)
        }
        other => panic!("expected a submission failure, got {:?}", other),
    }

    stop.cancel();
}

#[tokio::test]
async fn test_endpoint_auth_token_is_enforced() {
    // Arrange: the endpoint requires a token the store does not carry
    let (addr, stop) = start_endpoint(Some("secret-token".to_string())).await;
    let store = temp_store(&[endpoint("worker-a", addr)]);
    let manager = RemoteWorkerManager::new(store);
    let _session = PoolGuard::acquire(&manager).await.unwrap();
    let mut master = Master::with_equal_split(&manager);

    // Act
    let results = master.run(vec![1, 2, 3], sum_chunk()).await.unwrap();

    // Assert
    match &results[0] {
        Err(TaskError::Submission(error)) => {
            assert_eq!(error.kind, SubmissionErrorKind::Auth)
        }
        other => panic!("expected an auth failure, got {:?}", other),
    }

    stop.cancel();
}

#[tokio::test]
async fn test_endpoint_auth_token_round_trip() {
    // Arrange: store and endpoint agree on the token
    let (addr, stop) = start_endpoint(Some("secret-token".to_string())).await;
    let store = temp_store(&[EndpointConfig {
        name: "worker-a".to_string(),
        addr: addr.to_string(),
        auth_token: Some("secret-token".to_string()),
    }]);
    let manager = RemoteWorkerManager::new(store);
    let _session = PoolGuard::acquire(&manager).await.unwrap();
    let mut master = Master::with_equal_split(&manager);

    // Act
    let results = master.run(vec![1, 2, 3], sum_chunk()).await.unwrap();

    // Assert
    assert_eq!(results, vec![Ok(6)]);

    stop.cancel();
}

#[tokio::test]
async fn test_acquire_fails_without_a_store() {
    // Arrange: a path nothing was ever written to
    let path = std::env::temp_dir().join(format!("mwfaas-missing-{}.json", uuid::Uuid::new_v4()));
    let manager = RemoteWorkerManager::new(EndpointStore::new(path));

    // Act / Assert
    assert!(manager.acquire().await.is_err());
    assert!(!manager.is_acquired());
}

#[tokio::test]
async fn test_store_round_trip() {
    // Arrange
    let endpoints = vec![
        EndpointConfig {
            name: "worker-a".to_string(),
            addr: "127.0.0.1:50061".to_string(),
            auth_token: None,
        },
        EndpointConfig {
            name: "worker-b".to_string(),
            addr: "127.0.0.1:50062".to_string(),
            auth_token: Some("secret-token".to_string()),
        },
    ];

    // Act
    let store = temp_store(&endpoints);

    // Assert
    assert_eq!(store.load().unwrap(), endpoints);
}
