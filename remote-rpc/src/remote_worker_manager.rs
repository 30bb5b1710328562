// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::endpoint_store::EndpointStore;
use crate::rpc::proto;
use async_trait::async_trait;
use mwfaas_core::chunk::Chunk;
use mwfaas_core::error::{ConfigurationError, ExecutionError, SubmissionError};
use mwfaas_core::user_function::UserFn;
use mwfaas_core::worker_manager::{ManagedPool, TaskHandle, WorkerManager};
use proto::faas_endpoint_client::FaasEndpointClient;
use proto::{AwaitResultRequest, SubmitTaskRequest};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::Channel;
use tonic::{Code, Status};

struct EndpointBinding {
    name: String,
    client: FaasEndpointClient<Channel>,
    auth_token: Option<MetadataValue<Ascii>>,
}

struct Session {
    bindings: Vec<EndpointBinding>,
}

/// Dispatches chunks to external FaaS endpoints over gRPC.
///
/// Endpoint bindings come from the persisted store at acquire time. Channels
/// connect lazily, so an unreachable endpoint surfaces as a submission
/// failure of the task dispatched to it, not as an acquire failure.
pub struct RemoteWorkerManager {
    store: EndpointStore,
    request_timeout: Option<Duration>,
    session: Mutex<Option<Arc<Session>>>,
}

impl RemoteWorkerManager {
    pub fn new(store: EndpointStore) -> Self {
        Self {
            store,
            request_timeout: None,
            session: Mutex::new(None),
        }
    }

    /// Deadline for one remote invocation, measured from dispatch to result.
    /// A task exceeding it fails with a timeout execution error.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    fn session(&self) -> Option<Arc<Session>> {
        self.session.lock().unwrap().clone()
    }
}

#[async_trait]
impl ManagedPool for RemoteWorkerManager {
    async fn acquire(&self) -> Result<(), ConfigurationError> {
        let endpoints = self.store.load()?;
        if endpoints.is_empty() {
            return Err(ConfigurationError::new(format!(
                "endpoint store {} holds no endpoints",
                self.store.path().display()
            )));
        }

        let mut bindings = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            let channel = Channel::from_shared(format!("http://{}", endpoint.addr))
                .map_err(|e| {
                    ConfigurationError::new(format!(
                        "endpoint '{}' has an invalid address '{}': {}",
                        endpoint.name, endpoint.addr, e
                    ))
                })?
                .connect_lazy();
            let auth_token = match &endpoint.auth_token {
                Some(token) => Some(MetadataValue::try_from(token.as_str()).map_err(|_| {
                    ConfigurationError::new(format!(
                        "endpoint '{}' has a malformed auth token",
                        endpoint.name
                    ))
                })?),
                None => None,
            };
            bindings.push(EndpointBinding {
                name: endpoint.name,
                client: FaasEndpointClient::new(channel),
                auth_token,
            });
        }

        *self.session.lock().unwrap() = Some(Arc::new(Session { bindings }));
        Ok(())
    }

    fn release(&self) {
        *self.session.lock().unwrap() = None;
    }

    fn is_acquired(&self) -> bool {
        self.session.lock().unwrap().is_some()
    }

    fn worker_count(&self) -> usize {
        self.session()
            .map(|session| session.bindings.len())
            .unwrap_or(0)
    }
}

impl Drop for RemoteWorkerManager {
    fn drop(&mut self) {
        self.release();
    }
}

#[async_trait]
impl<T, R> WorkerManager<T, R> for RemoteWorkerManager
where
    T: Serialize + Send + 'static,
    R: DeserializeOwned + Send + 'static,
{
    async fn submit(
        &self,
        function: &UserFn<T, R>,
        chunk: Chunk<T>,
    ) -> Result<TaskHandle<R>, SubmissionError> {
        let session = self
            .session()
            .ok_or_else(|| SubmissionError::rejected("remote session is not acquired"))?;

        // Round-robin chunks over the configured endpoints.
        let binding = &session.bindings[chunk.index % session.bindings.len()];

        let chunk_json = serde_json::to_string(&chunk.items).map_err(|e| {
            SubmissionError::serialization(format!("cannot encode chunk {}: {}", chunk.index, e))
        })?;

        let mut request = tonic::Request::new(SubmitTaskRequest {
            function: function.name().to_string(),
            chunk_json,
        });
        if let Some(token) = &binding.auth_token {
            request.metadata_mut().insert("authorization", token.clone());
        }

        // Dispatch round-trip. Failures here never reached a worker.
        let mut client = binding.client.clone();
        let reply = client
            .submit_task(request)
            .await
            .map_err(|status| submission_error(&binding.name, status))?;
        let task_token = reply.into_inner().task_token;

        // Execution resolves later; collect the outcome in the background.
        let (report, handle) = TaskHandle::channel();
        let endpoint = binding.name.clone();
        let auth_token = binding.auth_token.clone();
        let request_timeout = self.request_timeout;
        tokio::spawn(async move {
            let outcome =
                await_result::<R>(client, endpoint, task_token, auth_token, request_timeout).await;
            let _ = report.send(outcome);
        });
        Ok(handle)
    }
}

async fn await_result<R: DeserializeOwned>(
    mut client: FaasEndpointClient<Channel>,
    endpoint: String,
    task_token: String,
    auth_token: Option<MetadataValue<Ascii>>,
    request_timeout: Option<Duration>,
) -> Result<R, ExecutionError> {
    let mut request = tonic::Request::new(AwaitResultRequest { task_token });
    if let Some(token) = auth_token {
        request.metadata_mut().insert("authorization", token);
    }

    let reply = match request_timeout {
        Some(limit) => match tokio::time::timeout(limit, client.await_result(request)).await {
            Ok(reply) => reply,
            Err(_) => {
                return Err(ExecutionError::new(format!(
                    "endpoint '{}' exceeded the {}ms deadline",
                    endpoint,
                    limit.as_millis()
                )))
            }
        },
        None => client.await_result(request).await,
    };

    let reply = reply
        .map_err(|status| {
            ExecutionError::new(format!(
                "endpoint '{}' lost the task: {}",
                endpoint,
                status.message()
            ))
        })?
        .into_inner();

    if reply.ok {
        serde_json::from_str(&reply.result_json).map_err(|e| {
            ExecutionError::new(format!(
                "cannot decode result from endpoint '{}': {}",
                endpoint, e
            ))
        })
    } else {
        Err(ExecutionError::new(reply.error))
    }
}

fn submission_error(endpoint: &str, status: Status) -> SubmissionError {
    let message = format!("endpoint '{}': {}", endpoint, status.message());
    match status.code() {
        Code::Unauthenticated | Code::PermissionDenied => SubmissionError::auth(message),
        Code::NotFound | Code::InvalidArgument => SubmissionError::rejected(message),
        _ => SubmissionError::network(message),
    }
}
