// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::function_registry::FunctionRegistry;
use crate::rpc::proto;
use proto::faas_endpoint_server::{FaasEndpoint, FaasEndpointServer};
use proto::{AwaitResultReply, AwaitResultRequest, SubmitTaskReply, SubmitTaskRequest};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::metadata::MetadataMap;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

/// gRPC service executing registered functions on behalf of remote masters.
///
/// `SubmitTask` spawns the execution and answers with a token immediately;
/// `AwaitResult` blocks on that execution's outcome. Results are delivered
/// at most once per token.
pub struct EndpointService {
    registry: FunctionRegistry,
    auth_token: Option<String>,
    running: Arc<Mutex<HashMap<String, oneshot::Receiver<Result<String, String>>>>>,
}

impl EndpointService {
    pub fn new(registry: FunctionRegistry, auth_token: Option<String>) -> Self {
        Self {
            registry,
            auth_token,
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn check_auth(&self, metadata: &MetadataMap) -> Result<(), Status> {
        let Some(expected) = &self.auth_token else {
            return Ok(());
        };
        match metadata.get("authorization").and_then(|v| v.to_str().ok()) {
            Some(token) if token == expected => Ok(()),
            _ => Err(Status::unauthenticated(
                "endpoint requires a valid auth token",
            )),
        }
    }
}

#[tonic::async_trait]
impl FaasEndpoint for EndpointService {
    async fn submit_task(
        &self,
        request: Request<SubmitTaskRequest>,
    ) -> Result<Response<SubmitTaskReply>, Status> {
        self.check_auth(request.metadata())?;
        let req = request.into_inner();

        let handler = self.registry.get(&req.function).ok_or_else(|| {
            Status::not_found(format!("no function named '{}' is registered", req.function))
        })?;

        let task_token = uuid::Uuid::new_v4().to_string();
        let (report, outcome) = oneshot::channel();
        tokio::task::spawn_blocking(move || {
            let _ = report.send(handler(req.chunk_json));
        });
        self.running
            .lock()
            .unwrap()
            .insert(task_token.clone(), outcome);

        Ok(Response::new(SubmitTaskReply { task_token }))
    }

    async fn await_result(
        &self,
        request: Request<AwaitResultRequest>,
    ) -> Result<Response<AwaitResultReply>, Status> {
        self.check_auth(request.metadata())?;
        let task_token = request.into_inner().task_token;

        let outcome = self
            .running
            .lock()
            .unwrap()
            .remove(&task_token)
            .ok_or_else(|| Status::not_found(format!("unknown task token '{}'", task_token)))?;

        let reply = match outcome.await {
            Ok(Ok(result_json)) => AwaitResultReply {
                ok: true,
                result_json,
                error: String::new(),
            },
            Ok(Err(error)) => AwaitResultReply {
                ok: false,
                result_json: String::new(),
                error,
            },
            Err(_) => AwaitResultReply {
                ok: false,
                result_json: String::new(),
                error: "function execution aborted".to_string(),
            },
        };
        Ok(Response::new(reply))
    }
}

/// Bind `addr` and serve the endpoint until the token is cancelled.
///
/// Binding happens before this function returns, so the reported address is
/// connectable immediately; pass port 0 to let the OS pick one.
pub async fn serve(
    registry: FunctionRegistry,
    auth_token: Option<String>,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> Result<(SocketAddr, JoinHandle<Result<(), tonic::transport::Error>>), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    let incoming = TcpListenerStream::new(listener);

    let service = EndpointService::new(registry, auth_token);
    let server = Server::builder()
        .add_service(FaasEndpointServer::new(service))
        .serve_with_incoming_shutdown(incoming, shutdown.cancelled_owned());

    Ok((local_addr, tokio::spawn(server)))
}
