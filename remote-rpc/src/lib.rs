// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

pub mod endpoint_server;
pub mod endpoint_store;
pub mod function_registry;
pub mod remote_worker_manager;
pub mod rpc;
