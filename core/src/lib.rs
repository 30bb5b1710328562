// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

pub mod chunk;
pub mod config;
pub mod distribution_strategy;
pub mod error;
pub mod local_worker_manager;
pub mod master;
pub mod task;
pub mod user_function;
pub mod worker_manager;
