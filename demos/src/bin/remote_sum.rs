// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use clap::{Parser, Subcommand};
use mwfaas_core::config::Config;
use mwfaas_core::master::Master;
use mwfaas_core::user_function::{user_fn, UserFn};
use mwfaas_core::worker_manager::{ManagedPool, PoolGuard};
use mwfaas_demos::print_status_table;
use mwfaas_remote_rpc::endpoint_server;
use mwfaas_remote_rpc::endpoint_store::EndpointStore;
use mwfaas_remote_rpc::function_registry::FunctionRegistry;
use mwfaas_remote_rpc::remote_worker_manager::RemoteWorkerManager;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(author, version, about = "Sum a list of numbers over remote FaaS endpoints")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a FaaS endpoint serving the demo functions
    Serve {
        #[arg(long, default_value_t = 50061)]
        port: u16,
        /// Require this bearer token from submitting masters
        #[arg(long)]
        auth_token: Option<String>,
    },
    /// Interactively configure the endpoint store
    SetEndpoints,
}

fn sum_chunk() -> UserFn<i64, i64> {
    user_fn("sum_chunk", |items: Vec<i64>| Ok(items.iter().sum::<i64>()))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = Config::load("config.json").unwrap_or_default();

    match cli.command {
        Some(Command::Serve { port, auth_token }) => serve_endpoint(port, auth_token).await,
        Some(Command::SetEndpoints) => {
            let store = EndpointStore::new(&config.endpoint_store_path);
            if let Err(error) = store.configure_interactive() {
                eprintln!("endpoint configuration failed: {}", error);
            }
        }
        None => run_master(&config).await,
    }
}

async fn serve_endpoint(port: u16, auth_token: Option<String>) {
    let registry = FunctionRegistry::new();
    registry.register(sum_chunk());
    println!("Registered functions: {:?}", registry.names());

    let shutdown = CancellationToken::new();
    let addr = format!("0.0.0.0:{}", port).parse().expect("invalid port");
    let (local_addr, server) = endpoint_server::serve(registry, auth_token, addr, shutdown.clone())
        .await
        .expect("failed to bind endpoint");
    println!("Endpoint listening on {} (Ctrl+C to stop)", local_addr);

    signal::ctrl_c().await.expect("failed to listen for Ctrl+C");
    println!("\nShutting down endpoint...");
    shutdown.cancel();
    if let Err(error) = server.await.expect("endpoint server task failed") {
        eprintln!("endpoint server error: {}", error);
    }
}

async fn run_master(config: &Config) {
    println!("=== MASTER/WORKER REMOTE SUM ===");

    let numbers: Vec<i64> = (1..=100).collect();
    println!("Input: {} numbers (1 to 100)", numbers.len());

    let store = EndpointStore::new(&config.endpoint_store_path);
    let mut manager = RemoteWorkerManager::new(store);
    if config.request_timeout_ms > 0 {
        manager = manager.with_request_timeout(Duration::from_millis(config.request_timeout_ms));
    }

    let _session = match PoolGuard::acquire(&manager).await {
        Ok(guard) => guard,
        Err(error) => {
            eprintln!("cannot acquire remote session: {}", error);
            eprintln!("hint: run `remote_sum set-endpoints` first");
            return;
        }
    };

    let mut master = Master::with_equal_split(&manager);
    println!("Target parallelism: {} endpoint(s)", manager.worker_count());

    println!("\nRunning...");
    match master.run(numbers, sum_chunk()).await {
        Ok(results) => {
            println!("\n--------------- Results ---------------");
            let mut partial_sums = Vec::new();
            for (index, result) in results.iter().enumerate() {
                match result {
                    Ok(value) => {
                        println!("Chunk {}: {}", index, value);
                        partial_sums.push(*value);
                    }
                    Err(error) => println!("Chunk {} FAILED: {}", index, error),
                }
            }
            let total = master.reduce(partial_sums, |values| values.iter().sum::<i64>());
            println!("\nAggregated total: {}", total);
        }
        Err(error) => eprintln!("master.run failed: {}", error),
    }

    print_status_table(&master.get_task_statuses());
    println!("\nDone.");
}
