// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use mwfaas_core::local_worker_manager::LocalWorkerManager;
use mwfaas_core::master::Master;
use mwfaas_core::user_function::user_fn;
use mwfaas_core::worker_manager::{ManagedPool, PoolGuard};
use mwfaas_demos::print_status_table;

#[tokio::main]
async fn main() {
    println!("=== MASTER/WORKER LOCAL SUM ===");

    // 1..=100, total 5050
    let numbers: Vec<i64> = (1..=100).collect();
    println!("Input: {} numbers (1 to 100)", numbers.len());

    let num_workers = 6;
    println!("Local pool with {} workers", num_workers);
    let manager = LocalWorkerManager::new(num_workers).expect("invalid worker count");
    let _pool = PoolGuard::acquire(&manager)
        .await
        .expect("failed to acquire local pool");

    let mut master = Master::with_equal_split(&manager);
    println!("Target parallelism: {}", manager.worker_count());

    let sum_chunk = user_fn("sum_chunk", |items: Vec<i64>| Ok(items.iter().sum::<i64>()));

    println!("\nRunning...");
    match master.run(numbers, sum_chunk).await {
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
            if total == 5050 {
                println!("Total check: CORRECT (5050)");
            } else {
                println!("Total check: INCORRECT (expected 5050, got {})", total);
            }
        }
        Err(error) => eprintln!("master.run failed: {}", error),
    }

    print_status_table(&master.get_task_statuses());
    println!("\nDone.");
}
