// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use mwfaas_core::task::TaskStatusRecord;
use std::fmt::Display;

/// Print the per-task status table the demos end with.
pub fn print_status_table<R: Display>(statuses: &[TaskStatusRecord<R>]) {
    println!("\n--------------- Task statuses ---------------");
    if statuses.is_empty() {
        println!("No task statuses available.");
        return;
    }
    for status in statuses {
        let mut line = format!(
            "  Task id: {:<38} Chunk: {:<3} Status: {:<20}",
            status.id, status.chunk_index, status.status
        );
        if let Some(result) = &status.result {
            line.push_str(&format!(" Result: {}", result));
        } else if let Some(error) = &status.error {
            line.push_str(&format!(" Error ({})", error.kind_label()));
        }
        println!("{}", line);
    }
}
