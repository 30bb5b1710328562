// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Parallelism of the local worker pool
    pub num_workers: usize,
    /// Path of the persisted endpoint store used by remote runs
    #[serde(default = "default_endpoint_store_path")]
    pub endpoint_store_path: String,
    /// Per-task deadline for remote invocations in milliseconds (0 = no deadline)
    #[serde(default)]
    pub request_timeout_ms: u64,
}

fn default_endpoint_store_path() -> String {
    "endpoints.json".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_workers: 4,
            endpoint_store_path: default_endpoint_store_path(),
            request_timeout_ms: 0,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn print_summary(&self) {
        println!("Configuration:");
        println!("  Workers: {}", self.num_workers);
        println!("  Endpoint store: {}", self.endpoint_store_path);
        if self.request_timeout_ms > 0 {
            println!("  Request timeout: {}ms", self.request_timeout_ms);
        }
    }
}
