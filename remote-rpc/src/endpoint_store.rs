// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use mwfaas_core::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// One remote endpoint binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Logical worker identifier
    pub name: String,
    /// host:port of the endpoint's gRPC listener
    pub addr: String,
    /// Bearer token the endpoint expects, if it enforces one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

/// Persisted mapping from logical worker identifiers to endpoint addresses
/// and credentials. Read by the remote worker manager at acquire time; the
/// master and the distribution strategies never touch it.
pub struct EndpointStore {
    path: PathBuf,
}

impl EndpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<EndpointConfig>, ConfigurationError> {
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            ConfigurationError::new(format!(
                "cannot read endpoint store {}: {}",
                self.path.display(),
                e
            ))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            ConfigurationError::new(format!(
                "endpoint store {} is malformed: {}",
                self.path.display(),
                e
            ))
        })
    }

    pub fn save(&self, endpoints: &[EndpointConfig]) -> Result<(), ConfigurationError> {
        let contents = serde_json::to_string_pretty(endpoints).map_err(|e| {
            ConfigurationError::new(format!("cannot encode endpoint store: {}", e))
        })?;
        fs::write(&self.path, contents).map_err(|e| {
            ConfigurationError::new(format!(
                "cannot write endpoint store {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Interactive configuration flow: read endpoint bindings from stdin,
    /// one per line as `name addr [auth-token]`, and persist them. An empty
    /// line finishes the input.
    pub fn configure_interactive(&self) -> Result<Vec<EndpointConfig>, Box<dyn std::error::Error>> {
        println!("Enter endpoints as: <name> <host:port> [auth-token]");
        println!("Finish with an empty line.");

        let stdin = io::stdin();
        let mut endpoints = Vec::new();
        loop {
            print!("endpoint> ");
            io::stdout().flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim();
            if line.is_empty() {
                break;
            }

            let mut parts = line.split_whitespace();
            let (name, addr) = match (parts.next(), parts.next()) {
                (Some(name), Some(addr)) => (name.to_string(), addr.to_string()),
                _ => {
                    eprintln!("expected at least <name> <host:port>, got '{}'", line);
                    continue;
                }
            };
            endpoints.push(EndpointConfig {
                name,
                addr,
                auth_token: parts.next().map(str::to_string),
            });
        }

        self.save(&endpoints)?;
        println!(
            "Saved {} endpoint(s) to {}",
            endpoints.len(),
            self.path.display()
        );
        Ok(endpoints)
    }
}
