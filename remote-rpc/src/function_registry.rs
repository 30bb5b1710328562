// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use mwfaas_core::user_function::UserFn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Type-erased handler executing one JSON-encoded chunk.
pub type HandlerFn = Arc<dyn Fn(String) -> Result<String, String> + Send + Sync>;

/// Maps registered function names to the closures that execute them.
///
/// Endpoints register every function they are willing to execute before
/// serving; a submission naming anything else is rejected at dispatch time.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    handlers: Arc<Mutex<HashMap<String, HandlerFn>>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user function under its transport name. The registered
    /// handler does the serde plumbing: decode the chunk items, run the
    /// function, encode the result.
    pub fn register<T, R>(&self, function: UserFn<T, R>)
    where
        T: DeserializeOwned + Send + Sync + 'static,
        R: Serialize + Send + Sync + 'static,
    {
        let name = function.name().to_string();
        let handler: HandlerFn = Arc::new(move |chunk_json: String| {
            let items: Vec<T> = serde_json::from_str(&chunk_json)
                .map_err(|e| format!("cannot decode chunk payload: {}", e))?;
            let value = function.call(items).map_err(|e| e.to_string())?;
            serde_json::to_string(&value).map_err(|e| format!("cannot encode result: {}", e))
        });
        self.handlers.lock().unwrap().insert(name, handler);
    }

    pub fn get(&self, name: &str) -> Option<HandlerFn> {
        self.handlers.lock().unwrap().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.handlers.lock().unwrap().keys().cloned().collect()
    }
}
