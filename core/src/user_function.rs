// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::error::Error;
use std::sync::Arc;

/// Error type user functions report their own failures with.
pub type UserFnError = Box<dyn Error + Send + Sync>;

/// A caller-supplied function applied to one chunk of input.
///
/// The name addresses the function on remote endpoints, `call` runs it in
/// process. For remote execution the item and result types must additionally
/// be serde-serializable to cross the execution boundary.
pub trait UserFunction<T, R>: Send + Sync {
    fn name(&self) -> &str;

    fn call(&self, items: Vec<T>) -> Result<R, UserFnError>;
}

/// Shared handle to a user function, cloneable across concurrent submissions.
pub type UserFn<T, R> = Arc<dyn UserFunction<T, R>>;

/// Adapter turning a closure into a named `UserFunction`.
pub struct NamedFunction<F> {
    name: String,
    function: F,
}

impl<F> NamedFunction<F> {
    pub fn new(name: impl Into<String>, function: F) -> Self {
        Self {
            name: name.into(),
            function,
        }
    }
}

impl<T, R, F> UserFunction<T, R> for NamedFunction<F>
where
    F: Fn(Vec<T>) -> Result<R, UserFnError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, items: Vec<T>) -> Result<R, UserFnError> {
        (self.function)(items)
    }
}

/// Convenience constructor for the common closure case.
pub fn user_fn<T, R, F>(name: impl Into<String>, function: F) -> UserFn<T, R>
where
    F: Fn(Vec<T>) -> Result<R, UserFnError> + Send + Sync + 'static,
{
    Arc::new(NamedFunction::new(name, function))
}
