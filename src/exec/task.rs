// src/exec/task.rs

//! Typed task adapter.
//!
//! A [`Task`] bundles a display name, the declared input kinds, and an async
//! body. There are exactly two body shapes:
//!
//! - [`Task::infallible`]: the body yields a [`Value`].
//! - [`Task::fallible`]: the body yields `anyhow::Result<Value>`; an `Err`
//!   becomes the node's `TaskFailure`.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::types::{Value, ValueKind};

pub type TaskFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

type InfallibleFn = dyn Fn(Vec<Value>) -> TaskFuture<Value> + Send + Sync;
type FallibleFn = dyn Fn(Vec<Value>) -> TaskFuture<anyhow::Result<Value>> + Send + Sync;

#[derive(Clone)]
enum Body {
    Infallible(Arc<InfallibleFn>),
    Fallible(Arc<FallibleFn>),
}

/// A registrable unit of work.
#[derive(Clone)]
pub struct Task {
    name: Arc<str>,
    inputs: Arc<[ValueKind]>,
    body: Body,
}

/// Why arguments could not be passed to a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallShapeError {
    Arity { expected: usize, got: usize },
    Kind {
        slot: usize,
        expected: ValueKind,
        got: ValueKind,
    },
}

impl fmt::Display for CallShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallShapeError::Arity { expected, got } => {
                write!(f, "expected {expected} arguments, got {got}")
            }
            CallShapeError::Kind {
                slot,
                expected,
                got,
            } => write!(f, "argument {slot} should be {expected}, got {got}"),
        }
    }
}

impl Task {
    /// Task whose body always produces a value.
    pub fn infallible<F, Fut>(
        name: impl Into<String>,
        inputs: impl IntoIterator<Item = ValueKind>,
        f: F,
    ) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Value> + Send + 'static,
    {
        let body: Arc<InfallibleFn> =
            Arc::new(move |args| -> TaskFuture<Value> { Box::pin(f(args)) });
        Self::with_body(name, inputs, Body::Infallible(body))
    }

    /// Task whose body produces a value or a failure.
    pub fn fallible<F, Fut>(
        name: impl Into<String>,
        inputs: impl IntoIterator<Item = ValueKind>,
        f: F,
    ) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        let body: Arc<FallibleFn> =
            Arc::new(move |args| -> TaskFuture<anyhow::Result<Value>> { Box::pin(f(args)) });
        Self::with_body(name, inputs, Body::Fallible(body))
    }

    fn with_body(
        name: impl Into<String>,
        inputs: impl IntoIterator<Item = ValueKind>,
        body: Body,
    ) -> Self {
        Self {
            name: Arc::from(name.into()),
            inputs: inputs.into_iter().collect(),
            body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared input kinds, one per argument slot.
    pub fn inputs(&self) -> &[ValueKind] {
        &self.inputs
    }

    pub fn arity(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_fallible(&self) -> bool {
        matches!(self.body, Body::Fallible(_))
    }

    /// Check that `args` match the declared inputs exactly.
    pub fn check_call_shape(&self, args: &[Value]) -> Result<(), CallShapeError> {
        if args.len() != self.inputs.len() {
            return Err(CallShapeError::Arity {
                expected: self.inputs.len(),
                got: args.len(),
            });
        }
        for (slot, (arg, expected)) in args.iter().zip(self.inputs.iter()).enumerate() {
            if arg.kind() != *expected {
                return Err(CallShapeError::Kind {
                    slot,
                    expected: *expected,
                    got: arg.kind(),
                });
            }
        }
        Ok(())
    }

    /// Start the body. The call shape must already have been checked.
    pub fn invoke(&self, args: Vec<Value>) -> TaskFuture<anyhow::Result<Value>> {
        match &self.body {
            Body::Infallible(f) => {
                let fut = f(args);
                Box::pin(async move { Ok(fut.await) })
            }
            Body::Fallible(f) => f(args),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("fallible", &self.is_fallible())
            .finish()
    }
}
