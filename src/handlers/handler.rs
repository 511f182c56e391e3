//! # Handler abstraction and function-backed handler implementation.
//!
//! This module defines the [`Handler`] trait (the contract a named command
//! implements) and a convenient function-backed implementation [`HandlerFn`].
//! The common handle type is [`HandlerRef`], an `Arc<dyn Handler>` suitable
//! for sharing across the bridge.
//!
//! Handlers are **synchronous**: the pump invokes them on the one thread
//! authorized to touch host state, and that thread blocks until the handler
//! returns. Handlers therefore must not await, and should close over the
//! host handles they need.

use std::borrow::Cow;
use std::sync::Arc;

use serde_json::Value;

use crate::error::HandlerError;

/// Shared handle to a registered handler.
pub type HandlerRef = Arc<dyn Handler>;

/// # A named command implementation.
///
/// A `Handler` has a stable [`name`](Handler::name) and a synchronous
/// [`call`](Handler::call) that receives the submission's parameters and
/// returns a JSON result or a structured [`HandlerError`].
///
/// `call` runs exclusively on the host's coordinating thread; no two
/// handlers ever run concurrently.
///
/// # Example
/// ```
/// use serde_json::Value;
/// use hostbridge::{Handler, HandlerError};
///
/// struct Echo;
///
/// impl Handler for Echo {
///     fn name(&self) -> &str { "echo" }
///
///     fn call(&self, params: Value) -> Result<Value, HandlerError> {
///         Ok(params)
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Returns the stable command name this handler is registered under.
    fn name(&self) -> &str;

    /// Executes the command with the given parameters.
    ///
    /// Errors are recorded on the task and never retried automatically.
    /// Panics are caught by the executor and recorded as `handler_panic`.
    fn call(&self, params: Value) -> Result<Value, HandlerError>;
}

/// Function-backed handler implementation.
///
/// Wraps a closure; the closure owns whatever host handles it needs.
///
/// # Example
/// ```
/// use serde_json::{json, Value};
/// use hostbridge::{Handler, HandlerError, HandlerFn, HandlerRef};
///
/// let h: HandlerRef = HandlerFn::arc("ping", |_params: Value| {
///     Ok::<_, HandlerError>(json!({ "pong": true }))
/// });
/// assert_eq!(h.name(), "ping");
/// ```
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a [`HandlerRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(Value) -> Result<Value, HandlerError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, params: Value) -> Result<Value, HandlerError> {
        (self.f)(params)
    }
}
