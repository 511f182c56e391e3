//! Command handler contract and the name → handler registry.

mod handler;
mod registry;

pub use handler::{Handler, HandlerFn, HandlerRef};
pub use registry::HandlerRegistry;
