//! # Name → handler registry.
//!
//! Append-only mapping from command name to [`HandlerRef`]. Collaborators
//! register their handlers at startup; registration stays open afterwards so
//! the command set can be hot-extended while tasks referencing new names are
//! already queued (deferred resolution).
//!
//! ## Rules
//! - Re-registering an existing name is **rejected**; the original handler
//!   stays in place.
//! - `resolve` happens at execution time unless
//!   [`Config::precheck_commands`](crate::Config::precheck_commands) moves
//!   the check to admission.
//! - The lock is held only for map access, never across a handler call.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::RegisterError;

use super::handler::HandlerRef;

/// Thread-safe registry of command handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    inner: RwLock<HashMap<String, HandlerRef>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under its own name.
    ///
    /// Fails with [`RegisterError::AlreadyRegistered`] if the name is taken.
    pub fn register(&self, handler: HandlerRef) -> Result<(), RegisterError> {
        let name = handler.name().to_string();
        if name.is_empty() {
            return Err(RegisterError::EmptyCommand);
        }

        let mut map = self.write();
        if map.contains_key(&name) {
            return Err(RegisterError::AlreadyRegistered { command: name });
        }
        map.insert(name, handler);
        Ok(())
    }

    /// Looks up a handler by command name.
    pub fn resolve(&self, command: &str) -> Option<HandlerRef> {
        self.read().get(command).cloned()
    }

    /// Returns true if a handler is registered under this name.
    pub fn contains(&self, command: &str) -> bool {
        self.read().contains_key(command)
    }

    /// Returns the sorted list of registered command names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, HandlerRef>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, HandlerRef>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}
