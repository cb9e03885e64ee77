//! Named component lookup.
//!
//! The registry is owned by the composition root and passed (cloned, it
//! shares its interior) to whatever needs lookup-by-name: HTTP state,
//! hooks, background tasks. There is no process-wide instance; tests
//! build a fresh registry per case.

use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;

/// Errors from registry lookups.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("component {name:?} is not registered")]
    NotFound { name: String },

    #[error("component {name:?} is registered with a different type")]
    TypeMismatch { name: String },
}

/// Shared name → handle map for component instances.
///
/// Handles are stored type-erased and recovered with a typed `get`;
/// lookups are explicit and fallible, never panicking.
#[derive(Clone, Default)]
pub struct Registry {
    entries: Arc<DashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle under `name`, replacing any previous entry.
    pub fn insert<T: Send + Sync + 'static>(&self, name: &str, handle: Arc<T>) {
        self.entries.insert(name.to_string(), handle);
    }

    /// Look up the handle registered under `name`.
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, RegistryError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })?;
        entry
            .value()
            .clone()
            .downcast::<T>()
            .map_err(|_| RegistryError::TypeMismatch {
                name: name.to_string(),
            })
    }

    /// Names of all registered handles, unordered.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_roundtrip() {
        let registry = Registry::new();
        registry.insert("answer", Arc::new(42u32));

        let value: Arc<u32> = registry.get("answer").unwrap();
        assert_eq!(*value, 42);
    }

    #[test]
    fn missing_name_is_an_error() {
        let registry = Registry::new();
        let result = registry.get::<u32>("nope");
        assert_eq!(
            result.unwrap_err(),
            RegistryError::NotFound { name: "nope".into() }
        );
    }

    #[test]
    fn wrong_type_is_an_error() {
        let registry = Registry::new();
        registry.insert("answer", Arc::new(42u32));

        let result = registry.get::<String>("answer");
        assert_eq!(
            result.unwrap_err(),
            RegistryError::TypeMismatch { name: "answer".into() }
        );
    }

    #[test]
    fn clones_share_entries() {
        let registry = Registry::new();
        let view = registry.clone();
        registry.insert("answer", Arc::new(1u8));
        assert!(view.get::<u8>("answer").is_ok());
    }
}
