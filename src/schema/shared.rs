//! Registry handle shared between threads.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use super::{SchemaRegistry, TypeDefinition};
use crate::util::{Result, SchemaError};

/// Cloneable handle to a [`SchemaRegistry`].
///
/// Writers take the lock only while registering; once frozen, every access is
/// a read and readers never contend with each other.
#[derive(Clone, Debug, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<SchemaRegistry>>,
}

impl SharedRegistry {
    /// Share `registry`.
    pub fn new(registry: SchemaRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Register a definition unless the registry is frozen.
    pub fn register(&self, definition: TypeDefinition) -> Result<()> {
        let mut registry = self.inner.write();
        if registry.is_frozen() {
            return Err(SchemaError::Frozen.into());
        }
        registry.register(definition)
    }

    /// Stop accepting definitions.
    pub fn freeze(&self) {
        self.inner.write().freeze();
    }

    /// Check if the registry refuses definitions.
    pub fn is_frozen(&self) -> bool {
        self.inner.read().is_frozen()
    }

    /// Read access for lookups and validation.
    pub fn read(&self) -> RwLockReadGuard<'_, SchemaRegistry> {
        self.inner.read()
    }
}

impl From<SchemaRegistry> for SharedRegistry {
    fn from(registry: SchemaRegistry) -> Self {
        Self::new(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeKey;
    use std::thread;

    #[test]
    fn test_concurrent_reads_after_freeze() {
        let shared = SharedRegistry::new(SchemaRegistry::with_builtin().unwrap());
        shared.freeze();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let registry = shared.read();
                    registry
                        .latest(crate::fscv::NAMESPACE, crate::fscv::RESPONSE_SERIES)
                        .cloned()
                })
            })
            .collect();

        for h in handles {
            let key = h.join().unwrap().unwrap();
            assert_eq!(key.version, crate::fscv::VERSION);
        }

        let err = shared
            .register(TypeDefinition::new("x", "Late", "1"))
            .unwrap_err();
        assert!(matches!(err, crate::Error::Schema(SchemaError::Frozen)));
        assert!(!shared.read().contains(&TypeKey::new("x", "Late", "1")));
    }
}
