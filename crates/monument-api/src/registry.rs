//! The process-wide namespace registry (spec §5, §9: "namespace
//! registry"): a narrow-locked map from namespace to its running actor
//! handle, opened lazily on first touch.

use std::path::PathBuf;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use monument_engine::{spawn, NamespaceConfig, NamespaceHandle};
use monument_store::{NamespaceDefaults, Store};
use monument_world::Namespace;
use monument_wire::ApiError;

use crate::error::from_store_error;

/// Defaults applied to a namespace the first time its store file is
/// created. Namespace-scoped overrides (e.g. a non-default visibility)
/// are out of scope for this registry; every namespace opened through it
/// shares one configuration.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub data_dir: PathBuf,
    pub busy_timeout: Duration,
    pub defaults: NamespaceDefaults,
    pub namespace_config: NamespaceConfig,
}

/// Holds one [`NamespaceHandle`] per namespace that has been touched
/// since the server started. `DashMap`'s per-shard locking means the
/// lock is only ever held across the open-or-lookup of a single
/// namespace, never across an `.await` on that namespace's own channel.
pub struct Registry {
    config: RegistryConfig,
    handles: DashMap<Namespace, NamespaceHandle>,
}

impl Registry {
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self { config, handles: DashMap::new() }
    }

    /// The handle for `namespace`, opening and spawning its actor on
    /// first touch. Uses the shard `Entry` API rather than a
    /// check-then-insert so two concurrent first touches can't each open
    /// their own `Store` for the same namespace.
    pub fn handle_for(&self, namespace: &Namespace) -> Result<NamespaceHandle, ApiError> {
        match self.handles.entry(namespace.clone()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let store = Store::open(
                    &self.config.data_dir,
                    namespace.clone(),
                    self.config.busy_timeout,
                    self.config.defaults,
                )
                .map_err(from_store_error)?;
                let handle = spawn(namespace.as_str().to_string(), store, self.config.namespace_config.clone());
                entry.insert(handle.clone());
                Ok(handle)
            }
        }
    }

    /// Drop the running actor for `namespace`, if any, and delete its
    /// store file (including WAL/SHM siblings) from disk. The next
    /// `handle_for` call recreates it from scratch (spec's EXPANDED
    /// admin surface, `POST /sim/{ns}/admin/reset`).
    pub fn reset(&self, namespace: &Namespace) -> Result<(), ApiError> {
        self.handles.remove(namespace);
        let path = Store::path_for(&self.config.data_dir, namespace);
        for suffix in ["", "-wal", "-shm"] {
            let sibling = PathBuf::from(format!("{}{suffix}", path.display()));
            if sibling.exists() {
                std::fs::remove_file(&sibling).map_err(|e| {
                    ApiError::Internal(format!("failed to remove {}: {e}", sibling.display()))
                })?;
            }
        }
        Ok(())
    }
}
