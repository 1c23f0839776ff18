//! Backend dispatch registry.
//!
//! A registry holds one static operation set per [`Backend`] and an active
//! view that callers resolve names through. The active view is an `Arc`
//! pointing at one of the static sets as they were at activation time, so a
//! switch is a single pointer swap and no caller ever observes a view that
//! mixes both backends.
//!
//! Registration is copy-on-write. Registering into the backend that is
//! currently active republishes the active view over the updated set in the
//! same swap, so the view always equals one static set. Snapshots taken
//! earlier keep the set they were taken from.
//!
//! Switching is not ordered against resolution from other threads. A
//! pipeline that must not see a switch mid-sequence should pin a
//! [`snapshot`] or own its registry.
//!
//! [`activate`]: DispatchRegistry::activate
//! [`snapshot`]: DispatchRegistry::snapshot

use crate::config::DispatchConfig;
use crate::dispatch::guard::BackendGuard;
use crate::error::{DispatchError, Result};
use crate::types::Backend;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Operation name to implementation.
pub type OperationSet<F> = BTreeMap<String, F>;

/// The bindings callers currently resolve through.
pub struct ActiveView<F> {
    backend: Backend,
    operations: Arc<OperationSet<F>>,
}

impl<F> ActiveView<F> {
    /// Backend whose set this view exposes.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Implementation bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&F> {
        self.operations.get(name)
    }

    /// Returns true if `name` is bound in this view.
    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// Bound names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    /// Number of bound operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns true if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns true if both views share the same underlying set.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.backend == other.backend && Arc::ptr_eq(&self.operations, &other.operations)
    }
}

impl<F> Clone for ActiveView<F> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend,
            operations: Arc::clone(&self.operations),
        }
    }
}

impl<F> fmt::Debug for ActiveView<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveView")
            .field("backend", &self.backend)
            .field("operations", &self.operations.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Two static operation sets and the active view over one of them.
pub struct DispatchRegistry<F> {
    sets: RwLock<[Arc<OperationSet<F>>; 2]>,
    active: RwLock<ActiveView<F>>,
    strict: bool,
}

impl<F> DispatchRegistry<F> {
    /// Creates an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(&DispatchConfig::default())
    }

    /// Creates an empty registry from a configuration.
    pub fn with_config(config: &DispatchConfig) -> Self {
        Self::from_sets(
            OperationSet::new(),
            OperationSet::new(),
            config.initial_backend,
            config.strict_registration,
        )
    }

    /// Creates a registry from pre-populated sets and activates `initial`.
    pub fn from_sets(
        cpu: OperationSet<F>,
        gpu: OperationSet<F>,
        initial: Backend,
        strict: bool,
    ) -> Self {
        let sets = [Arc::new(cpu), Arc::new(gpu)];
        let active = ActiveView {
            backend: initial,
            operations: Arc::clone(&sets[initial.index()]),
        };
        Self {
            sets: RwLock::new(sets),
            active: RwLock::new(active),
            strict,
        }
    }

    /// Returns true if registration refuses to overwrite entries.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Replaces the active view with `backend`'s static set.
    ///
    /// Operations only the previously active backend defined disappear from
    /// the view; nothing from the old view survives.
    pub fn activate(&self, backend: Backend) {
        // Lock order: sets, then active.
        let (previous, count) = {
            let sets = self.sets.read();
            let operations = Arc::clone(&sets[backend.index()]);
            let count = operations.len();
            let mut active = self.active.write();
            let previous =
                std::mem::replace(&mut *active, ActiveView { backend, operations }).backend;
            (previous, count)
        };
        info!(from = %previous, to = %backend, operations = count, "backend activated");
    }

    /// Activates `backend` until the returned guard is dropped, then restores
    /// the backend that was active before.
    pub fn scoped(&self, backend: Backend) -> BackendGuard<'_, F> {
        let previous = self.active_backend();
        self.activate(backend);
        BackendGuard::new(self, previous)
    }

    /// Backend of the current active view.
    pub fn active_backend(&self) -> Backend {
        self.active.read().backend
    }

    /// A cheap copy of the current active view.
    ///
    /// The snapshot keeps its bindings across later switches.
    pub fn snapshot(&self) -> ActiveView<F> {
        self.active.read().clone()
    }

    /// Names registered for `backend`, in sorted order.
    pub fn names(&self, backend: Backend) -> Vec<String> {
        self.sets.read()[backend.index()].keys().cloned().collect()
    }

    /// Returns true if `backend`'s static set defines `name`.
    pub fn is_registered(&self, backend: Backend, name: &str) -> bool {
        self.sets.read()[backend.index()].contains_key(name)
    }

    /// Names defined by both backends.
    pub fn common_names(&self) -> Vec<String> {
        let sets = self.sets.read();
        sets[Backend::Cpu.index()]
            .keys()
            .filter(|name| sets[Backend::Gpu.index()].contains_key(*name))
            .cloned()
            .collect()
    }

    fn miss(&self, name: &str, active: Backend) -> DispatchError {
        let other = active.other();
        if self.is_registered(other, name) {
            DispatchError::backend_mismatch(name, active, other)
        } else {
            DispatchError::unknown_operation(name)
        }
    }
}

impl<F: Clone> DispatchRegistry<F> {
    /// Adds or overwrites `name` in `backend`'s static set.
    ///
    /// Last write wins unless the registry is strict, in which case an
    /// existing entry is kept and `DuplicateDefinition` is returned. If
    /// `backend` is active, the active view is replaced by the updated set.
    pub fn register<S: Into<String>>(&self, backend: Backend, name: S, implementation: F) -> Result<()> {
        self.insert(backend, name.into(), implementation, self.strict)
    }

    /// Adds `name` to `backend`'s static set, failing with
    /// `DuplicateDefinition` if it is already there, whatever the
    /// registry's configuration.
    pub fn try_register<S: Into<String>>(
        &self,
        backend: Backend,
        name: S,
        implementation: F,
    ) -> Result<()> {
        self.insert(backend, name.into(), implementation, true)
    }

    fn insert(&self, backend: Backend, name: String, implementation: F, strict: bool) -> Result<()> {
        let mut sets = self.sets.write();
        let set = Arc::make_mut(&mut sets[backend.index()]);
        if strict && set.contains_key(&name) {
            return Err(DispatchError::duplicate_definition(backend, name));
        }
        debug!(%backend, operation = %name, "operation registered");
        set.insert(name, implementation);

        let mut active = self.active.write();
        if active.backend == backend {
            *active = ActiveView {
                backend,
                operations: Arc::clone(&sets[backend.index()]),
            };
        }
        Ok(())
    }

    /// Registers every `(name, implementation)` pair for `backend`.
    pub fn register_all<I, S>(&self, backend: Backend, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (S, F)>,
        S: Into<String>,
    {
        entries
            .into_iter()
            .try_for_each(|(name, implementation)| self.register(backend, name, implementation))
    }

    /// Implementation bound to `name` in the active view.
    ///
    /// Never falls back to the inactive backend: an operation only the
    /// other backend defines is a `BackendMismatch`.
    pub fn resolve(&self, name: &str) -> Result<F> {
        let (backend, found) = {
            let active = self.active.read();
            (active.backend, active.get(name).cloned())
        };
        match found {
            Some(implementation) => Ok(implementation),
            None => {
                let err = self.miss(name, backend);
                debug!(%backend, operation = name, error = %err, "resolution failed");
                Err(err)
            }
        }
    }

    /// Implementation `backend` defines for `name`, regardless of which
    /// backend is active.
    pub fn get(&self, backend: Backend, name: &str) -> Option<F> {
        self.sets.read()[backend.index()].get(name).cloned()
    }
}

impl<F> Default for DispatchRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> fmt::Debug for DispatchRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchRegistry")
            .field("active", &self.active_backend())
            .field("cpu", &self.names(Backend::Cpu))
            .field("gpu", &self.names(Backend::Gpu))
            .field("strict", &self.strict)
            .finish()
    }
}
