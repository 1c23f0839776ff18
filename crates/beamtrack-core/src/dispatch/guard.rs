//! Scoped backend switching.

use crate::dispatch::registry::DispatchRegistry;
use crate::types::Backend;

/// Restores the previously active backend when dropped.
///
/// Created by [`DispatchRegistry::scoped`].
#[must_use = "the previous backend is restored as soon as the guard is dropped"]
pub struct BackendGuard<'a, F> {
    registry: &'a DispatchRegistry<F>,
    previous: Backend,
}

impl<'a, F> BackendGuard<'a, F> {
    pub(crate) fn new(registry: &'a DispatchRegistry<F>, previous: Backend) -> Self {
        Self { registry, previous }
    }

    /// Backend that will be restored.
    pub fn previous(&self) -> Backend {
        self.previous
    }
}

impl<F> Drop for BackendGuard<'_, F> {
    fn drop(&mut self) {
        self.registry.activate(self.previous);
    }
}
