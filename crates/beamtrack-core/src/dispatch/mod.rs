//! Backend dispatch: static per-backend operation sets and the active view.

pub mod guard;
pub mod kernels;
pub mod registry;

pub use guard::BackendGuard;
pub use kernels::{default_registry, registry};
pub use registry::{ActiveView, DispatchRegistry, OperationSet};
