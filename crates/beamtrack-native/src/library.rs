//! Loaded tracking libraries and the process-wide handle cache.
//!
//! A library is loaded at most once per path and never unloaded; the cache
//! hands out shared handles so function pointers taken from a library stay
//! valid for as long as a handle is held.

use crate::error::{BridgeError, Result};
use crate::record::RunFn;
use libloading::{Library, Symbol};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

static CACHE: Lazy<LibraryCache> = Lazy::new(LibraryCache::new);

/// A shared library exporting a tracking entry point.
pub struct TrackingLibrary {
    path: PathBuf,
    library: Library,
}

impl TrackingLibrary {
    /// Loads the library at `path`, bypassing the cache.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        // SAFETY: loading runs the library's initializers; tracking
        // libraries are trusted inputs chosen by the caller.
        let library = unsafe { Library::new(path) }
            .map_err(|e| BridgeError::library_load(path, e))?;
        info!(path = %path.display(), "tracking library loaded");
        Ok(Self {
            path: path.to_path_buf(),
            library,
        })
    }

    /// Path the library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves `symbol` as a tracking entry point.
    ///
    /// The returned pointer is only valid while `self` is alive.
    pub fn entry_point(&self, symbol: &str) -> Result<RunFn> {
        // SAFETY: the exported symbol is assumed to have the `RunFn` ABI.
        let run: Symbol<RunFn> = unsafe { self.library.get(symbol.as_bytes()) }
            .map_err(|e| BridgeError::native_call(symbol, e))?;
        debug!(symbol, path = %self.path.display(), "entry point resolved");
        Ok(*run)
    }
}

impl fmt::Debug for TrackingLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackingLibrary")
            .field("path", &self.path)
            .finish()
    }
}

/// Path-keyed cache of loaded libraries.
///
/// Paths are canonicalized when they name an existing file, so two
/// spellings of the same file share a handle. Bare names resolved by the
/// system loader are keyed as given.
#[derive(Debug, Default)]
pub struct LibraryCache {
    handles: Mutex<HashMap<PathBuf, Arc<TrackingLibrary>>>,
}

impl LibraryCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache used by the bridge.
    pub fn global() -> &'static LibraryCache {
        &CACHE
    }

    /// Returns the cached handle for `path`, loading it on first use.
    ///
    /// Failed loads are not cached.
    pub fn get_or_load<P: AsRef<Path>>(&self, path: P) -> Result<Arc<TrackingLibrary>> {
        let key = cache_key(path.as_ref());
        let mut handles = self.handles.lock();
        if let Some(library) = handles.get(&key) {
            debug!(path = %key.display(), "tracking library cache hit");
            return Ok(Arc::clone(library));
        }
        let library = Arc::new(TrackingLibrary::load(path.as_ref())?);
        handles.insert(key, Arc::clone(&library));
        Ok(library)
    }

    /// Returns true if `path` has been loaded through this cache.
    pub fn contains<P: AsRef<Path>>(&self, path: P) -> bool {
        self.handles.lock().contains_key(&cache_key(path.as_ref()))
    }

    /// Number of loaded libraries.
    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    /// Returns true if nothing has been loaded.
    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }
}

fn cache_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
