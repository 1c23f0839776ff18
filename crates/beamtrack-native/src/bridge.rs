//! Packing attribute sets into the native record and calling the tracker.

use crate::attribute::{Attribute, ATTRIBUTE_COUNT};
use crate::buffer::AttributeBuffer;
use crate::config::{BridgeConfig, DEFAULT_ENTRY_SYMBOL};
use crate::error::{BridgeError, Result};
use crate::library::{LibraryCache, TrackingLibrary};
use crate::record::{native_count, residency_tag, ParticleData, RunFn};
use crate::set::AttributeSet;
use std::fmt;
use std::path::Path;
use std::ptr;
use std::sync::Arc;
use tracing::{debug, warn};

enum EntryPoint {
    Library {
        // Keeps `run` valid.
        library: Arc<TrackingLibrary>,
        run: RunFn,
    },
    Injected(RunFn),
}

/// A resolved tracking entry point.
pub struct NativeBridge {
    entry: EntryPoint,
    symbol: String,
}

impl NativeBridge {
    /// Loads (or reuses) the library at `path` and resolves `run`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_symbol(path, DEFAULT_ENTRY_SYMBOL)
    }

    /// Loads (or reuses) the library at `path` and resolves `symbol`.
    pub fn load_symbol<P: AsRef<Path>>(path: P, symbol: &str) -> Result<Self> {
        let library = LibraryCache::global().get_or_load(path)?;
        let run = library.entry_point(symbol)?;
        Ok(Self {
            entry: EntryPoint::Library { library, run },
            symbol: symbol.to_string(),
        })
    }

    /// Resolves the library and symbol named by `config`.
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        Self::load_symbol(config.library_path()?, &config.entry_symbol)
    }

    /// Uses `run` directly instead of a loaded library.
    pub fn with_entry_point(run: RunFn) -> Self {
        Self {
            entry: EntryPoint::Injected(run),
            symbol: "<injected>".to_string(),
        }
    }

    /// Name of the entry point this bridge calls.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Library the entry point was resolved from, if any.
    pub fn library(&self) -> Option<&TrackingLibrary> {
        match &self.entry {
            EntryPoint::Library { library, .. } => Some(library),
            EntryPoint::Injected(_) => None,
        }
    }

    fn run_fn(&self) -> RunFn {
        match &self.entry {
            EntryPoint::Library { run, .. } | EntryPoint::Injected(run) => *run,
        }
    }

    /// Validates `set`, packs it into a record and calls the entry point.
    ///
    /// The entry point mutates the buffers in place; the same set is
    /// returned. Strided host buffers are staged through a contiguous copy
    /// and written back after the call. Nothing reaches native code unless
    /// validation succeeds.
    pub fn invoke<'a>(
        &self,
        mut set: AttributeSet<'a>,
        particle_count: usize,
    ) -> Result<AttributeSet<'a>> {
        let residency = set.validate(particle_count)?;
        let npart = native_count(particle_count)?;

        let mut staged: [Option<Vec<f64>>; ATTRIBUTE_COUNT] = std::array::from_fn(|_| None);
        let mut pointers = [ptr::null_mut::<f64>(); ATTRIBUTE_COUNT];
        for attribute in Attribute::ALL {
            let i = attribute.index();
            let buffer = set
                .get_mut(attribute)
                .ok_or_else(|| BridgeError::missing_attribute(attribute))?;
            pointers[i] = match buffer {
                AttributeBuffer::Host(data) => data.as_mut_ptr(),
                AttributeBuffer::Device(device) => device.as_mut_ptr(),
                AttributeBuffer::HostStaged(view) => {
                    warn!(%attribute, len = view.len(), stride = view.stride(), "staging strided host buffer");
                    staged[i].insert(view.to_vec()).as_mut_ptr()
                }
            };
        }

        let mut record = ParticleData::new(npart, pointers);
        let tag = residency_tag(residency);
        debug!(symbol = %self.symbol, npart, %residency, tag = %(tag as u8 as char), "invoking tracking entry point");

        let run = self.run_fn();
        // SAFETY: every pointer addresses `npart` doubles borrowed exclusively
        // through `set` (or owned by `staged`) for the duration of the call.
        unsafe { run(&mut record, tag) };

        for attribute in Attribute::ALL {
            if let Some(values) = staged[attribute.index()].take() {
                if let Some(AttributeBuffer::HostStaged(view)) = set.get_mut(attribute) {
                    view.write_back(&values);
                }
            }
        }
        Ok(set)
    }
}

impl fmt::Debug for NativeBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBridge")
            .field("symbol", &self.symbol)
            .field("library", &self.library().map(TrackingLibrary::path))
            .finish()
    }
}

/// Validates `set`, loads (or reuses) the library at `library_path` and
/// runs its `run` entry point over the set.
///
/// Validation happens before the library is touched, so an invalid set never
/// triggers a load.
pub fn pack_and_invoke<'a, P: AsRef<Path>>(
    library_path: P,
    set: AttributeSet<'a>,
    particle_count: usize,
) -> Result<AttributeSet<'a>> {
    set.validate(particle_count)?;
    NativeBridge::load(library_path)?.invoke(set, particle_count)
}
