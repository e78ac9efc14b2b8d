//! Copy-on-write cache of compiled programs keyed by record type.
//!
//! Readers load the current snapshot and never block. A writer holds the
//! writer mutex, builds a complete new table (grown to twice the buckets
//! once the load factor would pass one half) and swaps it in, so readers see
//! either the old or the new table.

use std::any::TypeId;
use std::hash::{BuildHasher, BuildHasherDefault, DefaultHasher};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

use crate::program::Program;

const INITIAL_BUCKETS: usize = 8;

type Entry = (TypeId, Arc<Program>);

/// Immutable bucket table; replaced wholesale on every insert.
struct ProgramTable {
    buckets: Vec<Vec<Entry>>,
    len: usize,
}

impl ProgramTable {
    fn with_buckets(count: usize) -> Self {
        Self {
            buckets: vec![Vec::new(); count],
            len: 0,
        }
    }

    fn bucket(type_id: TypeId, count: usize) -> usize {
        let hash = BuildHasherDefault::<DefaultHasher>::default().hash_one(type_id);
        (hash as usize) % count
    }

    fn get(&self, type_id: TypeId) -> Option<&Arc<Program>> {
        self.buckets[Self::bucket(type_id, self.buckets.len())]
            .iter()
            .find(|(id, _)| *id == type_id)
            .map(|(_, program)| program)
    }

    fn push(&mut self, entry: Entry) {
        let idx = Self::bucket(entry.0, self.buckets.len());
        self.buckets[idx].push(entry);
        self.len += 1;
    }

    /// Copy of this table plus one entry.
    fn with_entry(&self, type_id: TypeId, program: Arc<Program>) -> Self {
        let mut count = self.buckets.len();
        if (self.len + 1) * 2 > count {
            count *= 2;
        }
        let mut next = Self::with_buckets(count);
        for entry in self.buckets.iter().flatten() {
            next.push(entry.clone());
        }
        next.push((type_id, program));
        next
    }
}

pub struct ProgramCache {
    table: ArcSwap<ProgramTable>,
    writer: Mutex<()>,
}

impl Default for ProgramCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramCache {
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(ProgramTable::with_buckets(INITIAL_BUCKETS)),
            writer: Mutex::new(()),
        }
    }

    /// Lock-free lookup.
    pub fn get(&self, type_id: TypeId) -> Option<Arc<Program>> {
        self.table.load().get(type_id).cloned()
    }

    /// Return the cached program for `type_id`, compiling and publishing it
    /// on a miss. Compilation runs under the writer lock; a compile error
    /// or a panicking schema publishes nothing. The lock guards no data, so
    /// a poisoned lock is taken over as is.
    pub fn get_or_compile<E, F>(&self, type_id: TypeId, compile: F) -> Result<Arc<Program>, E>
    where
        F: FnOnce() -> Result<Program, E>,
    {
        if let Some(program) = self.get(type_id) {
            return Ok(program);
        }

        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.table.load_full();
        // Another writer may have published while this one waited.
        if let Some(program) = current.get(type_id) {
            return Ok(Arc::clone(program));
        }

        let program = Arc::new(compile()?);
        let next = current.with_entry(type_id, Arc::clone(&program));
        tx_debug!(
            cache,
            ty = program.type_name(),
            programs = next.len,
            buckets = next.buckets.len(),
            "program published"
        );
        self.table.store(Arc::new(next));
        Ok(program)
    }

    /// Number of published programs.
    pub fn len(&self) -> usize {
        self.table.load().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub(crate) fn bucket_count(&self) -> usize {
        self.table.load().buckets.len()
    }
}
