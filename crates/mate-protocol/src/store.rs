//! Latest-value record store.
//!
//! One slot per address for the raw record and one for the interpreted record.
//! A new frame for an address replaces both; no history is kept. The store is
//! written by the pipeline and may be cloned and read from other threads.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::device::Address;
use crate::interpret::InterpretedRecord;
use crate::schema::RawRecord;

#[derive(Debug, Default)]
struct Slots {
    raw: HashMap<Address, RawRecord>,
    interpreted: HashMap<Address, InterpretedRecord>,
}

/// Shared handle to the most recent record per address.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    inner: Arc<RwLock<Slots>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite both records for `address`.
    pub fn store(&self, address: Address, raw: RawRecord, interpreted: InterpretedRecord) {
        let mut slots = self.inner.write();
        slots.raw.insert(address, raw);
        slots.interpreted.insert(address, interpreted);
    }

    /// Latest raw record for `address`.
    pub fn get_raw(&self, address: Address) -> Option<RawRecord> {
        self.inner.read().raw.get(&address).cloned()
    }

    /// Latest interpreted record for `address`.
    pub fn get_interpreted(&self, address: Address) -> Option<InterpretedRecord> {
        self.inner.read().interpreted.get(&address).cloned()
    }

    /// Addresses with a stored record, sorted.
    pub fn addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<_> = self.inner.read().interpreted.keys().copied().collect();
        addresses.sort_unstable();
        addresses
    }

    /// Copy of every interpreted record, sorted by address.
    pub fn snapshot(&self) -> Vec<InterpretedRecord> {
        let slots = self.inner.read();
        let mut records: Vec<_> = slots.interpreted.values().cloned().collect();
        records.sort_unstable_by_key(InterpretedRecord::address);
        records
    }

    pub fn len(&self) -> usize {
        self.inner.read().interpreted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().interpreted.is_empty()
    }
}
