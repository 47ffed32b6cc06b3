//! Snapshot store for the current subscription record.

use std::sync::{Arc, RwLock};

use crate::subscription::record::SubscriptionRecord;

/// Shared holder for the latest fetched subscription record.
///
/// The snapshot is immutable until refetched: mutations never edit it in
/// place, they replace it with whatever the billing collaborator returned
/// after the action. Cheap to clone; all clones observe the same record.
#[derive(Clone, Default, Debug)]
pub struct RecordStore {
    inner: Arc<RwLock<Option<SubscriptionRecord>>>,
}

impl RecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot, if a record has been fetched.
    #[must_use]
    pub fn snapshot(&self) -> Option<SubscriptionRecord> {
        self.inner.read().expect("record store lock poisoned").clone()
    }

    /// Replace the snapshot with a freshly fetched record (or `None`
    /// when the collaborator reports no subscription).
    pub fn replace(&self, record: Option<SubscriptionRecord>) {
        *self.inner.write().expect("record store lock poisoned") = record;
    }

    /// Drop the snapshot (e.g. on logout).
    pub fn clear(&self) {
        self.replace(None);
    }
}
