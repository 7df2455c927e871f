//! Owned-instance storage with ordered teardown.
//!
//! Every instance the container constructs is adopted here. Entries are
//! recorded in construction order, and teardown pops them back to front, so
//! an object is dropped before anything constructed earlier than it —
//! dependents go first, the things they depended on after, mirroring scope
//! exit.

use std::any::Any;
use std::sync::{Arc, Mutex, PoisonError};

type Entry = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
pub(crate) struct HeapStorage {
    entries: Mutex<Vec<Entry>>,
}

impl HeapStorage {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a constructed instance, returning a shared handle.
    ///
    /// Construction happens before this call, so a build that recursively
    /// adopts nested dependencies records them at lower indices — exactly
    /// the order reverse teardown needs.
    pub(crate) fn adopt<T: Send + Sync + 'static>(&self, instance: Arc<T>) -> Arc<T> {
        tracing::trace!("storage adopting instance of {}", std::any::type_name::<T>());
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(instance.clone());
        instance
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Move every entry of `donor` to the end of this storage, preserving
    /// the donor's internal order. Used by merge: donated instances must
    /// stay alive (and tear down) with the receiver.
    pub(crate) fn absorb(&self, donor: &HeapStorage) {
        let mut donated = {
            let mut donor_entries = donor
                .entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *donor_entries)
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .append(&mut donated);
    }
}

impl Drop for HeapStorage {
    fn drop(&mut self) {
        let entries = self.entries.get_mut().unwrap_or_else(PoisonError::into_inner);
        // Reverse insertion order: last constructed, first destroyed.
        while let Some(entry) = entries.pop() {
            drop(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Witness {
        tag: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Drop for Witness {
        fn drop(&mut self) {
            self.log.lock().unwrap().push(self.tag);
        }
    }

    #[test]
    fn teardown_runs_in_reverse_insertion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let storage = HeapStorage::new();
        for tag in ["first", "second", "third"] {
            storage.adopt(Arc::new(Witness {
                tag,
                log: log.clone(),
            }));
        }
        drop(storage);
        assert_eq!(*log.lock().unwrap(), vec!["third", "second", "first"]);
    }

    #[test]
    fn adopt_returns_a_live_handle() {
        let storage = HeapStorage::new();
        let handle = storage.adopt(Arc::new(7u32));
        assert_eq!(*handle, 7);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn absorb_appends_donor_entries_after_local_ones() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let receiver = HeapStorage::new();
        let donor = HeapStorage::new();
        receiver.adopt(Arc::new(Witness {
            tag: "mine",
            log: log.clone(),
        }));
        donor.adopt(Arc::new(Witness {
            tag: "donated",
            log: log.clone(),
        }));

        receiver.absorb(&donor);
        assert_eq!(donor.len(), 0);
        assert_eq!(receiver.len(), 2);

        drop(donor);
        assert!(log.lock().unwrap().is_empty());

        drop(receiver);
        assert_eq!(*log.lock().unwrap(), vec!["donated", "mine"]);
    }
}
