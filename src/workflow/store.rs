use std::time::SystemTime;

use crate::types::Bug;

/// How [`BugStore::upsert`] reconciled a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Replaced,
    Appended,
}

/// Client-side cache of committed bug records, in server order.
#[derive(Debug, Clone, Default)]
pub struct BugStore {
    bugs: Vec<Bug>,
    // Wall clock so the footer's "updated ago" survives laptop sleep.
    loaded_at: Option<SystemTime>,
}

impl BugStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection with a fresh listing.
    pub fn replace_all(&mut self, bugs: Vec<Bug>) {
        self.bugs = bugs;
        self.loaded_at = Some(SystemTime::now());
    }

    /// Merge a record returned by a create/update: replace by id, or append.
    ///
    /// Afterwards the store holds exactly one entry with `bug.id`.
    pub fn upsert(&mut self, bug: Bug) -> Upsert {
        let id = bug.id;
        match self.index_of(id) {
            Some(idx) => {
                self.bugs[idx] = bug;
                let mut kept = false;
                self.bugs.retain(|b| {
                    if b.id != id {
                        return true;
                    }
                    !std::mem::replace(&mut kept, true)
                });
                Upsert::Replaced
            }
            None => {
                self.bugs.push(bug);
                Upsert::Appended
            }
        }
    }

    pub fn get(&self, id: i64) -> Option<&Bug> {
        self.bugs.iter().find(|b| b.id == id)
    }

    pub fn index_of(&self, id: i64) -> Option<usize> {
        self.bugs.iter().position(|b| b.id == id)
    }

    pub fn bugs(&self) -> &[Bug] {
        &self.bugs
    }

    pub fn len(&self) -> usize {
        self.bugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bugs.is_empty()
    }

    /// When the last full listing arrived, if ever.
    pub fn loaded_at(&self) -> Option<SystemTime> {
        self.loaded_at
    }
}
