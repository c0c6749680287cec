use std::path::Path;
use std::time::Duration;

use log::warn;
use serde::{de::DeserializeOwned, Serialize};

use super::tables::{sn_key, SledIoSetTree};
use super::timestamped::Timestamped;
use super::DbError;
use crate::prefix::{IdentifierPrefix, Prefix};

/// Physically separate database holding the escrow buckets.
pub struct EscrowDb {
    db: sled::Db,
}

impl EscrowDb {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        Ok(Self {
            db: sled::open(path)?,
        })
    }

    pub(crate) fn tree(&self, name: &[u8]) -> Result<sled::Tree, DbError> {
        Ok(self.db.open_tree(name)?)
    }
}

/// Escrow
///
/// A time-bounded bucket of messages keyed by `(identifier, sn)` in
/// insertion order; entries older than `duration` are purged on access.
pub struct Escrow<T> {
    tree: SledIoSetTree<Timestamped<T>>,
    name: String,
    duration: Duration,
}

impl<T: Serialize + DeserializeOwned + PartialEq + Clone> Escrow<T> {
    pub fn new(name: &[u8], duration: Duration, db: &EscrowDb) -> Result<Self, DbError> {
        Ok(Self {
            tree: SledIoSetTree::new(db.tree(name)?),
            name: String::from_utf8_lossy(name).to_string(),
            duration,
        })
    }

    pub fn add(&self, id: &IdentifierPrefix, sn: u64, event: T) -> Result<(), DbError> {
        let key = sn_key(&id.to_str(), sn);
        self.tree.add(&key, &Timestamped::new(event))?;
        Ok(())
    }

    /// All live entries for the identifier, oldest first.
    pub fn get(&self, id: &IdentifierPrefix) -> Vec<T> {
        let prefix = [id.to_str().as_bytes(), b"."].concat();
        self.collect_live(&prefix)
    }

    /// Live entries for one `(identifier, sn)` slot.
    pub fn get_at(&self, id: &IdentifierPrefix, sn: u64) -> Vec<T> {
        let mut prefix = sn_key(&id.to_str(), sn);
        prefix.push(b'.');
        self.collect_live(&prefix)
    }

    pub fn get_all(&self) -> Vec<T> {
        self.collect_live(b"")
    }

    fn collect_live(&self, prefix: &[u8]) -> Vec<T> {
        let mut live = vec![];
        for (full_key, stored) in self.tree.iter_prefix_entries(prefix) {
            if stored.is_stale(self.duration) {
                warn!(
                    "escrow {}: purging stale entry at {}",
                    self.name,
                    String::from_utf8_lossy(&full_key)
                );
                self.tree.remove_entry(&full_key).ok();
            } else {
                live.push(stored.event);
            }
        }
        live
    }

    pub fn remove(&self, id: &IdentifierPrefix, sn: u64, event: &T) -> Result<(), DbError> {
        let key = sn_key(&id.to_str(), sn);
        self.tree.remove_value(&key, &Timestamped::new(event.clone()))
    }

    /// Drops every expired entry; returns how many were purged.
    pub fn purge_stale(&self) -> Result<usize, DbError> {
        let mut purged = 0;
        for (full_key, stored) in self.tree.iter_prefix_entries(b"") {
            if stored.is_stale(self.duration) {
                warn!(
                    "escrow {}: purging stale entry at {}",
                    self.name,
                    String::from_utf8_lossy(&full_key)
                );
                self.tree.remove_entry(&full_key)?;
                purged += 1;
            }
        }
        Ok(purged)
    }
}
