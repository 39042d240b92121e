//! Custom packs, listed after the built-in ones.

use std::sync::Arc;

use tracing::{info, warn};

use super::{KeyValueStore, Loaded, PACKS_KEY, read_collection, write_collection};
use crate::model::Pack;

/// Built-in packs occupy list indices `0..builtin_count()`; stored packs follow.
pub struct PackStore {
    kv: Arc<dyn KeyValueStore>,
    builtin: Vec<Pack>,
}

impl PackStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, builtin: Vec<Pack>) -> Self {
        Self { kv, builtin }
    }

    pub fn builtin_count(&self) -> usize {
        self.builtin.len()
    }

    pub fn stored(&self) -> Loaded<Pack> {
        read_collection(self.kv.as_ref(), PACKS_KEY)
    }

    pub fn list(&self) -> Vec<Pack> {
        let mut all = self.builtin.clone();
        all.extend(self.stored().into_vec());
        all
    }

    /// Pack at a list index, built-in or stored.
    pub fn get(&self, index: usize) -> Option<Pack> {
        match index.checked_sub(self.builtin.len()) {
            None => self.builtin.get(index).cloned(),
            Some(offset) => self.stored().into_vec().into_iter().nth(offset),
        }
    }

    /// Replaces the stored pack at `index`, or appends when `index` is absent
    /// or out of range. Returns the stored offset the pack ended up at.
    pub fn upsert(&self, pack: Pack, index: Option<usize>) -> usize {
        let mut stored = self.stored().into_vec();
        let offset = match index {
            Some(i) if i < stored.len() => {
                stored[i] = pack;
                i
            }
            _ => {
                stored.push(pack);
                stored.len() - 1
            }
        };

        match write_collection(self.kv.as_ref(), PACKS_KEY, &stored) {
            Ok(()) => info!(offset, "pack saved"),
            Err(e) => warn!(error = %e, "could not save pack"),
        }
        offset
    }

    /// Removes the stored pack at a zero-based stored offset.
    pub fn delete(&self, offset: usize) {
        let mut stored = self.stored().into_vec();
        if offset >= stored.len() {
            return;
        }
        stored.remove(offset);

        if let Err(e) = write_collection(self.kv.as_ref(), PACKS_KEY, &stored) {
            warn!(error = %e, "could not delete pack");
        }
    }
}
