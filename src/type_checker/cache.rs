use std::{
    collections::VecDeque,
    mem::{self, Discriminant},
};

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::ast::{
    ast::{ExprKind, NodeId},
    types::Type,
};

/// Identity of an inferred expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprKey {
    pub module: u32,
    pub node: NodeId,
    pub kind: Discriminant<ExprKind>,
}

/// Inferred types of expressions, bounded in size.
///
/// When full, the oldest inserted half of the entries is dropped. Entries
/// are not refreshed on lookup.
///
/// Inserts made while a trial is open are journaled and undone when the
/// trial ends.
#[derive(Debug)]
pub struct TypeCache {
    capacity: usize,
    entries: FxHashMap<ExprKey, Type>,
    order: VecDeque<ExprKey>,
    trials: Vec<Vec<(ExprKey, Option<Type>)>>,
}

impl TypeCache {
    pub fn new(capacity: usize) -> Self {
        TypeCache {
            capacity,
            entries: FxHashMap::default(),
            order: VecDeque::new(),
            trials: vec![],
        }
    }

    pub fn get(&self, key: &ExprKey) -> Option<&Type> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: ExprKey, ty: Type) {
        if self.capacity == 0 {
            return;
        }
        if let Some(existing) = self.entries.get_mut(&key) {
            let previous = mem::replace(existing, ty);
            if let Some(journal) = self.trials.last_mut() {
                journal.push((key, Some(previous)));
            }
            return;
        }
        if let Some(journal) = self.trials.last_mut() {
            journal.push((key, None));
        }
        if self.entries.len() >= self.capacity {
            self.evict_oldest_half();
        }
        self.order.push_back(key);
        self.entries.insert(key, ty);
    }

    fn evict_oldest_half(&mut self) {
        let count = (self.entries.len() / 2).max(1);
        for _ in 0..count {
            if let Some(key) = self.order.pop_front() {
                self.entries.remove(&key);
            }
        }
        trace!(evicted = count, remaining = self.entries.len(), "type cache eviction");
    }

    pub fn begin_trial(&mut self) {
        self.trials.push(vec![]);
    }

    /// Undoes every insert made since the matching `begin_trial`.
    pub fn rollback_trial(&mut self) {
        let Some(journal) = self.trials.pop() else {
            return;
        };
        for (key, previous) in journal.into_iter().rev() {
            match previous {
                Some(ty) => {
                    if let Some(existing) = self.entries.get_mut(&key) {
                        *existing = ty;
                    }
                }
                None => {
                    self.entries.remove(&key);
                    self.order.retain(|queued| *queued != key);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.trials.clear();
    }
}
