//! Bounded membership sets for media that has already been acquired.
//!
//! Eviction follows insertion order, not access order: re-marking an id
//! that is already present leaves its position untouched.

use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone)]
pub struct ResourceTracker {
    capacity: usize,
    members: HashSet<String>,
    // Oldest first; always holds exactly the ids in `members`.
    order: VecDeque<String>,
}

impl ResourceTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            members: HashSet::with_capacity(capacity + 1),
            order: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn has(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Record `id` as acquired. Returns `true` when the id was not already
    /// tracked. Oldest ids are evicted until the capacity holds again.
    pub fn mark_acquired(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.members.contains(&id) {
            return false;
        }
        self.members.insert(id.clone());
        self.order.push_back(id);

        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.members.remove(&evicted);
            }
        }
        true
    }

    pub fn clear(&mut self) {
        self.members.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tracked ids, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}
