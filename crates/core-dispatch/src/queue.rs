//! Priority queue over occurrence handles
//!
//! A binary min-heap on `(priority_key, seq)` with a position index so a
//! handle can be re-keyed or withdrawn in O(log n). The queue stores only
//! ids and ordering data; occurrences themselves live in the store.
//!
//! Ties on the key are broken by insertion sequence, earliest first.

use crate::occurrence::OccurrenceId;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeapEntry {
    key: i32,
    seq: u64,
    id: OccurrenceId,
}

impl HeapEntry {
    fn rank(&self) -> (i32, u64) {
        (self.key, self.seq)
    }
}

/// Indexed min-heap keyed by priority
#[derive(Debug, Clone, Default)]
pub struct PriorityQueue {
    heap: Vec<HeapEntry>,
    positions: HashMap<OccurrenceId, usize>,
}

impl PriorityQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, id: OccurrenceId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Current key of a queued handle
    pub fn key_of(&self, id: OccurrenceId) -> Option<i32> {
        self.positions.get(&id).map(|&i| self.heap[i].key)
    }

    /// Insert a handle; returns `false` if it is already queued
    pub fn push(&mut self, id: OccurrenceId, key: i32, seq: u64) -> bool {
        if self.positions.contains_key(&id) {
            return false;
        }
        let index = self.heap.len();
        self.heap.push(HeapEntry { key, seq, id });
        self.positions.insert(id, index);
        self.sift_up(index);
        true
    }

    pub fn peek(&self) -> Option<OccurrenceId> {
        self.heap.first().map(|e| e.id)
    }

    pub fn pop(&mut self) -> Option<OccurrenceId> {
        if self.heap.is_empty() {
            return None;
        }
        let id = self.heap[0].id;
        self.remove_at(0);
        Some(id)
    }

    /// Re-key a queued handle and restore heap order
    pub fn update(&mut self, id: OccurrenceId, key: i32) -> bool {
        let Some(&index) = self.positions.get(&id) else {
            return false;
        };
        let old = self.heap[index].key;
        self.heap[index].key = key;
        if key < old {
            self.sift_up(index);
        } else if key > old {
            self.sift_down(index);
        }
        true
    }

    /// Withdraw a handle wherever it sits
    pub fn remove(&mut self, id: OccurrenceId) -> bool {
        match self.positions.get(&id) {
            Some(&index) => {
                self.remove_at(index);
                true
            }
            None => false,
        }
    }

    /// Queued ids in pop order, without disturbing the heap
    pub fn ordered(&self) -> Vec<OccurrenceId> {
        let mut entries = self.heap.clone();
        entries.sort_by_key(HeapEntry::rank);
        entries.into_iter().map(|e| e.id).collect()
    }

    /// Check the heap property and the position index
    pub fn is_valid(&self) -> bool {
        if self.positions.len() != self.heap.len() {
            return false;
        }
        self.heap.iter().enumerate().all(|(i, entry)| {
            let parent_ok = i == 0 || self.heap[(i - 1) / 2].rank() <= entry.rank();
            parent_ok && self.positions.get(&entry.id) == Some(&i)
        })
    }

    fn remove_at(&mut self, index: usize) {
        let last = self.heap.len() - 1;
        self.swap(index, last);
        if let Some(entry) = self.heap.pop() {
            self.positions.remove(&entry.id);
        }
        if index < self.heap.len() {
            self.sift_up(index);
            self.sift_down(index);
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.heap.swap(a, b);
        self.positions.insert(self.heap[a].id, a);
        self.positions.insert(self.heap[b].id, b);
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.heap[index].rank() >= self.heap[parent].rank() {
                break;
            }
            self.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;
            if left < len && self.heap[left].rank() < self.heap[smallest].rank() {
                smallest = left;
            }
            if right < len && self.heap[right].rank() < self.heap[smallest].rank() {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.swap(index, smallest);
            index = smallest;
        }
    }
}
