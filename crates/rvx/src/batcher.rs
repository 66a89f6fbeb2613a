//! 🧺 The Batch Accumulator — a shopping cart with a strict item limit.
//!
//! Records go in one at a time. When the cart is full, the pipeline notices
//! (we never seal ourselves, that's not our job) and calls [`BatchAccumulator::drain`],
//! which hands over the whole cart and grabs a fresh empty one.

use crate::common::Record;

/// 📦 Collects records until `capacity` is reached.
#[derive(Debug)]
pub(crate) struct BatchAccumulator {
    capacity: usize,
    records: Vec<Record>,
}

impl BatchAccumulator {
    /// 🏗️ A capacity of 0 would mean "always full, never holding anything",
    /// which is a philosophy, not a batch size. It gets bumped to 1.
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn append(&mut self, record: Record) {
        self.records.push(record);
    }

    pub(crate) fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 🚚 Hand over everything collected so far and start over empty.
    pub(crate) fn drain(&mut self) -> Vec<Record> {
        std::mem::replace(&mut self.records, Vec::with_capacity(self.capacity))
    }
}
