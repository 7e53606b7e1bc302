use std::collections::{vec_deque, VecDeque};

/// Bounded buffer kept in insertion order. Elements may leave from
/// anywhere, the rest keep their relative order.
#[derive(Debug)]
pub struct Queue<T> {
    buffer: VecDeque<T>,
    capacity: usize,
}

impl<T> Queue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }
    /// Append `elt`, or hand it back when the queue is full.
    pub fn insert(&mut self, elt: T) -> Result<(), T> {
        if self.is_full() {
            return Err(elt);
        }
        self.buffer.push_back(elt);
        Ok(())
    }
    pub fn len(&self) -> usize {
        self.buffer.len()
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.capacity
    }
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.buffer.iter()
    }
    /// Drop every element not matching `keep`.
    /// Return the number dropped.
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, keep: F) -> usize {
        let before = self.buffer.len();
        self.buffer.retain(keep);
        before - self.buffer.len()
    }
}

impl<'b, T> IntoIterator for &'b Queue<T> {
    type IntoIter = vec_deque::Iter<'b, T>;
    type Item = &'b T;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
