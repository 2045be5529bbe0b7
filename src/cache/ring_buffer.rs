//! Ring Buffer Module
//!
//! Fixed-capacity circular sequence with O(1) append at the tail and
//! removal at the head.
//!
//! Logical index 0 is the oldest element. A logical index maps to the
//! physical slot `(head + index) % capacity`.

use std::iter::FusedIterator;
use std::ops::{Index, IndexMut};

// == Ring Buffer ==
/// Fixed-capacity circular buffer. Never grows.
#[derive(Debug)]
pub struct RingBuffer<T> {
    /// Physical storage, `None` for vacant slots
    slots: Box<[Option<T>]>,
    /// Physical index of the oldest element
    head: usize,
    /// Number of occupied slots
    len: usize,
}

impl<T> RingBuffer<T> {
    // == Constructor ==
    /// Creates an empty ring with `capacity` slots.
    ///
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be greater than 0");
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots: slots.into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    // == Append Last ==
    /// Inserts `value` after the newest element.
    ///
    /// # Panics
    /// If the ring is full. Callers must make room first.
    pub fn append_last(&mut self, value: T) {
        assert!(
            !self.is_full(),
            "append_last on a full ring buffer (capacity {})",
            self.capacity()
        );
        let slot = self.physical_index(self.len);
        debug_assert!(self.slots[slot].is_none());
        self.slots[slot] = Some(value);
        self.len += 1;
    }

    // == Remove First ==
    /// Removes and returns the oldest element.
    ///
    /// # Panics
    /// If the ring is empty.
    pub fn remove_first(&mut self) -> T {
        assert!(!self.is_empty(), "remove_first on an empty ring buffer");
        let value = match self.slots[self.head].take() {
            Some(value) => value,
            None => unreachable!("occupied head slot is vacant"),
        };
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        value
    }

    /// Drops every element, keeping the capacity.
    pub fn clear(&mut self) {
        while !self.is_empty() {
            self.remove_first();
        }
        self.head = 0;
    }

    // == Indexed Access ==
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        self.slots[self.physical_index(index)].as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len {
            return None;
        }
        let slot = self.physical_index(index);
        self.slots[slot].as_mut()
    }

    /// Oldest element.
    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    /// Newest element.
    pub fn last(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|index| self.get(index))
    }

    pub fn last_mut(&mut self) -> Option<&mut T> {
        match self.len.checked_sub(1) {
            Some(index) => self.get_mut(index),
            None => None,
        }
    }

    /// Iterates oldest to newest. Reverse it to walk newest first.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            ring: self,
            front: 0,
            back: self.len,
        }
    }

    fn physical_index(&self, index: usize) -> usize {
        let capacity = self.capacity();
        let index = self.head + index;
        if index >= capacity {
            index - capacity
        } else {
            index
        }
    }
}

impl<T> Index<usize> for RingBuffer<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(value) => value,
            None => panic!(
                "ring buffer index {} out of bounds (len {})",
                index, self.len
            ),
        }
    }
}

impl<T> IndexMut<usize> for RingBuffer<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Some(value) => value,
            None => panic!("ring buffer index {} out of bounds (len {})", index, len),
        }
    }
}

impl<'a, T> IntoIterator for &'a RingBuffer<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

// == Iterator ==
/// Borrowing iterator over a [`RingBuffer`], oldest first.
#[derive(Debug, Clone)]
pub struct Iter<'a, T> {
    ring: &'a RingBuffer<T>,
    front: usize,
    back: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        let item = self.ring.get(self.front);
        self.front += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        self.ring.get(self.back)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}
