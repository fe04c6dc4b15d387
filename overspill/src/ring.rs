//! Fixed-capacity ring buffer for overspill archives.
//!
//! This module provides the storage layer underneath [`Archive`]: a generic
//! circular buffer that keeps the most recent `capacity` elements in
//! insertion order and hands back the element it evicts when full.
//!
//! # Design
//!
//! The ring buffer is an owned boxed slice of slots plus two cursors:
//! - `head` is the slot of the oldest element
//! - `len` is the number of occupied slots (at most `capacity`)
//! - The next write goes to `(head + len) % capacity`
//! - When full, the write slot equals `head`, so the oldest element is
//!   replaced and `head` advances
//!
//! Capacity is fixed for the lifetime of a buffer. Changing capacity means
//! building a new buffer and replaying the old contents into it.
//!
//! [`Archive`]: crate::archive::Archive

/// A fixed-capacity circular buffer that evicts its oldest element on overflow.
///
/// A capacity of zero is legal: every inserted element is evicted immediately
/// and the buffer never holds anything.
///
/// # Thread Safety
///
/// `RingBuffer` has no interior mutability. Archives share buffers between
/// threads only behind an `Arc` and never mutate a shared buffer.
#[derive(Debug, Clone)]
pub struct RingBuffer<E> {
    /// Backing storage; `None` marks an unoccupied slot.
    slots: Box<[Option<E>]>,
    /// Slot index of the oldest element.
    head: usize,
    /// Number of occupied slots.
    len: usize,
}

impl<E> RingBuffer<E> {
    /// Creates an empty ring buffer holding at most `capacity` elements.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use overspill::ring::RingBuffer;
    ///
    /// let ring: RingBuffer<u32> = RingBuffer::new(4);
    /// assert_eq!(ring.capacity(), 4);
    /// assert!(ring.is_empty());
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
            head: 0,
            len: 0,
        }
    }

    /// Returns the maximum number of elements this buffer holds.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of elements currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the buffer holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if the next insert will evict an element.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Inserts `element` as the newest element.
    ///
    /// If the buffer is at capacity the oldest element is evicted and
    /// returned; otherwise returns `None`. With capacity zero the element
    /// itself is returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use overspill::ring::RingBuffer;
    ///
    /// let mut ring = RingBuffer::new(2);
    /// assert_eq!(ring.insert(1), None);
    /// assert_eq!(ring.insert(2), None);
    /// assert_eq!(ring.insert(3), Some(1));
    /// assert_eq!(ring.snapshot(), vec![2, 3]);
    /// ```
    pub fn insert(&mut self, element: E) -> Option<E> {
        let capacity = self.capacity();
        if capacity == 0 {
            return Some(element);
        }

        if self.len == capacity {
            // Full: the write slot is the oldest slot.
            let evicted = self.slots[self.head].replace(element);
            self.head = (self.head + 1) % capacity;
            evicted
        } else {
            let tail = (self.head + self.len) % capacity;
            self.slots[tail] = Some(element);
            self.len += 1;
            None
        }
    }

    /// Returns the element at logical position `index` (0 is the oldest).
    pub fn get(&self, index: usize) -> Option<&E> {
        if index >= self.len {
            return None;
        }
        self.slots[(self.head + index) % self.capacity()].as_ref()
    }

    /// Returns the oldest element, if any.
    pub fn oldest(&self) -> Option<&E> {
        self.get(0)
    }

    /// Returns the newest element, if any.
    pub fn newest(&self) -> Option<&E> {
        self.len.checked_sub(1).and_then(|last| self.get(last))
    }

    /// Returns an iterator over the held elements, oldest to newest.
    pub fn iter(&self) -> Iter<'_, E> {
        Iter {
            ring: self,
            front: 0,
            back: self.len,
        }
    }

    /// Consumes the buffer, returning its elements oldest to newest.
    pub fn drain(self) -> Vec<E> {
        let capacity = self.capacity();
        let (head, len) = (self.head, self.len);
        let mut slots = self.slots.into_vec();
        if capacity > 0 {
            slots.rotate_left(head);
        }
        slots.into_iter().take(len).flatten().collect()
    }
}

impl<E: Clone> RingBuffer<E> {
    /// Returns an independent copy of the held elements, oldest to newest.
    ///
    /// The returned vector shares nothing with the buffer; later inserts are
    /// not observable through it.
    pub fn snapshot(&self) -> Vec<E> {
        self.iter().cloned().collect()
    }

    /// Returns an independent copy of the elements from logical position
    /// `start` through the newest.
    ///
    /// Returns an empty vector if `start >= len()`.
    pub fn snapshot_from(&self, start: usize) -> Vec<E> {
        self.iter().skip(start).cloned().collect()
    }
}

impl<'a, E> IntoIterator for &'a RingBuffer<E> {
    type Item = &'a E;
    type IntoIter = Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a ring buffer's elements in insertion order.
///
/// Hides the wraparound: yields logical positions `0..len`, mapping each to
/// its physical slot.
#[derive(Debug, Clone)]
pub struct Iter<'a, E> {
    ring: &'a RingBuffer<E>,
    front: usize,
    back: usize,
}

impl<'a, E> Iterator for Iter<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
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

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl<E> DoubleEndedIterator for Iter<'_, E> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        self.ring.get(self.back)
    }
}

impl<E> ExactSizeIterator for Iter<'_, E> {}
