//! FIFO work queue for light propagation.

/// One flood-fill work item: a world position and the light it carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightEntry {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub light: u8,
}

impl LightEntry {
    pub fn new(x: i32, y: i32, z: i32, light: u8) -> Self {
        Self { x, y, z, light }
    }
}

/// Unbounded FIFO ring buffer with power-of-two capacity.
///
/// When full, the capacity doubles and the live entries are moved to the
/// front of the new buffer in order.
#[derive(Debug)]
pub struct LightQueue<T> {
    buffer: Vec<Option<T>>,
    head: usize,
    len: usize,
}

impl<T> LightQueue<T> {
    const DEFAULT_CAPACITY: usize = 1024;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a queue holding at least `capacity` entries before growing.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        Self {
            buffer: std::iter::repeat_with(|| None).take(capacity).collect(),
            head: 0,
            len: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, item: T) {
        if self.len == self.buffer.len() {
            self.grow();
        }
        let tail = (self.head + self.len) & self.mask();
        self.buffer[tail] = Some(item);
        self.len += 1;
    }

    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let item = self.buffer[self.head].take();
        self.head = (self.head + 1) & self.mask();
        self.len -= 1;
        item
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        while self.pop().is_some() {}
        self.head = 0;
    }

    fn mask(&self) -> usize {
        self.buffer.len() - 1
    }

    fn grow(&mut self) {
        let capacity = self.buffer.len() * 2;
        let mut buffer: Vec<Option<T>> = Vec::with_capacity(capacity);
        for _ in 0..self.len {
            buffer.push(self.buffer[self.head].take());
            self.head = (self.head + 1) & self.mask();
        }
        buffer.resize_with(capacity, || None);
        self.buffer = buffer;
        self.head = 0;
    }
}

impl<T> Default for LightQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = LightQueue::with_capacity(4);
        for i in 0..3 {
            queue.push(i);
        }
        assert_eq!(queue.pop(), Some(0));
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_capacity_rounds_up_to_power_of_two() {
        assert_eq!(LightQueue::<u8>::with_capacity(5).capacity(), 8);
        assert_eq!(LightQueue::<u8>::with_capacity(0).capacity(), 1);
    }

    #[test]
    fn test_growth_preserves_order_across_wraparound() {
        let mut queue = LightQueue::with_capacity(4);
        queue.push(0);
        queue.push(1);
        queue.push(2);
        assert_eq!(queue.pop(), Some(0));
        assert_eq!(queue.pop(), Some(1));
        // Head is now at slot 2; these wrap around the end.
        for i in 3..9 {
            queue.push(i);
        }
        assert_eq!(queue.capacity(), 8);
        assert_eq!(queue.len(), 7);
        let drained: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained, (2..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_clear_resets() {
        let mut queue = LightQueue::with_capacity(2);
        queue.push(LightEntry::new(1, 2, 3, 15));
        queue.push(LightEntry::new(4, 5, 6, 14));
        queue.clear();
        assert!(queue.is_empty());
        queue.push(LightEntry::new(7, 8, 9, 13));
        assert_eq!(queue.pop(), Some(LightEntry::new(7, 8, 9, 13)));
    }
}
