use crate::status::{ContainerError, ContainerResult};

/// Circular double-ended queue over a caller-provided slice.
///
/// One slot is kept free to tell a full queue from an empty one, so a slice of
/// `n` items holds at most `n - 1` of them. Use [`FixedDeque::slots_for`] to size
/// the memory for a given capacity.
pub struct FixedDeque<'b, T> {
    buffer: &'b mut [T],
    head: usize,
    tail: usize,
}

impl<'b, T: Copy> FixedDeque<'b, T> {
    pub fn new(buffer: &'b mut [T]) -> Self {
        Self {
            buffer,
            head: 0,
            tail: 0,
        }
    }

    /// Number of slots needed to hold `capacity` items
    pub fn slots_for(capacity: usize) -> usize {
        capacity + 1
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len().saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        let n = self.buffer.len();
        if n == 0 {
            return 0;
        }
        (self.tail + n - self.head) % n
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() < 2 || self.len() == self.capacity()
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    fn check_push(&self) -> ContainerResult {
        if self.buffer.len() < 2 {
            return Err(ContainerError::OutOfRange);
        }
        if self.len() == self.capacity() {
            return Err(ContainerError::FullBuffer);
        }
        Ok(())
    }

    pub fn push_back(&mut self, item: T) -> ContainerResult {
        self.check_push()?;
        self.buffer[self.tail] = item;
        self.tail = (self.tail + 1) % self.buffer.len();
        Ok(())
    }

    pub fn push_front(&mut self, item: T) -> ContainerResult {
        self.check_push()?;
        let n = self.buffer.len();
        self.head = (self.head + n - 1) % n;
        self.buffer[self.head] = item;
        Ok(())
    }

    pub fn pop_front(&mut self) -> Result<T, ContainerError> {
        if self.is_empty() {
            return Err(ContainerError::OutOfRange);
        }
        let item = self.buffer[self.head];
        self.head = (self.head + 1) % self.buffer.len();
        Ok(item)
    }

    pub fn pop_back(&mut self) -> Result<T, ContainerError> {
        if self.is_empty() {
            return Err(ContainerError::OutOfRange);
        }
        let n = self.buffer.len();
        self.tail = (self.tail + n - 1) % n;
        Ok(self.buffer[self.tail])
    }

    pub fn front(&self) -> Option<&T> {
        if self.is_empty() {
            None
        } else {
            Some(&self.buffer[self.head])
        }
    }

    pub fn back(&self) -> Option<&T> {
        if self.is_empty() {
            None
        } else {
            let n = self.buffer.len();
            Some(&self.buffer[(self.tail + n - 1) % n])
        }
    }

    /// Iterates from front to back
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let n = self.buffer.len();
        (0..self.len()).map(move |i| &self.buffer[(self.head + i) % n])
    }
}

impl<T: Copy + PartialEq> FixedDeque<'_, T> {
    /// Linear search
    pub fn contains(&self, item: &T) -> bool {
        self.iter().any(|x| x == item)
    }
}
