use crate::status::{ContainerError, ContainerResult};

/// Array with a fixed capacity given by the length of its backing slice
pub struct FixedArray<'b, T> {
    buffer: &'b mut [T],
    len: usize,
}

impl<'b, T: Copy> FixedArray<'b, T> {
    /// Creates an empty array over `buffer`
    pub fn new(buffer: &'b mut [T]) -> Self {
        Self { buffer, len: 0 }
    }

    pub fn push_back(&mut self, item: T) -> ContainerResult {
        if self.buffer.is_empty() {
            return Err(ContainerError::OutOfRange);
        }
        if self.len == self.buffer.len() {
            return Err(ContainerError::FullBuffer);
        }
        self.buffer[self.len] = item;
        self.len += 1;
        Ok(())
    }

    pub fn pop_back(&mut self) -> Result<T, ContainerError> {
        if self.len == 0 {
            return Err(ContainerError::OutOfRange);
        }
        self.len -= 1;
        Ok(self.buffer[self.len])
    }

    /// Returns the item at `idx`; `idx` must be lower than `len()`
    #[inline]
    pub fn get_item(&self, idx: usize) -> &T {
        debug_assert!(idx < self.len, "FixedArray index {} out of {}", idx, self.len);
        &self.buffer[idx]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.buffer[..self.len]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_full(&self) -> bool {
        self.len == self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl<T: Copy + PartialEq> FixedArray<'_, T> {
    /// Linear search
    pub fn contains(&self, item: &T) -> bool {
        self.as_slice().contains(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full() {
        let mut memory = [0u32; 3];
        let mut array = FixedArray::new(&mut memory);
        assert_eq!(array.push_back(1), Ok(()));
        assert_eq!(array.push_back(2), Ok(()));
        assert_eq!(array.push_back(3), Ok(()));
        assert_eq!(array.push_back(4), Err(ContainerError::FullBuffer));
        assert_eq!(array.as_slice(), &[1, 2, 3]);
        assert_eq!(*array.get_item(1), 2);
        assert!(array.contains(&3));

        assert_eq!(array.pop_back(), Ok(3));
        assert_eq!(array.push_back(5), Ok(()));
        array.clear();
        assert!(array.is_empty());
        assert_eq!(array.pop_back(), Err(ContainerError::OutOfRange));
    }

    #[test]
    fn test_no_memory() {
        let mut memory: [u32; 0] = [];
        let mut array = FixedArray::new(&mut memory);
        assert_eq!(array.push_back(1), Err(ContainerError::OutOfRange));
    }
}
