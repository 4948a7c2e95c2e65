use crate::status::{ContainerError, ContainerResult};

/// Binary min-heap over a caller-provided slice.
///
/// Items are ordered with `<`: the smallest item is always at the root. Equal items
/// come out in an unspecified order, so callers needing a stable order must encode a
/// tie-break in `T` itself.
pub struct BinaryMinHeap<'b, T> {
    heap: &'b mut [T],
    size: usize,
}

impl<'b, T: Copy + PartialOrd> BinaryMinHeap<'b, T> {
    pub fn new(buffer: &'b mut [T]) -> Self {
        Self {
            heap: buffer,
            size: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn capacity(&self) -> usize {
        self.heap.len()
    }

    pub fn clear(&mut self) {
        self.size = 0;
    }

    /// Returns the minimum without removing it
    pub fn find_min(&self) -> Option<&T> {
        if self.size > 0 {
            Some(&self.heap[0])
        } else {
            None
        }
    }

    pub fn insert(&mut self, item: T) -> ContainerResult {
        if self.heap.is_empty() {
            return Err(ContainerError::OutOfRange);
        }
        if self.size == self.heap.len() {
            return Err(ContainerError::FullBuffer);
        }
        self.size += 1;
        self.bubble_up(self.size - 1, item);
        Ok(())
    }

    /// Removes and returns the minimum
    pub fn delete_min(&mut self) -> Result<T, ContainerError> {
        if self.size == 0 {
            return Err(ContainerError::OutOfRange);
        }

        let result = self.heap[0];
        self.size -= 1;

        if self.size > 0 {
            let last = self.heap[self.size];
            self.trickle_down(0, last);
        }

        Ok(result)
    }

    /// Items currently held, in heap order
    pub fn as_slice(&self) -> &[T] {
        &self.heap[..self.size]
    }

    fn bubble_up(&mut self, mut i: usize, item: T) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !(item < self.heap[parent]) {
                break;
            }
            self.heap[i] = self.heap[parent];
            i = parent;
        }
        self.heap[i] = item;
    }

    fn trickle_down(&mut self, mut i: usize, item: T) {
        loop {
            let child1 = 2 * i + 1;
            if child1 >= self.size {
                break;
            }

            let child2 = child1 + 1;
            let mut min_child = child1;
            if child2 < self.size && self.heap[child2] < self.heap[child1] {
                min_child = child2;
            }

            if !(self.heap[min_child] < item) {
                break;
            }

            self.heap[i] = self.heap[min_child];
            i = min_child;
        }
        self.heap[i] = item;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav_mesh_types::NavTriangleKey;
    use crate::traversal::PropagationNode;

    #[test]
    fn test_heap_order() {
        let mut memory = [0.0f32; 8];
        let mut heap = BinaryMinHeap::new(&mut memory);
        for cost in [5.0, 3.0, 7.0, 1.0, 4.0] {
            heap.insert(cost).unwrap();
        }
        assert_eq!(heap.find_min(), Some(&1.0));
        assert_eq!(heap.delete_min(), Ok(1.0));
        assert_eq!(heap.delete_min(), Ok(3.0));
        heap.insert(2.0).unwrap();
        assert_eq!(heap.delete_min(), Ok(2.0));
        assert_eq!(heap.delete_min(), Ok(4.0));
        assert_eq!(heap.delete_min(), Ok(5.0));
        assert_eq!(heap.delete_min(), Ok(7.0));
        assert_eq!(heap.delete_min(), Err(ContainerError::OutOfRange));
    }

    #[test]
    fn test_heap_matches_reference_sort() {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut memory = [0u32; 64];
        let mut heap = BinaryMinHeap::new(&mut memory);
        let mut reference: Vec<u32> = Vec::new();

        for _ in 0..2000 {
            let insert = heap.is_empty() || (heap.len() < heap.capacity() && rng.bool());
            if insert {
                let value = rng.u32(0..1000);
                heap.insert(value).unwrap();
                reference.push(value);
            } else {
                reference.sort_unstable();
                let expected = reference.remove(0);
                assert_eq!(heap.delete_min(), Ok(expected));
            }
            assert_eq!(heap.len(), reference.len());
        }
    }

    #[test]
    fn test_full_heap() {
        let mut memory = [0i32; 2];
        let mut heap = BinaryMinHeap::new(&mut memory);
        heap.insert(2).unwrap();
        heap.insert(1).unwrap();
        assert_eq!(heap.insert(0), Err(ContainerError::FullBuffer));
        assert_eq!(heap.delete_min(), Ok(1));
        assert_eq!(heap.insert(0), Ok(()));

        let mut no_memory: [i32; 0] = [];
        let mut heap = BinaryMinHeap::new(&mut no_memory);
        assert_eq!(heap.insert(0), Err(ContainerError::OutOfRange));
    }

    #[test]
    fn test_full_propagation_heap() {
        let node = |triangle: u32, cost: f32| PropagationNode {
            triangle: NavTriangleKey {
                triangle,
                ..Default::default()
            },
            cost,
            sequence: triangle,
        };
        let mut memory = [PropagationNode::default(); 3];
        let mut heap = BinaryMinHeap::new(&mut memory);
        heap.insert(node(0, 2.0)).unwrap();
        heap.insert(node(1, 0.5)).unwrap();
        heap.insert(node(2, 1.0)).unwrap();
        assert_eq!(heap.insert(node(3, 0.1)), Err(ContainerError::FullBuffer));
        assert_eq!(heap.len(), 3);
        assert_eq!(heap.find_min().map(|min| min.triangle.triangle), Some(1));
    }
}
