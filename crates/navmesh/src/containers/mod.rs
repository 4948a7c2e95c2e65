//! Fixed-capacity containers working inside caller-provided memory
//!
//! None of these containers allocates: they are built over a mutable slice owned by the
//! caller and report exhaustion through [`ContainerError`](crate::ContainerError)
//! instead of growing.

mod binary_heap;
mod fixed_array;
mod fixed_deque;

pub use binary_heap::BinaryMinHeap;
pub use fixed_array::FixedArray;
pub use fixed_deque::FixedDeque;
