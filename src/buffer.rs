// In: src/buffer.rs

//! Reusable fixed-capacity byte buffers and their pooled provider.
//!
//! A `Buffer` has exactly one owner at any instant: the `PageBuilder` while
//! accumulating, the `Page` while in flight, then back to the pool. Release
//! is deterministic: dropping a `Buffer` returns its storage to the pool it
//! came from, so the "no infinite accumulation" flush rule never depends on
//! collection timing.

use std::mem;
use std::sync::{Arc, Mutex};

use crate::error::BulkrowError;

/// Pooled provider of `Buffer`s. Cheap to clone; clones share one pool.
///
/// The allocator never inspects buffer contents. Capacities are rounded up
/// to a multiple of the pool page size so released buffers are reusable
/// across requests of similar magnitude.
#[derive(Clone)]
pub struct BufferAllocator {
    pool: Arc<Pool>,
}

struct Pool {
    page_size: usize,
    free: Mutex<Vec<Vec<u8>>>,
}

impl BufferAllocator {
    pub const DEFAULT_PAGE_SIZE: usize = 32 * 1024;

    pub fn new(page_size: usize) -> Self {
        assert!(page_size > 0, "page_size must be non-zero");
        Self {
            pool: Arc::new(Pool {
                page_size,
                free: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Returns a zeroed buffer with capacity >= `min_capacity`.
    ///
    /// Failure to reserve memory is fatal to the current task; this layer
    /// never retries.
    pub fn allocate(&self, min_capacity: usize) -> Result<Buffer, BulkrowError> {
        let capacity = self.round_up(min_capacity);

        let recycled = match self.pool.free.lock() {
            Ok(mut free) => {
                let position = free.iter().position(|v| v.capacity() >= capacity);
                position.map(|i| free.swap_remove(i))
            }
            // A poisoned pool just stops recycling, same as the release path.
            Err(_) => None,
        };

        let mut storage = match recycled {
            Some(mut storage) => {
                storage.clear();
                storage
            }
            None => {
                let mut storage = Vec::new();
                storage
                    .try_reserve_exact(capacity)
                    .map_err(|e| BulkrowError::BufferAllocation {
                        requested: capacity,
                        reason: e.to_string(),
                    })?;
                storage
            }
        };
        storage.resize(capacity, 0);

        log::trace!("allocated buffer: capacity={}", storage.len());
        Ok(Buffer {
            storage,
            limit: 0,
            pool: Arc::clone(&self.pool),
        })
    }

    fn round_up(&self, min_capacity: usize) -> usize {
        let pages = min_capacity.div_ceil(self.pool.page_size).max(1);
        pages * self.pool.page_size
    }

    #[cfg(test)]
    fn pooled_count(&self) -> usize {
        self.pool.free.lock().unwrap().len()
    }
}

impl Default for BufferAllocator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE_SIZE)
    }
}

/// A mutable, fixed-capacity byte region with a "bytes used" limit.
pub struct Buffer {
    storage: Vec<u8>,
    limit: usize,
    pool: Arc<Pool>,
}

impl Buffer {
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Bytes used so far.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Marks the first `limit` bytes as used. Panics past capacity; callers
    /// size their writes against `capacity()` first.
    pub fn set_limit(&mut self, limit: usize) {
        assert!(limit <= self.storage.len(), "limit exceeds buffer capacity");
        self.limit = limit;
    }

    /// The used prefix of the buffer.
    pub fn as_slice(&self) -> &[u8] {
        &self.storage[..self.limit]
    }

    /// The whole writable region, independent of the current limit.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.storage
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        let storage = mem::take(&mut self.storage);
        if storage.capacity() == 0 {
            return;
        }
        let mut free = match self.pool.free.lock() {
            Ok(free) => free,
            // A poisoned pool just stops recycling; dropping the storage is safe.
            Err(_) => return,
        };
        free.push(storage);
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("capacity", &self.storage.len())
            .field("limit", &self.limit)
            .finish()
    }
}

//==================================================================================
// Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_rounds_capacity_up_to_page_size() {
        let allocator = BufferAllocator::new(1024);
        let buffer = allocator.allocate(1).unwrap();
        assert_eq!(buffer.capacity(), 1024);

        let buffer = allocator.allocate(1025).unwrap();
        assert_eq!(buffer.capacity(), 2048);
    }

    #[test]
    fn test_dropping_a_buffer_returns_it_to_the_pool() {
        let allocator = BufferAllocator::new(1024);
        let buffer = allocator.allocate(100).unwrap();
        assert_eq!(allocator.pooled_count(), 0);

        drop(buffer);
        assert_eq!(allocator.pooled_count(), 1);

        // The next allocation of a compatible size reuses the pooled storage.
        let _buffer = allocator.allocate(512).unwrap();
        assert_eq!(allocator.pooled_count(), 0);
    }

    #[test]
    fn test_a_poisoned_pool_falls_back_to_fresh_allocations() {
        let allocator = BufferAllocator::new(1024);
        drop(allocator.allocate(1).unwrap());

        // Poison the pool lock by panicking a thread that holds it.
        let pool = Arc::clone(&allocator.pool);
        let _ = std::thread::spawn(move || {
            let _guard = pool.free.lock().unwrap();
            panic!("poison the pool lock");
        })
        .join();
        assert!(allocator.pool.free.lock().is_err());

        let buffer = allocator.allocate(1).unwrap();
        assert_eq!(buffer.capacity(), 1024);
        assert_eq!(buffer.limit(), 0);
    }

    #[test]
    fn test_recycled_buffers_come_back_zero_limited() {
        let allocator = BufferAllocator::new(64);
        let mut buffer = allocator.allocate(8).unwrap();
        buffer.bytes_mut()[0] = 0xAB;
        buffer.set_limit(8);
        drop(buffer);

        let buffer = allocator.allocate(8).unwrap();
        assert_eq!(buffer.limit(), 0);
        assert_eq!(buffer.as_slice(), &[] as &[u8]);
    }
}
