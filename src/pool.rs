//! Thread-safe pools of reusable parsers and arenas.
//!
//! A pool hands out owned instances, so exclusive use is enforced by
//! ownership: an instance is either idle in the pool or held by exactly one
//! caller. Releasing consumes the instance.

use parking_lot::Mutex;

use crate::arena::Arena;
use crate::decode::Parser;

/// Types that can be returned to a [`Pool`] and handed out again.
pub trait Recycle: Default {
    /// Drops any state from the previous use while keeping capacity.
    fn recycle(&mut self);
}

impl Recycle for Parser {
    fn recycle(&mut self) {
        self.reset();
    }
}

impl Recycle for Arena {
    fn recycle(&mut self) {
        self.reset();
    }
}

#[derive(Debug)]
pub struct Pool<T> {
    idle: Mutex<Vec<T>>,
    limit: Option<usize>,
}

pub type ParserPool = Pool<Parser>;
pub type ArenaPool = Pool<Arena>;

impl<T: Recycle> Pool<T> {
    pub fn new() -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            limit: None,
        }
    }

    /// Keeps at most `limit` idle instances; extra releases are dropped.
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::with_capacity(limit)),
            limit: Some(limit),
        }
    }

    /// Returns an idle instance, or a fresh one when the pool is empty.
    pub fn acquire(&self) -> T {
        self.idle.lock().pop().unwrap_or_default()
    }

    /// Resets `item` and keeps it, unless the pool is already full.
    pub fn release(&self, mut item: T) {
        if self.limit.is_some_and(|limit| self.idle.lock().len() >= limit) {
            return;
        }
        item.recycle();
        let mut idle = self.idle.lock();
        if self.limit.is_some_and(|limit| idle.len() >= limit) {
            return;
        }
        idle.push(item);
    }

    /// Number of instances currently waiting in the pool.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }
}

impl<T: Recycle> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[rstest]
    fn test_release_then_acquire_reuses_instance() {
        let pool = ArenaPool::new();
        let mut arena = pool.acquire();
        let id = arena.new_string("hello");
        assert!(!arena.is_empty());
        pool.release(arena);
        assert_eq!(pool.idle(), 1);

        let arena = pool.acquire();
        assert!(arena.is_empty());
        assert_eq!(arena.buffer_len(), 0);
        assert!(arena.value(id).is_null());
        assert_eq!(pool.idle(), 0);
    }

    #[rstest]
    fn test_capacity_limit() {
        let pool = ParserPool::with_capacity_limit(1);
        let first = pool.acquire();
        let second = pool.acquire();
        pool.release(first);
        pool.release(second);
        assert_eq!(pool.idle(), 1);
    }

    #[derive(Default)]
    struct Tracked;

    static TRACKED_RECYCLES: AtomicUsize = AtomicUsize::new(0);

    impl Recycle for Tracked {
        fn recycle(&mut self) {
            TRACKED_RECYCLES.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[rstest]
    fn test_full_pool_drops_without_recycling() {
        let pool = Pool::<Tracked>::with_capacity_limit(1);
        pool.release(Tracked);
        pool.release(Tracked);
        pool.release(Tracked);
        assert_eq!(pool.idle(), 1);
        assert_eq!(TRACKED_RECYCLES.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    fn test_concurrent_use() {
        let pool = ParserPool::new();
        std::thread::scope(|scope| {
            for worker in 0..8i64 {
                let pool = &pool;
                scope.spawn(move || {
                    for round in 0..50i64 {
                        let mut parser = pool.acquire();
                        let text = format!("worker = {worker}; round = {round};");
                        let value = parser.parse(&text).unwrap();
                        assert_eq!(value.get_int(&["worker"]), worker);
                        assert_eq!(value.get_int(&["round"]), round);
                        pool.release(parser);
                    }
                });
            }
        });
        assert!(pool.idle() <= 8);
        assert!(pool.idle() >= 1);
    }
}
