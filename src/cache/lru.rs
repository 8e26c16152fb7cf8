//! LRU (Least Recently Used) cache implementation for block caching.
//!
//! Entries live in an arena of slots addressed by stable indices. A doubly
//! linked recency list threads through the slots (most recent at the head),
//! and a map from block index to slot gives O(1) lookup, promotion and
//! eviction without aliasing pointers.

use bytes::Bytes;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;

/// Statistics for cache performance monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of lookups that found the block resident
    pub hits: u64,
    /// Number of lookups that did not find the block
    pub misses: u64,
    /// Number of blocks currently cached
    pub cached_blocks: usize,
    /// Number of new entries inserted
    pub insertions: u64,
    /// Number of entries evicted to make room
    pub evictions: u64,
}

impl CacheStats {
    /// Cache hit ratio as a percentage (0.0 to 100.0).
    ///
    /// Defined as 0 when no lookups have happened yet.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }

    /// Total number of lookups.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

#[derive(Debug)]
struct Node {
    block: u64,
    data: Bytes,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Everything behind the cache lock.
#[derive(Debug, Default)]
struct LruState {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    map: HashMap<u64, usize>,
    /// Most recently used
    head: Option<usize>,
    /// Least recently used
    tail: Option<usize>,
    stats: CacheStats,
}

impl LruState {
    fn node(&self, slot: usize) -> &Node {
        self.slots[slot].as_ref().expect("slot in recency list must be occupied")
    }

    fn node_mut(&mut self, slot: usize) -> &mut Node {
        self.slots[slot].as_mut().expect("slot in recency list must be occupied")
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = {
            let node = self.node(slot);
            (node.prev, node.next)
        };

        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }

        let node = self.node_mut(slot);
        node.prev = None;
        node.next = None;
    }

    fn push_front(&mut self, slot: usize) {
        let old_head = self.head;
        {
            let node = self.node_mut(slot);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => self.node_mut(h).prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
    }

    fn promote(&mut self, slot: usize) {
        if self.head != Some(slot) {
            self.unlink(slot);
            self.push_front(slot);
        }
    }

    fn allocate(&mut self, node: Node) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    /// Unlinks the slot and returns its node to the caller.
    fn release(&mut self, slot: usize) -> Node {
        self.unlink(slot);
        let node = self.slots[slot].take().expect("released slot must be occupied");
        self.free.push(slot);
        self.map.remove(&node.block);
        self.stats.cached_blocks = self.map.len();
        node
    }

    fn evict_oldest(&mut self) {
        if let Some(tail) = self.tail {
            let node = self.release(tail);
            self.stats.evictions += 1;
            log::debug!("Evicted block {} from cache", node.block);
        }
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.map.clear();
        self.head = None;
        self.tail = None;
        self.stats.cached_blocks = 0;
    }

    #[cfg(test)]
    fn order(&self) -> Vec<u64> {
        let mut out = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            let node = self.node(slot);
            out.push(node.block);
            cursor = node.next;
        }
        out
    }
}

/// Thread-safe, fixed-capacity LRU cache of block contents.
///
/// Every operation holds a single lock for its full duration, so operations
/// on one cache observe a total order.
///
/// # Thread Safety
///
/// This cache can be shared across threads using `Arc<LruBlockCache>`.
#[derive(Debug)]
pub struct LruBlockCache {
    /// Maximum number of cached blocks
    capacity: usize,
    state: Mutex<LruState>,
}

impl LruBlockCache {
    /// Create a new cache holding at most `capacity` blocks.
    ///
    /// A capacity of 0 disables caching: every lookup misses.
    ///
    /// # Examples
    ///
    /// ```
    /// use blocksim::cache::LruBlockCache;
    ///
    /// let cache = LruBlockCache::new(100);
    /// cache.put(7, "hello");
    /// assert_eq!(cache.get(7).as_deref(), Some(&b"hello"[..]));
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self { capacity, state: Mutex::new(LruState::default()) }
    }

    /// Look up a block.
    ///
    /// Returns `Some(data)` and promotes the entry to most recently used on a
    /// hit. Returns `None` on a miss. A resident block with empty contents is
    /// still a hit.
    pub fn get(&self, block: u64) -> Option<Bytes> {
        let mut state = self.state.lock();

        match state.map.get(&block).copied() {
            Some(slot) => {
                state.promote(slot);
                state.stats.hits += 1;
                Some(state.node(slot).data.clone())
            }
            None => {
                state.stats.misses += 1;
                None
            }
        }
    }

    /// Insert or overwrite a block.
    ///
    /// An existing entry is overwritten and promoted. A new entry evicts the
    /// least recently used block first when the cache is full.
    pub fn put(&self, block: u64, data: impl Into<Bytes>) {
        if self.capacity == 0 {
            return;
        }

        let data = data.into();
        let mut state = self.state.lock();

        if let Some(slot) = state.map.get(&block).copied() {
            state.node_mut(slot).data = data;
            state.promote(slot);
            return;
        }

        if state.len() >= self.capacity {
            state.evict_oldest();
        }

        let slot = state.allocate(Node { block, data, prev: None, next: None });
        state.push_front(slot);
        state.map.insert(block, slot);
        state.stats.insertions += 1;
        state.stats.cached_blocks = state.map.len();
    }

    /// Remove a block from the cache.
    ///
    /// Returns true if the block was resident.
    pub fn remove(&self, block: u64) -> bool {
        let mut state = self.state.lock();
        match state.map.get(&block).copied() {
            Some(slot) => {
                state.release(slot);
                true
            }
            None => false,
        }
    }

    /// Clear all entries from the cache.
    ///
    /// Hit and miss counters are kept.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        let dropped = state.len();
        state.clear();
        log::info!("Cleared {} blocks from cache", dropped);
    }

    /// Check membership without touching recency order or statistics.
    pub fn contains(&self, block: u64) -> bool {
        self.state.lock().map.contains_key(&block)
    }

    /// Get a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats.clone()
    }

    /// Reset the hit, miss, insertion and eviction counters to zero.
    pub fn reset_stats(&self) {
        let mut state = self.state.lock();
        let cached_blocks = state.len();
        state.stats = CacheStats { cached_blocks, ..CacheStats::default() };
    }

    /// Get the number of cached blocks.
    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the maximum number of cached blocks.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn order(cache: &LruBlockCache) -> Vec<u64> {
        cache.state.lock().order()
    }

    #[test]
    fn test_cache_basic_operations() {
        let cache = LruBlockCache::new(4);

        // Initially empty
        assert_eq!(cache.get(1), None);

        cache.put(1, "one");
        assert_eq!(cache.get(1), Some(Bytes::from("one")));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.insertions, 1);
        assert_eq!(stats.cached_blocks, 1);
    }

    #[test]
    fn test_capacity_two_evicts_first() {
        let cache = LruBlockCache::new(2);

        cache.put(1, "a");
        cache.put(2, "b");
        cache.put(3, "c");

        assert!(!cache.contains(1));
        assert!(cache.contains(2));
        assert!(cache.contains(3));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_get_updates_recency() {
        let cache = LruBlockCache::new(3);

        cache.put(1, "a");
        cache.put(2, "b");
        cache.put(3, "c");

        // Access 1 so that 2 becomes the oldest
        assert!(cache.get(1).is_some());
        cache.put(4, "d");

        assert!(cache.contains(1));
        assert!(!cache.contains(2));
        assert_eq!(order(&cache), vec![4, 1, 3]);
    }

    #[test]
    fn test_put_update_promotes_and_overwrites() {
        let cache = LruBlockCache::new(3);

        cache.put(1, "a");
        cache.put(2, "b");
        cache.put(3, "c");
        cache.put(1, "a2");
        cache.put(4, "d");

        assert_eq!(cache.get(1), Some(Bytes::from("a2")));
        assert!(!cache.contains(2));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().insertions, 4);
    }

    #[test]
    fn test_empty_block_is_a_hit() {
        let cache = LruBlockCache::new(2);

        cache.put(5, Bytes::new());
        assert_eq!(cache.get(5), Some(Bytes::new()));
        assert_eq!(cache.get(6), None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_remove() {
        let cache = LruBlockCache::new(3);

        cache.put(1, "a");
        cache.put(2, "b");
        cache.put(3, "c");

        assert!(cache.remove(2));
        assert!(!cache.remove(2));
        assert_eq!(order(&cache), vec![3, 1]);
        assert_eq!(cache.stats().cached_blocks, 2);

        // Freed slot is reused
        cache.put(4, "d");
        assert_eq!(order(&cache), vec![4, 3, 1]);
        assert_eq!(cache.state.lock().slots.len(), 3);
    }

    #[test]
    fn test_clear_keeps_counters() {
        let cache = LruBlockCache::new(4);

        cache.put(1, "a");
        cache.put(2, "b");
        cache.get(1);
        cache.get(9);

        cache.clear();

        assert!(cache.is_empty());
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.cached_blocks, 0);
        assert_eq!(cache.get(1), None);
    }

    #[test]
    fn test_contains_does_not_touch_state() {
        let cache = LruBlockCache::new(2);

        cache.put(1, "a");
        cache.put(2, "b");

        let before = cache.stats();
        for _ in 0..10 {
            assert!(cache.contains(1));
            assert!(!cache.contains(3));
        }
        assert_eq!(cache.stats(), before);

        // 1 is still the oldest
        cache.put(3, "c");
        assert!(!cache.contains(1));
    }

    #[test]
    fn test_hit_ratio() {
        let cache = LruBlockCache::new(4);
        assert_eq!(cache.stats().hit_ratio(), 0.0);

        cache.put(1, "a");
        cache.get(1); // hit
        cache.get(1); // hit
        cache.get(1); // hit
        cache.get(2); // miss

        let stats = cache.stats();
        assert_eq!(stats.lookups(), 4);
        assert!((stats.hit_ratio() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset_stats() {
        let cache = LruBlockCache::new(4);

        cache.put(1, "a");
        cache.get(1);
        cache.get(2);

        cache.reset_stats();

        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.insertions, 0);
        assert_eq!(stats.cached_blocks, 1);
    }

    #[test]
    fn test_cache_disabled_when_capacity_zero() {
        let cache = LruBlockCache::new(0);

        cache.put(1, "a");

        assert_eq!(cache.get(1), None);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let cache = Arc::new(LruBlockCache::new(64));
        let mut handles = vec![];

        for i in 0..8u64 {
            let cache_clone = Arc::clone(&cache);
            let handle = thread::spawn(move || {
                for j in 0..8u64 {
                    let block = i * 8 + j;
                    let value = Bytes::from(vec![block as u8; 16]);
                    cache_clone.put(block, value.clone());
                    assert_eq!(cache_clone.get(block), Some(value));
                }
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 64);
        assert_eq!(cache.stats().hits, 64);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Get(u64),
        Put(u64, u8),
        Remove(u64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u64..12).prop_map(Op::Get),
            (0u64..12, any::<u8>()).prop_map(|(b, v)| Op::Put(b, v)),
            (0u64..12).prop_map(Op::Remove),
        ]
    }

    proptest! {
        /// The cache agrees with a naive vector-backed LRU model.
        #[test]
        fn prop_matches_model(capacity in 1usize..6, ops in prop::collection::vec(op_strategy(), 0..200)) {
            let cache = LruBlockCache::new(capacity);
            // Most recent first
            let mut model: Vec<(u64, u8)> = Vec::new();

            for op in ops {
                match op {
                    Op::Get(b) => {
                        let expected = model.iter().position(|(k, _)| *k == b).map(|pos| {
                            let entry = model.remove(pos);
                            model.insert(0, entry);
                            entry.1
                        });
                        let got = cache.get(b).map(|data| data[0]);
                        prop_assert_eq!(got, expected);
                    }
                    Op::Put(b, v) => {
                        if let Some(pos) = model.iter().position(|(k, _)| *k == b) {
                            model.remove(pos);
                        } else if model.len() >= capacity {
                            model.pop();
                        }
                        model.insert(0, (b, v));
                        cache.put(b, vec![v]);
                    }
                    Op::Remove(b) => {
                        let present = model.iter().position(|(k, _)| *k == b).map(|pos| model.remove(pos));
                        prop_assert_eq!(cache.remove(b), present.is_some());
                    }
                }

                let expected_order: Vec<u64> = model.iter().map(|(k, _)| *k).collect();
                prop_assert_eq!(order(&cache), expected_order);
                prop_assert!(cache.len() <= capacity);
                prop_assert_eq!(cache.stats().cached_blocks, cache.len());
            }
        }

        /// Without exceeding capacity, every put is readable with its last value.
        #[test]
        fn prop_puts_within_capacity_are_retrievable(puts in prop::collection::vec((0u64..16, any::<u8>()), 0..64)) {
            let cache = LruBlockCache::new(16);
            let mut last = HashMap::new();
            for (b, v) in &puts {
                cache.put(*b, vec![*v]);
                last.insert(*b, *v);
            }
            for (b, v) in last {
                prop_assert_eq!(cache.get(b), Some(Bytes::from(vec![v])));
            }
        }
    }
}
