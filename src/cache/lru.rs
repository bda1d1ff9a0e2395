//! Fixed-capacity map with least-recently-used eviction
//!
//! Entries live in a slab threaded by a doubly linked recency list; the map
//! holds slab indices. Every operation is O(1), and an eviction reuses the
//! evicted slot so the slab never grows past capacity.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
pub struct LruMap<K, V> {
    map: HashMap<K, usize>,
    nodes: Vec<Node<K, V>>,
    /// Most recently used
    head: Option<usize>,
    /// Least recently used
    tail: Option<usize>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V> LruMap<K, V> {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            map: HashMap::with_capacity(capacity.min(4096)),
            nodes: Vec::new(),
            head: None,
            tail: None,
            capacity,
        }
    }

    /// Look up and mark as most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.touch(idx);
        Some(&self.nodes[idx].value)
    }

    /// Look up without touching recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.map.get(key).map(|&idx| &self.nodes[idx].value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Insert or overwrite, marking the entry most recently used. Returns the
    /// entry evicted to make room, if any.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if let Some(&idx) = self.map.get(&key) {
            self.nodes[idx].value = value;
            self.touch(idx);
            return None;
        }

        if self.nodes.len() >= self.capacity {
            if let Some(idx) = self.tail {
                self.detach(idx);
                let node = &mut self.nodes[idx];
                let old_key = std::mem::replace(&mut node.key, key.clone());
                let old_value = std::mem::replace(&mut node.value, value);
                self.map.remove(&old_key);
                self.map.insert(key, idx);
                self.attach_front(idx);
                return Some((old_key, old_value));
            }
        }

        let idx = self.nodes.len();
        self.nodes.push(Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        });
        self.map.insert(key, idx);
        self.attach_front(idx);
        None
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Keys from most to least recently used
    pub fn keys(&self) -> Vec<&K> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            keys.push(&self.nodes[idx].key);
            cursor = self.nodes[idx].next;
        }
        keys
    }

    fn touch(&mut self, idx: usize) {
        if self.head != Some(idx) {
            self.detach(idx);
            self.attach_front(idx);
        }
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);

        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }

        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }

    fn attach_front(&mut self, idx: usize) {
        self.nodes[idx].prev = None;
        self.nodes[idx].next = self.head;
        if let Some(head) = self.head {
            self.nodes[head].prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let mut lru = LruMap::new(4);
        lru.put("a", 1);
        lru.put("b", 2);
        assert_eq!(lru.get(&"a"), Some(&1));
        assert_eq!(lru.get(&"b"), Some(&2));
        assert_eq!(lru.get(&"c"), None);
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut lru = LruMap::new(2);
        lru.put("a", 1);
        lru.put("b", 2);
        assert_eq!(lru.put("c", 3), Some(("a", 1)));
        assert!(!lru.contains_key(&"a"));
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_get_refreshes_recency() {
        let mut lru = LruMap::new(2);
        lru.put("a", 1);
        lru.put("b", 2);
        lru.get(&"a");
        assert_eq!(lru.put("c", 3), Some(("b", 2)));
        assert_eq!(lru.peek(&"a"), Some(&1));
    }

    #[test]
    fn test_overwrite_refreshes_recency() {
        let mut lru = LruMap::new(2);
        lru.put("a", 1);
        lru.put("b", 2);
        assert_eq!(lru.put("a", 10), None);
        assert_eq!(lru.put("c", 3), Some(("b", 2)));
        assert_eq!(lru.peek(&"a"), Some(&10));
    }

    #[test]
    fn test_peek_does_not_refresh() {
        let mut lru = LruMap::new(2);
        lru.put("a", 1);
        lru.put("b", 2);
        lru.peek(&"a");
        assert_eq!(lru.put("c", 3), Some(("a", 1)));
    }

    #[test]
    fn test_recency_order() {
        let mut lru = LruMap::new(3);
        lru.put(1, ());
        lru.put(2, ());
        lru.put(3, ());
        lru.get(&1);
        assert_eq!(lru.keys(), vec![&1, &3, &2]);
        lru.put(4, ());
        assert_eq!(lru.keys(), vec![&4, &1, &3]);
    }

    #[test]
    fn test_capacity_one() {
        let mut lru = LruMap::new(0);
        assert_eq!(lru.capacity(), 1);
        lru.put("a", 1);
        assert_eq!(lru.put("b", 2), Some(("a", 1)));
        assert_eq!(lru.get(&"b"), Some(&2));
        assert_eq!(lru.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut lru = LruMap::new(2);
        lru.put("a", 1);
        lru.put("b", 2);
        lru.clear();
        assert!(lru.is_empty());
        assert_eq!(lru.get(&"a"), None);
        lru.put("c", 3);
        assert_eq!(lru.keys(), vec![&"c"]);
    }

    #[test]
    fn test_long_churn_stays_bounded() {
        let mut lru = LruMap::new(8);
        for i in 0..1000 {
            lru.put(i, i * 2);
            if i % 3 == 0 {
                lru.get(&(i / 2));
            }
        }
        assert_eq!(lru.len(), 8);
        assert_eq!(lru.keys().len(), 8);
        assert_eq!(lru.peek(&999), Some(&1998));
    }
}
