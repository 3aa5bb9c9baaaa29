//! 按字节预算淘汰的 LRU 缓存
//!
//! 每个条目插入时登记估算的字节数，总量超出预算时从最久未用的条目开始淘汰。
//! 访问顺序用单调递增的计数器记录，淘汰时取最小者。

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

struct Entry<V> {
    value: V,
    bytes: usize,
    tick: u64,
}

pub struct LruCache<K, V> {
    entries: HashMap<K, Entry<V>>,
    order: BTreeMap<u64, K>,
    next_tick: u64,
    max_bytes: usize,
    total_bytes: usize,
}

impl<K: Eq + Hash + Clone, V> LruCache<K, V> {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_tick: 0,
            max_bytes,
            total_bytes: 0,
        }
    }

    /// 调整预算，立即淘汰超出部分
    pub fn set_max_bytes(&mut self, bytes: usize) {
        self.max_bytes = bytes;
        self.evict_if_needed();
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn bump(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }

    /// 命中时把条目移到最近使用端
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let tick = self.bump();
        let entry = self.entries.get_mut(key)?;
        self.order.remove(&entry.tick);
        entry.tick = tick;
        self.order.insert(tick, key.clone());
        Some(&entry.value)
    }

    /// 插入或替换条目。单个条目超过整个预算时仍会保留，直到下一次插入把它挤出
    pub fn insert(&mut self, key: K, value: V, bytes: usize) {
        self.remove(&key);
        let tick = self.bump();
        self.total_bytes += bytes;
        self.order.insert(tick, key.clone());
        self.entries.insert(key.clone(), Entry { value, bytes, tick });
        self.evict_if_needed_keeping(Some(&key));
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.tick);
        self.total_bytes = self.total_bytes.saturating_sub(entry.bytes);
        Some(entry.value)
    }

    pub fn evict_if_needed(&mut self) {
        self.evict_if_needed_keeping(None);
    }

    fn evict_if_needed_keeping(&mut self, keep: Option<&K>) {
        let mut evicted = 0usize;
        while self.total_bytes > self.max_bytes {
            let Some((&tick, oldest)) = self.order.first_key_value() else {
                break;
            };
            if keep == Some(oldest) {
                break;
            }
            if let Some(key) = self.order.remove(&tick) {
                if let Some(entry) = self.entries.remove(&key) {
                    self.total_bytes = self.total_bytes.saturating_sub(entry.bytes);
                    evicted += 1;
                }
            }
        }
        if evicted > 0 {
            tracing::trace!(evicted, total_bytes = self.total_bytes, "lru cache evicted entries");
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.total_bytes = 0;
    }
}

/// 渲染器各缓存的字节预算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheBudget {
    pub paths: usize,
    pub paints: usize,
    pub images: usize,
}

impl Default for CacheBudget {
    fn default() -> Self {
        Self {
            paths: 32 * 1024 * 1024,
            paints: 1024 * 1024,
            images: 128 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_least_recently_used() {
        let mut cache = LruCache::new(30);
        cache.insert("a", 1, 10);
        cache.insert("b", 2, 10);
        cache.insert("c", 3, 10);
        assert_eq!(cache.total_bytes(), 30);

        // 访问 a 后，最久未用的是 b
        assert_eq!(cache.get(&"a"), Some(&1));
        cache.insert("d", 4, 10);
        assert_eq!(cache.len(), 3);
        assert!(cache.get(&"b").is_none());
        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.total_bytes(), 30);
    }

    #[test]
    fn test_replacing_entry_updates_bytes() {
        let mut cache = LruCache::new(100);
        cache.insert(1u32, "small", 10);
        cache.insert(1u32, "large", 40);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.total_bytes(), 40);
        assert_eq!(cache.remove(&1), Some("large"));
        assert_eq!(cache.total_bytes(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_shrinking_budget_evicts() {
        let mut cache = LruCache::new(1000);
        for i in 0..10u32 {
            cache.insert(i, i, 100);
        }
        cache.set_max_bytes(250);
        assert_eq!(cache.len(), 2);
        assert!(cache.total_bytes() <= 250);
        assert!(cache.get(&9).is_some());
        assert!(cache.get(&8).is_some());
        assert!(cache.get(&0).is_none());
    }

    #[test]
    fn test_oversized_entry_is_kept_until_next_insert() {
        let mut cache = LruCache::new(10);
        cache.insert("old", 0, 5);
        cache.insert("huge", 1, 50);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"huge"), Some(&1));

        cache.insert("next", 2, 5);
        assert!(cache.get(&"huge").is_none());
        assert_eq!(cache.total_bytes(), 5);
    }
}
