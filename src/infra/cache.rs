//! Bounded in-memory caching for generated proofs
//!
//! Eviction is an explicit policy, not unbounded growth: a capacity bound
//! with least-recently-used eviction plus a TTL so stale proofs age out.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use alloy_primitives::B256;
use tokio::sync::RwLock;

use crate::domain::Proof;

/// Counters for cache effectiveness
#[derive(Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}

struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    last_accessed: Instant,
}

/// LRU cache with TTL expiry
pub struct LruCache<K, V> {
    max_entries: usize,
    ttl: Duration,
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    stats: CacheStats,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            max_entries,
            ttl,
            entries: RwLock::new(HashMap::new()),
            stats: CacheStats::default(),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.write().await;

        if let Some(entry) = entries.get_mut(key) {
            if entry.created_at.elapsed() > self.ttl {
                entries.remove(key);
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            entry.last_accessed = Instant::now();
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Some(entry.value.clone());
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub async fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.write().await;

        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            // evict the least recently accessed entry
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, e)| e.last_accessed)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        let now = Instant::now();
        entries.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
                last_accessed: now,
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

/// Cache key for generated proofs.
///
/// Keyed by index *and* transaction-set digest: a proof only matches a
/// batch that contains exactly the same transactions in the same order.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct ProofCacheKey {
    pub batch_index: u64,
    pub txset_digest: B256,
}

/// Bounded cache of generated proofs
pub struct ProofCache {
    proofs: LruCache<ProofCacheKey, Proof>,
}

impl ProofCache {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            proofs: LruCache::new(max_entries, ttl),
        }
    }

    pub async fn get(&self, batch_index: u64, txset_digest: B256) -> Option<Proof> {
        self.proofs
            .get(&ProofCacheKey {
                batch_index,
                txset_digest,
            })
            .await
    }

    pub async fn insert(&self, batch_index: u64, txset_digest: B256, proof: Proof) {
        self.proofs
            .insert(
                ProofCacheKey {
                    batch_index,
                    txset_digest,
                },
                proof,
            )
            .await;
    }

    pub fn stats(&self) -> &CacheStats {
        self.proofs.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProofPublicValues;
    use alloy_primitives::Bytes;

    fn proof(index: u64) -> Proof {
        Proof::new(
            index,
            Bytes::from(vec![0xaa; 8]),
            ProofPublicValues {
                old_state_root: B256::ZERO,
                new_state_root: B256::repeat_byte(0x01),
                transaction_count: 1,
                transaction_digests: vec![B256::repeat_byte(0x02)],
            },
            10,
        )
    }

    #[tokio::test]
    async fn test_lru_basic_get_insert() {
        let cache: LruCache<u64, u64> = LruCache::new(4, Duration::from_secs(60));
        cache.insert(1, 100).await;
        assert_eq!(cache.get(&1).await, Some(100));
        assert_eq!(cache.get(&2).await, None);
        assert_eq!(cache.stats().hits(), 1);
        assert_eq!(cache.stats().misses(), 1);
    }

    #[tokio::test]
    async fn test_lru_evicts_least_recently_used() {
        let cache: LruCache<u64, u64> = LruCache::new(2, Duration::from_secs(60));
        cache.insert(1, 100).await;
        cache.insert(2, 200).await;
        cache.get(&1).await;
        cache.insert(3, 300).await;

        assert_eq!(cache.get(&1).await, Some(100));
        assert_eq!(cache.get(&2).await, None);
        assert_eq!(cache.get(&3).await, Some(300));
        assert_eq!(cache.stats().evictions(), 1);
    }

    #[tokio::test]
    async fn test_lru_ttl_expiry() {
        let cache: LruCache<u64, u64> = LruCache::new(4, Duration::from_millis(20));
        cache.insert(1, 100).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.get(&1).await, None);
    }

    #[tokio::test]
    async fn test_proof_cache_key_includes_txset() {
        let cache = ProofCache::new(8, Duration::from_secs(60));
        let digest_a = B256::repeat_byte(0xaa);
        let digest_b = B256::repeat_byte(0xbb);

        cache.insert(5, digest_a, proof(5)).await;
        assert!(cache.get(5, digest_a).await.is_some());
        // same index, different transaction set: miss
        assert!(cache.get(5, digest_b).await.is_none());
    }
}
