// src/estimator/cache.rs
//! In-memory read-through cache in front of any estimator.
//!
//! Keys are SHA-256 digests of the input text. Capacity is bounded with FIFO eviction.
//! Failed estimates are never cached.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{Estimate, Estimator};
use crate::error::Result;

pub struct CachingEstimator<E: Estimator> {
    inner: E,
    capacity: usize,
    state: Mutex<CacheState>,
}

#[derive(Default)]
struct CacheState {
    map: HashMap<[u8; 32], Estimate>,
    order: VecDeque<[u8; 32]>,
}

impl<E: Estimator> CachingEstimator<E> {
    pub fn new(inner: E, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        // Entries are plain values; a poisoned guard still holds a consistent map.
        match self.state.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }

    fn insert(&self, key: [u8; 32], value: Estimate) {
        let mut g = self.lock();
        if g.map.insert(key, value).is_none() {
            g.order.push_back(key);
        }
        while g.order.len() > self.capacity {
            if let Some(old) = g.order.pop_front() {
                g.map.remove(&old);
            }
        }
    }
}

fn cache_key(text: &str) -> [u8; 32] {
    let digest = Sha256::digest(text.as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    key
}

#[async_trait]
impl<E: Estimator> Estimator for CachingEstimator<E> {
    async fn estimate(&self, text: &str) -> Result<Estimate> {
        let key = cache_key(text);
        let cached = self.lock().map.get(&key).copied();
        if let Some(hit) = cached {
            return Ok(hit);
        }
        let fresh = self.inner.estimate(text).await?;
        self.insert(key, fresh);
        Ok(fresh)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyticsError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Estimator for Counting {
        async fn estimate(&self, text: &str) -> Result<Estimate> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text == "boom" {
                return Err(AnalyticsError::EstimationFailed("boom".into()));
            }
            Ok(Estimate::new(text.len() as f64 / 100.0, 0.5))
        }
        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn counting() -> Counting {
        Counting {
            calls: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let c = CachingEstimator::new(counting(), 8);
        let a = c.estimate("hello").await.unwrap();
        let b = c.estimate("hello").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(c.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(c.name(), "counting");
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let c = CachingEstimator::new(counting(), 8);
        assert!(c.estimate("boom").await.is_err());
        assert!(c.estimate("boom").await.is_err());
        assert_eq!(c.inner.calls.load(Ordering::SeqCst), 2);
        assert!(c.is_empty());
    }

    #[tokio::test]
    async fn evicts_oldest_beyond_capacity() {
        let c = CachingEstimator::new(counting(), 2);
        for t in ["a", "bb", "ccc"] {
            c.estimate(t).await.unwrap();
        }
        assert_eq!(c.len(), 2);
        // "a" was evicted, so this is a miss.
        c.estimate("a").await.unwrap();
        assert_eq!(c.inner.calls.load(Ordering::SeqCst), 4);
    }
}
