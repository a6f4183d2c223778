//! TTL-keyed response cache.
//!
//! A whole-map mutex keeps lookups, writes and sweeps linearizable; a
//! sweep never removes an entry a concurrent lookup is reading as fresh.
//! TTL is the sole eviction policy. Identical in-flight queries are not
//! coalesced; the cache only dedupes work after the first write.

use std::collections::HashMap;
use std::hash::Hasher;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use askgrc_core::types::{GeneratedAnswer, TaskType};
use twox_hash::XxHash64;

pub type CacheKey = u64;

struct CacheEntry {
    answer: GeneratedAnswer,
    inserted_at: Instant,
}

pub struct ResponseCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

/// Deterministic key over the normalized question, tenant and task type.
pub fn cache_key(cleaned_question: &str, tenant_id: &str, task: TaskType) -> CacheKey {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(cleaned_question.as_bytes());
    hasher.write(b"\x1f");
    hasher.write(tenant_id.as_bytes());
    hasher.write(b"\x1f");
    hasher.write(task.as_str().as_bytes());
    hasher.finish()
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: Mutex::new(HashMap::new()), ttl }
    }

    /// A clone of the cached answer when the entry is younger than the TTL.
    pub fn get(&self, key: CacheKey) -> Option<GeneratedAnswer> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(&key)?;
        if entry.inserted_at.elapsed() < self.ttl {
            Some(entry.answer.clone())
        } else {
            None
        }
    }

    pub fn set(&self, key: CacheKey, answer: GeneratedAnswer) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, CacheEntry { answer, inserted_at: Instant::now() });
    }

    /// Remove every entry older than the TTL; returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, e| e.inserted_at.elapsed() < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `sweep` on a fixed period on the tokio runtime.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await; // interval fires immediately; skip tick zero
            loop {
                ticker.tick().await;
                let removed = cache.sweep();
                if removed > 0 {
                    tracing::debug!(removed, remaining = cache.len(), "swept expired cache entries");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askgrc_core::types::AnswerMeta;

    fn answer(text: &str) -> GeneratedAnswer {
        GeneratedAnswer {
            text: text.to_string(),
            confidence: 0.8,
            sources: Vec::new(),
            meta: AnswerMeta { provider: "test".to_string(), ..Default::default() },
        }
    }

    #[test]
    fn key_is_deterministic_and_tenant_scoped() {
        let k1 = cache_key("what is mfa", "tenant-a", TaskType::GrcAnalysis);
        let k2 = cache_key("what is mfa", "tenant-a", TaskType::GrcAnalysis);
        assert_eq!(k1, k2);
        assert_ne!(k1, cache_key("what is mfa", "tenant-b", TaskType::GrcAnalysis));
        assert_ne!(k1, cache_key("what is mfa", "tenant-a", TaskType::RiskAnalysis));
        assert_ne!(k1, cache_key("what is sso", "tenant-a", TaskType::GrcAnalysis));
    }

    #[test]
    fn fresh_entry_round_trips() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let key = cache_key("q", "t", TaskType::GrcAnalysis);
        assert!(cache.get(key).is_none());
        cache.set(key, answer("hello"));
        let hit = cache.get(key).expect("fresh hit");
        assert_eq!(hit.text, "hello");
    }

    #[test]
    fn expired_entry_misses_and_sweeps() {
        let cache = ResponseCache::new(Duration::from_millis(5));
        let key = cache_key("q", "t", TaskType::GrcAnalysis);
        cache.set(key, answer("stale"));
        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.get(key).is_none(), "expired entries never hit");
        assert_eq!(cache.len(), 1, "lookup does not evict");
        assert_eq!(cache.sweep(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn sweep_keeps_fresh_entries() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.set(cache_key("a", "t", TaskType::GrcAnalysis), answer("a"));
        cache.set(cache_key("b", "t", TaskType::GrcAnalysis), answer("b"));
        assert_eq!(cache.sweep(), 0);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn set_overwrites_same_key() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let key = cache_key("q", "t", TaskType::GrcAnalysis);
        cache.set(key, answer("first"));
        cache.set(key, answer("second"));
        assert_eq!(cache.get(key).expect("hit").text, "second");
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn sweeper_task_purges_in_background() {
        let cache = Arc::new(ResponseCache::new(Duration::from_millis(5)));
        cache.set(cache_key("q", "t", TaskType::GrcAnalysis), answer("x"));
        let handle = cache.spawn_sweeper(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(cache.is_empty());
        handle.abort();
    }
}
