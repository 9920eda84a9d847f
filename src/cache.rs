//! Per-session generation cache.
//!
//! The browser client kept the last generation result in per-tab storage so
//! a reload did not cost another model call. This is the same idea made
//! explicit: one slot per session token, overwritten by the next generation
//! for that token, and dropped once it is older than the configured TTL.
//!
//! # Design
//!
//! - **Single slot**: a token maps to at most one entry. [`SessionCache::put`]
//!   replaces whatever was there.
//! - **TTL eviction**: expiry is checked lazily. Every `get` and `put` first
//!   sweeps entries older than the TTL, so there is no background task.
//! - **Testable time**: the `*_at` variants take an explicit [`Instant`];
//!   the plain methods call them with `Instant::now()`.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use crate::types::{GenerationRequest, GenerationResponse};

/// Cached inputs and output of one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedGeneration {
    pub request: GenerationRequest,
    pub response: GenerationResponse,
}

#[derive(Debug)]
struct Slot {
    entry: CachedGeneration,
    stored_at: Instant,
}

pub struct SessionCache {
    ttl: Duration,
    slots: HashMap<String, Slot>,
    stats: CacheStats,
}

impl SessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn put(&mut self, token: &str, entry: CachedGeneration) {
        self.put_at(token, entry, Instant::now());
    }

    pub fn put_at(&mut self, token: &str, entry: CachedGeneration, now: Instant) {
        self.evict_expired_at(now);
        self.slots.insert(
            token.to_string(),
            Slot {
                entry,
                stored_at: now,
            },
        );
    }

    pub fn get(&mut self, token: &str) -> Option<CachedGeneration> {
        self.get_at(token, Instant::now())
    }

    pub fn get_at(&mut self, token: &str, now: Instant) -> Option<CachedGeneration> {
        self.evict_expired_at(now);
        match self.slots.get(token) {
            Some(slot) => {
                self.stats.hit();
                Some(slot.entry.clone())
            }
            None => {
                self.stats.miss();
                None
            }
        }
    }

    pub fn remove(&mut self, token: &str) -> Option<CachedGeneration> {
        self.slots.remove(token).map(|slot| slot.entry)
    }

    /// Drop every entry whose age is at least the TTL.
    pub fn evict_expired_at(&mut self, now: Instant) {
        let ttl = self.ttl;
        let before = self.slots.len();
        self.slots
            .retain(|_, slot| now.saturating_duration_since(slot.stored_at) < ttl);
        self.stats.evictions += (before - self.slots.len()) as u32;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

/// Summary of cache lookups, printed by the CLI.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
    pub evictions: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.evictions > 0 {
            write!(
                f,
                "{} hits, {} misses, {} expired ({} lookups)",
                self.hits,
                self.misses,
                self.evictions,
                self.total()
            )
        } else {
            write!(f, "{} hits, {} misses ({} lookups)", self.hits, self.misses, self.total())
        }
    }
}
