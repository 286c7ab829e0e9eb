//! In-memory fixture directory for exercising the engine without a network.
//!
//! The fixture holds a sorted set of string keys, serves them through the
//! same paginated contract a real backend would (range filter, page-size
//! hint, opaque offset cursor), and supports per-call latency injection,
//! per-partition failure injection, and request counting.

use async_trait::async_trait;
use core::time::Duration;
use scour::{Cursor, Directory, DirectoryError, Page, PageRequest};
use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

/// How a partition's requests should fail.
#[derive(Clone, Copy, Debug)]
pub enum FailureMode {
    /// Every request fails permanently.
    Permanent,
    /// Every request fails transiently (exhausts any retry budget).
    Transient,
    /// The first `n` requests fail transiently, then requests succeed.
    TransientTimes(u32),
}

#[derive(Default)]
pub struct FixtureDirectory {
    keys: Vec<String>,
    latency: Option<Duration>,
    failures: HashMap<usize, FailureMode>,
    transient_left: Mutex<HashMap<usize, u32>>,
    started: AtomicUsize,
    completed: AtomicUsize,
    per_partition: Mutex<HashMap<usize, usize>>,
}

impl FixtureDirectory {
    pub fn new(keys: impl IntoIterator<Item = String>) -> Self {
        let mut keys: Vec<String> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();
        Self {
            keys,
            ..Self::default()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_failure(mut self, partition: usize, mode: FailureMode) -> Self {
        if let FailureMode::TransientTimes(n) = mode {
            self.transient_left.lock().unwrap().insert(partition, n);
        }
        self.failures.insert(partition, mode);
        self
    }

    /// Total requests issued so far.
    pub fn calls_started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Total requests fully served so far.
    pub fn calls_completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Requests issued against one partition.
    pub fn calls_for(&self, partition: usize) -> usize {
        self.per_partition
            .lock()
            .unwrap()
            .get(&partition)
            .copied()
            .unwrap_or(0)
    }

    /// Keys falling inside the half-open range of `req`.
    fn keys_in_range(&self, req: &PageRequest) -> Vec<String> {
        self.keys
            .iter()
            .filter(|k| req.range.contains(k))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Directory for FixtureDirectory {
    type Entry = String;

    async fn fetch_page(&self, req: &PageRequest) -> Result<Page<String>, DirectoryError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        *self
            .per_partition
            .lock()
            .unwrap()
            .entry(req.partition)
            .or_insert(0) += 1;

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.failures.get(&req.partition) {
            Some(FailureMode::Permanent) => {
                return Err(DirectoryError::permanent("fixture: partition rejected"));
            }
            Some(FailureMode::Transient) => {
                return Err(DirectoryError::transient("fixture: partition throttled"));
            }
            Some(FailureMode::TransientTimes(_)) => {
                let mut left = self.transient_left.lock().unwrap();
                let remaining = left.entry(req.partition).or_insert(0);
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(DirectoryError::transient("fixture: partition throttled"));
                }
            }
            None => {}
        }

        let in_range = self.keys_in_range(req);
        let offset = match &req.cursor {
            Some(cursor) => cursor
                .as_str()
                .parse::<usize>()
                .map_err(|_| DirectoryError::permanent("fixture: malformed cursor"))?,
            None => 0,
        };

        let entries: Vec<String> = in_range
            .iter()
            .skip(offset)
            .take(req.page_size)
            .cloned()
            .collect();
        let next = offset + entries.len();

        self.completed.fetch_add(1, Ordering::SeqCst);
        if next < in_range.len() {
            Ok(Page::with_cursor(entries, Cursor::new(next.to_string())))
        } else {
            Ok(Page::last(entries))
        }
    }
}

/// `count` keys spread across the whole alphabet: a0, b1, c2, …
pub fn spread_keys(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let letter = (b'a' + (i % 26) as u8) as char;
            format!("{letter}{i:06}")
        })
        .collect()
}

/// Partition index of a key's leading letter under the default alphabet.
pub fn partition_of(key: &str) -> usize {
    let first = key.as_bytes()[0];
    assert!(first.is_ascii_lowercase());
    (first - b'a') as usize
}
