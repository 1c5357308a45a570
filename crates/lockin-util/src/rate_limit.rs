//! Per-client request throttling for the command channel

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::ClientId;

/// Token bucket limiter with one bucket per IPC client
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,
    window: Duration,
    buckets: HashMap<ClientId, Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    window_start: Instant,
}

impl RateLimiter {
    /// Allow `capacity` requests per `window` for each client
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self {
            capacity,
            window,
            buckets: HashMap::new(),
        }
    }

    /// Returns `true` if the client may issue another request now
    pub fn check(&mut self, client_id: &ClientId) -> bool {
        self.check_at(client_id, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock reading
    pub fn check_at(&mut self, client_id: &ClientId, now: Instant) -> bool {
        let capacity = self.capacity;
        let bucket = self
            .buckets
            .entry(client_id.clone())
            .or_insert(Bucket {
                tokens: capacity,
                window_start: now,
            });

        // A full window elapsed: start over with a full bucket
        if now.saturating_duration_since(bucket.window_start) >= self.window {
            bucket.tokens = capacity;
            bucket.window_start = now;
        }

        match bucket.tokens.checked_sub(1) {
            Some(left) => {
                bucket.tokens = left;
                true
            }
            None => false,
        }
    }

    /// Forget a disconnected client
    pub fn remove_client(&mut self, client_id: &ClientId) {
        self.buckets.remove(client_id);
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }
}
