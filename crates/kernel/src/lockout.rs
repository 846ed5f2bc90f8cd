//! Account lockout tracking.
//!
//! Tracks failed login attempts per username in memory and temporarily locks
//! accounts after too many failures. Expired entries are swept out every
//! few hundred writes so the map only holds live windows and locks.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Maximum failed attempts before lockout.
const MAX_FAILED_ATTEMPTS: u32 = 5;

/// Lockout duration (15 minutes).
const LOCKOUT_DURATION: Duration = Duration::from_secs(15 * 60);

/// Failed attempt tracking window (15 minutes).
const ATTEMPT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Failed attempts recorded between sweeps of expired entries.
const PRUNE_INTERVAL: u64 = 256;

#[derive(Debug, Clone, Copy)]
struct Attempts {
    count: u32,
    window_start: Instant,
    locked_until: Option<Instant>,
}

impl Attempts {
    fn is_expired(&self, now: Instant) -> bool {
        match self.locked_until {
            Some(until) => until <= now,
            None => now.duration_since(self.window_start) > ATTEMPT_WINDOW,
        }
    }
}

/// Account lockout service.
#[derive(Clone, Default)]
pub struct LockoutService {
    entries: Arc<DashMap<String, Attempts>>,
    writes: Arc<AtomicU64>,
}

impl LockoutService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if an account is currently locked.
    pub fn is_locked(&self, username: &str) -> bool {
        self.is_locked_at(username, Instant::now())
    }

    fn is_locked_at(&self, username: &str, now: Instant) -> bool {
        self.entries
            .get(&key(username))
            .and_then(|entry| entry.locked_until)
            .is_some_and(|until| until > now)
    }

    /// Record a failed login attempt.
    ///
    /// Returns (is_now_locked, attempts_remaining).
    pub fn record_failed_attempt(&self, username: &str) -> (bool, u32) {
        self.record_failed_attempt_at(username, Instant::now())
    }

    fn record_failed_attempt_at(&self, username: &str, now: Instant) -> (bool, u32) {
        // Sweep before taking the entry guard; retain locks every shard.
        if (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % PRUNE_INTERVAL == 0 {
            self.prune_expired_at(now);
        }

        let mut entry = self.entries.entry(key(username)).or_insert(Attempts {
            count: 0,
            window_start: now,
            locked_until: None,
        });

        if entry.is_expired(now) {
            *entry = Attempts {
                count: 0,
                window_start: now,
                locked_until: None,
            };
        }

        entry.count += 1;
        if entry.count >= MAX_FAILED_ATTEMPTS {
            entry.locked_until = Some(now + LOCKOUT_DURATION);
            tracing::warn!(username = %username, "account locked due to failed attempts");
            return (true, 0);
        }

        (false, MAX_FAILED_ATTEMPTS - entry.count)
    }

    /// Clear failed attempts after a successful login.
    pub fn clear_attempts(&self, username: &str) {
        self.entries.remove(&key(username));
    }

    /// Drop entries whose window and lock have both run out.
    fn prune_expired_at(&self, now: Instant) {
        let before = self.entries.len();
        self.entries.retain(|_, attempts| !attempts.is_expired(now));
        let pruned = before.saturating_sub(self.entries.len());
        if pruned > 0 {
            tracing::debug!(pruned, "pruned expired lockout entries");
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.entries.len()
    }
}

fn key(username: &str) -> String {
    username.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locks_after_max_attempts() {
        let lockout = LockoutService::new();
        for expected_remaining in (1..MAX_FAILED_ATTEMPTS).rev() {
            assert_eq!(lockout.record_failed_attempt("Alice"), (false, expected_remaining));
        }
        assert_eq!(lockout.record_failed_attempt("alice"), (true, 0));
        assert!(lockout.is_locked("ALICE"));
        assert!(!lockout.is_locked("bob"));
    }

    #[test]
    fn lock_expires() {
        let lockout = LockoutService::new();
        let start = Instant::now();
        for _ in 0..MAX_FAILED_ATTEMPTS {
            lockout.record_failed_attempt_at("alice", start);
        }
        assert!(lockout.is_locked_at("alice", start + Duration::from_secs(60)));
        assert!(!lockout.is_locked_at("alice", start + LOCKOUT_DURATION + Duration::from_secs(1)));

        // a failure after expiry starts a fresh window
        let later = start + LOCKOUT_DURATION + Duration::from_secs(2);
        assert_eq!(
            lockout.record_failed_attempt_at("alice", later),
            (false, MAX_FAILED_ATTEMPTS - 1)
        );
    }

    #[test]
    fn success_clears_attempts() {
        let lockout = LockoutService::new();
        lockout.record_failed_attempt("alice");
        lockout.record_failed_attempt("alice");
        lockout.clear_attempts("alice");
        assert_eq!(
            lockout.record_failed_attempt("alice"),
            (false, MAX_FAILED_ATTEMPTS - 1)
        );
    }

    #[test]
    fn expired_entries_are_released() {
        let lockout = LockoutService::new();
        let start = Instant::now();
        let later = start + LOCKOUT_DURATION + Duration::from_secs(1);

        for _ in 0..MAX_FAILED_ATTEMPTS {
            lockout.record_failed_attempt_at("locked", start);
        }
        let stale = PRUNE_INTERVAL - 2 - u64::from(MAX_FAILED_ATTEMPTS);
        for i in 0..stale {
            lockout.record_failed_attempt_at(&format!("user{i}"), start);
        }
        lockout.record_failed_attempt_at("recent", later - Duration::from_secs(60));
        assert_eq!(lockout.tracked() as u64, stale + 2);

        // This write completes the interval and sweeps first.
        lockout.record_failed_attempt_at("fresh", later);
        assert_eq!(lockout.tracked(), 2);
        assert!(!lockout.is_locked_at("locked", later));
        assert_eq!(
            lockout.record_failed_attempt_at("recent", later),
            (false, MAX_FAILED_ATTEMPTS - 2)
        );
    }
}
