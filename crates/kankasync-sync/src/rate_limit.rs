//! Per-account request scheduling
//!
//! Each account owns a reservoir of tokens that is reset to its tier's
//! capacity on a fixed interval, and runs at most one task at a time. A
//! scheduled task waits for the in-flight slot first (FIFO, via a fair
//! semaphore) and then for a token, so tasks submitted to one account start in submission
//! order. Accounts never share a reservoir.
//!
//! ## Architecture
//!
//! - [`Reservoir`]: token count plus the instant of the next reset
//! - [`AccountLimiter`]: one account's reservoir and in-flight slot
//! - [`RateLimiterRegistry`]: lazily creates a limiter per account, sized
//!   by the account's tier

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::debug;

use kankasync_core::config::RateLimitingConfig;
use kankasync_core::domain::{Account, AccountId, AccountTier};

/// Tasks one account may have in flight
pub const MAX_IN_FLIGHT: usize = 1;

// ============================================================================
// Policy
// ============================================================================

/// Capacities and timing shared by every account limiter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub standard_capacity: u32,
    pub boosted_capacity: u32,
    pub refill_interval: Duration,
}

impl RateLimitPolicy {
    pub fn from_config(config: &RateLimitingConfig) -> Self {
        Self {
            standard_capacity: config.standard_requests_per_minute,
            boosted_capacity: config.boosted_requests_per_minute,
            refill_interval: Duration::from_secs(config.refill_interval_secs),
        }
    }

    /// Reservoir capacity for an account tier
    pub fn capacity(&self, tier: AccountTier) -> u32 {
        match tier {
            AccountTier::Standard => self.standard_capacity,
            AccountTier::Boosted => self.boosted_capacity,
        }
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::from_config(&RateLimitingConfig::default())
    }
}

// ============================================================================
// Reservoir
// ============================================================================

#[derive(Debug)]
struct Reservoir {
    tokens: u32,
    next_refill: Instant,
}

impl Reservoir {
    /// Resets the token count if one or more refill instants have passed
    fn refill(&mut self, now: Instant, capacity: u32, interval: Duration) {
        if now < self.next_refill {
            return;
        }
        self.tokens = capacity;
        while self.next_refill <= now {
            self.next_refill += interval;
        }
    }
}

// ============================================================================
// AccountLimiter
// ============================================================================

/// Scheduler for one account's tasks
#[derive(Debug)]
pub struct AccountLimiter {
    capacity: u32,
    interval: Duration,
    reservoir: Mutex<Reservoir>,
    slots: Semaphore,
}

impl AccountLimiter {
    /// Creates a limiter with a full reservoir
    ///
    /// The first reset happens one `interval` after creation.
    pub fn new(capacity: u32, interval: Duration) -> Self {
        // A zero interval would never advance the refill instant.
        let interval = interval.max(Duration::from_millis(1));
        Self {
            capacity,
            interval,
            reservoir: Mutex::new(Reservoir {
                tokens: capacity,
                next_refill: Instant::now() + interval,
            }),
            slots: Semaphore::new(MAX_IN_FLIGHT),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Tokens left in the current interval
    pub fn available(&self) -> u32 {
        let mut reservoir = self.reservoir.lock().unwrap();
        reservoir.refill(Instant::now(), self.capacity, self.interval);
        reservoir.tokens
    }

    /// Takes a token, or returns how long until the next reset
    fn try_take(&self) -> Result<(), Duration> {
        let now = Instant::now();
        let mut reservoir = self.reservoir.lock().unwrap();
        reservoir.refill(now, self.capacity, self.interval);

        if reservoir.tokens > 0 {
            reservoir.tokens -= 1;
            Ok(())
        } else {
            Err(reservoir.next_refill.saturating_duration_since(now))
        }
    }

    /// Runs `task` once the in-flight slot and a token are available
    ///
    /// The task's output is returned unchanged.
    pub async fn schedule<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        let _slot = self
            .slots
            .acquire()
            .await
            .expect("limiter semaphore is never closed");

        loop {
            match self.try_take() {
                Ok(()) => break,
                Err(wait) => {
                    debug!(wait_ms = wait.as_millis() as u64, "Reservoir empty, waiting for refill");
                    tokio::time::sleep(wait).await;
                }
            }
        }

        task.await
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Hands out one [`AccountLimiter`] per account
#[derive(Debug, Default)]
pub struct RateLimiterRegistry {
    policy: RateLimitPolicy,
    limiters: DashMap<AccountId, Arc<AccountLimiter>>,
}

impl RateLimiterRegistry {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            limiters: DashMap::new(),
        }
    }

    pub fn from_config(config: &RateLimitingConfig) -> Self {
        Self::new(RateLimitPolicy::from_config(config))
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Returns the account's limiter, creating it on first use
    ///
    /// The tier is read when the limiter is created.
    pub fn limiter(&self, account: &Account) -> Arc<AccountLimiter> {
        self.limiters
            .entry(account.id())
            .or_insert_with(|| {
                let capacity = self.policy.capacity(account.tier());
                debug!(account = %account.id(), capacity, "Creating account rate limiter");
                Arc::new(AccountLimiter::new(capacity, self.policy.refill_interval))
            })
            .clone()
    }

    /// Runs `task` under the account's limiter
    pub async fn schedule<F, T>(&self, account: &Account, task: F) -> T
    where
        F: Future<Output = T>,
    {
        let limiter = self.limiter(account);
        limiter.schedule(task).await
    }
}
