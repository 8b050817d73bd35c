use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::SecurityConfig;

/// Lockout policy for repeated failed logins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlePolicy {
    pub max_failed_attempts: u32,
    pub lockout_window: Duration,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lockout_window: Duration::minutes(15),
        }
    }
}

impl From<&SecurityConfig> for ThrottlePolicy {
    fn from(security: &SecurityConfig) -> Self {
        Self {
            max_failed_attempts: security.max_failed_logins,
            lockout_window: Duration::minutes(security.lockout_minutes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LoginAttempt {
    attempts: u32,
    last_attempt: DateTime<Utc>,
}

/// Verdict of [`LoginThrottle::begin_attempt`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStart {
    /// The attempt is counted; the value is the running total including it
    Allowed(u32),
    Locked,
}

/// Process-local failed-login counter keyed by username.
///
/// An attempt is counted as a failure when it starts, under the same lock
/// acquisition as the lockout check, and forgiven on success. Concurrent
/// guesses for one username therefore see each other and cannot exceed the
/// limit. Entries whose window has elapsed are swept on every new attempt.
#[derive(Debug, Clone, Default)]
pub struct LoginThrottle {
    policy: ThrottlePolicy,
    attempts: Arc<Mutex<HashMap<String, LoginAttempt>>>,
}

impl LoginThrottle {
    pub fn new(policy: ThrottlePolicy) -> Self {
        Self {
            policy,
            attempts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn policy(&self) -> ThrottlePolicy {
        self.policy
    }

    pub async fn begin_attempt(&self, username: &str) -> AttemptStart {
        self.begin_attempt_at(username, Utc::now()).await
    }

    /// Refuse the attempt when the username is locked, otherwise count it.
    pub async fn begin_attempt_at(&self, username: &str, now: DateTime<Utc>) -> AttemptStart {
        let window = self.policy.lockout_window;
        let mut attempts = self.attempts.lock().await;
        attempts.retain(|_, entry| now - entry.last_attempt < window);

        let entry = attempts.entry(username.to_string()).or_insert(LoginAttempt {
            attempts: 0,
            last_attempt: now,
        });
        if entry.attempts >= self.policy.max_failed_attempts {
            return AttemptStart::Locked;
        }

        entry.attempts += 1;
        entry.last_attempt = now;
        AttemptStart::Allowed(entry.attempts)
    }

    /// Uncount an attempt that ended without a verdict on the password
    pub async fn abandon_attempt(&self, username: &str) {
        let mut attempts = self.attempts.lock().await;
        if let Some(entry) = attempts.get_mut(username) {
            entry.attempts = entry.attempts.saturating_sub(1);
            if entry.attempts == 0 {
                attempts.remove(username);
            }
        }
    }

    /// True while the username has reached the failure limit and its last
    /// failure is inside the lockout window.
    pub async fn is_locked_at(&self, username: &str, now: DateTime<Utc>) -> bool {
        let attempts = self.attempts.lock().await;
        attempts.get(username).is_some_and(|entry| {
            now - entry.last_attempt < self.policy.lockout_window
                && entry.attempts >= self.policy.max_failed_attempts
        })
    }

    pub async fn reset(&self, username: &str) {
        self.attempts.lock().await.remove(username);
    }

    pub async fn failed_attempts(&self, username: &str) -> u32 {
        self.attempts
            .lock()
            .await
            .get(username)
            .map_or(0, |entry| entry.attempts)
    }

    /// Number of usernames currently tracked
    pub async fn tracked_usernames(&self) -> usize {
        self.attempts.lock().await.len()
    }
}
