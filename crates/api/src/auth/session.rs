//! In-process session bookkeeping for the access-code login.
//!
//! The kernel serves a single owner, so there is one access code, one login
//! throttle and one revocation list. Reads happen inside synchronous guards,
//! hence `std::sync` locks rather than async ones.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use chrono::Utc;
use notekernel_core::types::Timestamp;

use super::password::{hash_auth_code, verify_auth_code};

/// Maximum consecutive failed logins before the login endpoint locks.
pub const MAX_FAILED_ATTEMPTS: u32 = 5;

/// Duration in minutes to lock logins after exceeding failed attempts.
pub const LOCK_DURATION_MINS: i64 = 15;

#[derive(Debug, Default)]
struct LoginThrottle {
    failed: u32,
    locked_until: Option<Timestamp>,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    /// Argon2id hash of the access code; `None` disables authentication.
    auth_code_hash: RwLock<Option<String>>,
    /// Bumped on every code change. Tokens carry the value they were issued under.
    generation: AtomicU64,
    /// Revoked token ids mapped to their expiry (Unix seconds).
    revoked: RwLock<HashMap<String, i64>>,
    throttle: Mutex<LoginThrottle>,
}

impl SessionStore {
    pub fn new(auth_code: Option<&str>) -> Result<Self, argon2::password_hash::Error> {
        let store = Self::default();
        store.set_auth_code(auth_code)?;
        Ok(store)
    }

    /// Whether callers must present a token at all.
    pub fn auth_enabled(&self) -> bool {
        self.auth_code_hash
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The access-code generation new tokens must be issued under.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Replace the access code and invalidate every token issued so far.
    ///
    /// An empty or missing code turns authentication off.
    pub fn set_auth_code(&self, code: Option<&str>) -> Result<(), argon2::password_hash::Error> {
        let hash = match code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => Some(hash_auth_code(code)?),
            None => None,
        };
        let mut current = self
            .auth_code_hash
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *current = hash;
        self.generation.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Check a candidate code. Always `false` when authentication is off.
    pub fn verify_code(&self, code: &str) -> Result<bool, argon2::password_hash::Error> {
        let hash = self
            .auth_code_hash
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match hash {
            Some(hash) => verify_auth_code(code, &hash),
            None => Ok(false),
        }
    }

    /// Revoke a token until it would have expired anyway.
    ///
    /// Entries whose expiry has passed are dropped on the way.
    pub fn revoke(&self, jti: &str, expires_at: i64) {
        let now = Utc::now().timestamp();
        let mut revoked = self.revoked.write().unwrap_or_else(PoisonError::into_inner);
        revoked.retain(|_, exp| *exp > now);
        if expires_at > now {
            revoked.insert(jti.to_string(), expires_at);
        }
    }

    /// Number of revocations still being tracked.
    pub fn revoked_count(&self) -> usize {
        self.revoked
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// A token is live if it was not revoked and was issued under the current code.
    pub fn is_token_live(&self, jti: &str, generation: u64) -> bool {
        if generation != self.generation() {
            return false;
        }
        !self
            .revoked
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(jti)
    }

    /// Returns the lock expiry if logins are currently locked.
    pub fn locked_until(&self, now: Timestamp) -> Option<Timestamp> {
        let throttle = self.throttle.lock().unwrap_or_else(PoisonError::into_inner);
        throttle.locked_until.filter(|until| *until > now)
    }

    /// Count a failed login; locks once [`MAX_FAILED_ATTEMPTS`] is reached.
    ///
    /// Returns the consecutive failure count including this attempt. The
    /// counter starts over once the lock is set.
    pub fn record_failure(&self, now: Timestamp) -> u32 {
        let mut throttle = self.throttle.lock().unwrap_or_else(PoisonError::into_inner);
        throttle.failed += 1;
        let failed = throttle.failed;
        if failed >= MAX_FAILED_ATTEMPTS {
            throttle.locked_until = Some(now + chrono::Duration::minutes(LOCK_DURATION_MINS));
            throttle.failed = 0;
        }
        failed
    }

    pub fn record_success(&self) {
        let mut throttle = self.throttle.lock().unwrap_or_else(PoisonError::into_inner);
        *throttle = LoginThrottle::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_code_disables_auth() {
        let store = SessionStore::new(None).unwrap();
        assert!(!store.auth_enabled());
        assert!(!store.verify_code("").unwrap());

        let blank = SessionStore::new(Some("   ")).unwrap();
        assert!(!blank.auth_enabled());
    }

    #[test]
    fn test_code_verification() {
        let store = SessionStore::new(Some("1234")).unwrap();
        assert!(store.auth_enabled());
        assert!(store.verify_code("1234").unwrap());
        assert!(!store.verify_code("4321").unwrap());
    }

    #[test]
    fn test_revoked_token_is_dead() {
        let store = SessionStore::new(Some("1234")).unwrap();
        let generation = store.generation();
        let exp = Utc::now().timestamp() + 600;
        assert!(store.is_token_live("abc", generation));
        store.revoke("abc", exp);
        assert!(!store.is_token_live("abc", generation));
        assert!(store.is_token_live("def", generation));
    }

    #[test]
    fn test_expired_revocations_are_pruned() {
        let store = SessionStore::new(Some("1234")).unwrap();
        let now = Utc::now().timestamp();

        // Already expired: nothing to remember.
        store.revoke("old", now - 1);
        assert_eq!(store.revoked_count(), 0);

        store.revoke("live", now + 600);
        assert_eq!(store.revoked_count(), 1);

        // Insert an entry as if it had expired since it was revoked.
        store
            .revoked
            .write()
            .unwrap()
            .insert("stale".to_string(), now - 5);
        store.revoke("fresh", now + 600);
        assert_eq!(store.revoked_count(), 2);
        assert!(!store.is_token_live("live", store.generation()));
        assert!(!store.is_token_live("fresh", store.generation()));
    }

    #[test]
    fn test_code_change_invalidates_earlier_tokens_immediately() {
        let store = SessionStore::new(Some("1234")).unwrap();
        let issued_under = store.generation();
        store.set_auth_code(Some("5678")).unwrap();
        assert!(!store.is_token_live("abc", issued_under));
        assert!(store.is_token_live("abc", store.generation()));
    }

    #[test]
    fn test_lockout_after_max_failures() {
        let store = SessionStore::new(Some("1234")).unwrap();
        let now = Utc::now();
        for attempt in 1..MAX_FAILED_ATTEMPTS {
            assert_eq!(store.record_failure(now), attempt);
            assert!(store.locked_until(now).is_none());
        }
        assert_eq!(store.record_failure(now), MAX_FAILED_ATTEMPTS);
        let until = store.locked_until(now).expect("should be locked");
        assert_eq!(until, now + chrono::Duration::minutes(LOCK_DURATION_MINS));

        // Lock expires on its own.
        let later = until + chrono::Duration::seconds(1);
        assert!(store.locked_until(later).is_none());
    }

    #[test]
    fn test_success_resets_failures() {
        let store = SessionStore::new(Some("1234")).unwrap();
        let now = Utc::now();
        for _ in 0..MAX_FAILED_ATTEMPTS - 1 {
            store.record_failure(now);
        }
        store.record_success();
        assert_eq!(store.record_failure(now), 1);
        assert!(store.locked_until(now).is_none());
    }
}
