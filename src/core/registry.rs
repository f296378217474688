//! Per-target run exclusion.
//!
//! At most one rollback run may be in flight per (site name, site path)
//! target. Acquisition hands out a guard whose drop releases the slot, so
//! release happens on every exit path without per-branch bookkeeping.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Registry of in-flight rollback targets.
#[derive(Clone, Default)]
pub struct RunRegistry {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a target for a run.
    ///
    /// Fails immediately with `AlreadyRunning` when the target is taken;
    /// requests are never queued.
    pub fn acquire(&self, target_key: &str) -> crate::Result<RunGuard> {
        let mut active = lock(&self.inner);

        if !active.insert(target_key.to_string()) {
            return Err(crate::Error::AlreadyRunning(target_key.to_string()));
        }

        tracing::debug!(target_key, "run slot acquired");

        Ok(RunGuard {
            target_key: target_key.to_string(),
            inner: Arc::clone(&self.inner),
        })
    }

    /// Whether a run is currently registered for the target.
    pub fn is_active(&self, target_key: &str) -> bool {
        lock(&self.inner).contains(target_key)
    }
}

// A poisoned lock still holds a usable set; recover it so release can never
// be skipped because some other run panicked.
fn lock(inner: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Scoped claim on a rollback target. Dropping it releases the slot.
pub struct RunGuard {
    target_key: String,
    inner: Arc<Mutex<HashSet<String>>>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        lock(&self.inner).remove(&self.target_key);
        tracing::debug!(target_key = %self.target_key, "run slot released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_rejected() {
        let registry = RunRegistry::new();
        let _guard = registry.acquire("shop|/srv/www/shop").unwrap();

        let second = registry.acquire("shop|/srv/www/shop");
        assert!(matches!(second, Err(crate::Error::AlreadyRunning(_))));
    }

    #[test]
    fn test_released_on_drop() {
        let registry = RunRegistry::new();
        {
            let _guard = registry.acquire("shop|/srv/www/shop").unwrap();
            assert!(registry.is_active("shop|/srv/www/shop"));
        }
        assert!(!registry.is_active("shop|/srv/www/shop"));
        assert!(registry.acquire("shop|/srv/www/shop").is_ok());
    }

    #[test]
    fn test_distinct_targets_do_not_conflict() {
        let registry = RunRegistry::new();
        let _a = registry.acquire("shop|/srv/www/shop").unwrap();
        let _b = registry.acquire("blog|/srv/www/blog").unwrap();
        assert!(registry.is_active("shop|/srv/www/shop"));
        assert!(registry.is_active("blog|/srv/www/blog"));
    }

    #[test]
    fn test_released_even_after_panic_while_held() {
        let registry = RunRegistry::new();
        let cloned = registry.clone();

        let result = std::thread::spawn(move || {
            let _guard = cloned.acquire("shop|/srv/www/shop").unwrap();
            panic!("run blew up");
        })
        .join();

        assert!(result.is_err());
        assert!(!registry.is_active("shop|/srv/www/shop"));
    }
}
