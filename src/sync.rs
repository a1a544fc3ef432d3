//! Thread-safe wrapper for stateful keys (requires `std`).
//!
//! `SharedKey` guards a whole private key with one mutex, so that
//! reading the index, deciding (range test, level replacement) and
//! advancing the index happen in one critical section. The signature
//! is computed while the lock is held.

use std::sync::{Mutex, MutexGuard};

use crate::traits::StatefulSigner;
use crate::{Error, Result};

/// A stateful private key that can be shared between threads (wrap it
/// in an `Arc`).
#[derive(Debug)]
pub struct SharedKey<K> {
    inner: Mutex<K>,
}

impl<K: StatefulSigner> SharedKey<K> {

    pub fn new(key: K) -> Self {
        Self { inner: Mutex::new(key) }
    }

    fn lock(&self) -> Result<MutexGuard<'_, K>> {
        // A panic while the key was locked may have left it half-updated.
        self.inner.lock().map_err(|_| Error::InvalidState("shared key lock poisoned"))
    }

    /// Sign `message`; concurrent callers always get distinct indices.
    pub fn sign(&self, message: &[u8]) -> Result<K::Signature> {
        self.lock()?.try_sign(message)
    }

    /// Split off the next `usage_count` indices as an independent key.
    pub fn extract_key_shard(&self, usage_count: u64) -> Result<K> {
        self.lock()?.extract_key_shard(usage_count)
    }

    pub fn usages_remaining(&self) -> Result<u64> {
        Ok(self.lock()?.usages_remaining())
    }

    /// Run `f` with exclusive access to the key (e.g. to encode and
    /// persist its state).
    pub fn with_key<R, F: FnOnce(&mut K) -> R>(&self, f: F) -> Result<R> {
        let mut guard = self.lock()?;
        Ok(f(&mut *guard))
    }

    pub fn into_inner(self) -> Result<K> {
        self.inner.into_inner().map_err(|_| Error::InvalidState("shared key lock poisoned"))
    }
}
