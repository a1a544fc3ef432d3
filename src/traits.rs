//! Common interface of the stateful private keys.

use crate::hss::{HssPrivateKey, HssSignature};
use crate::lms::{LmsPrivateKey, LmsSignature};
use crate::Result;

/// A private key whose state advances with every signature.
///
/// Implemented by [`LmsPrivateKey`] and [`HssPrivateKey`]; the
/// [`SharedKey`](crate::sync::SharedKey) wrapper works with either.
pub trait StatefulSigner: Sized {
    /// Signature produced by this key.
    type Signature;

    /// Sign `message`, consuming one index. Fails with
    /// `Error::KeyExhausted` once no index is left.
    fn try_sign(&mut self, message: &[u8]) -> Result<Self::Signature>;

    /// Number of signatures this key can still produce.
    fn usages_remaining(&self) -> u64;

    /// Split off the next `usage_count` indices as an independent key.
    fn extract_key_shard(&mut self, usage_count: u64) -> Result<Self>;
}

impl StatefulSigner for LmsPrivateKey {
    type Signature = LmsSignature;

    fn try_sign(&mut self, message: &[u8]) -> Result<LmsSignature> {
        self.sign(message)
    }

    fn usages_remaining(&self) -> u64 {
        LmsPrivateKey::usages_remaining(self)
    }

    fn extract_key_shard(&mut self, usage_count: u64) -> Result<Self> {
        LmsPrivateKey::extract_key_shard(self, usage_count)
    }
}

impl StatefulSigner for HssPrivateKey {
    type Signature = HssSignature;

    fn try_sign(&mut self, message: &[u8]) -> Result<HssSignature> {
        self.sign(message)
    }

    fn usages_remaining(&self) -> u64 {
        HssPrivateKey::usages_remaining(self)
    }

    fn extract_key_shard(&mut self, usage_count: u64) -> Result<Self> {
        HssPrivateKey::extract_key_shard(self, usage_count)
    }
}
