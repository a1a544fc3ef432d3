//! Streaming signing and verification contexts.
//!
//! A context is obtained from a private key (signing) or a public key
//! (verification), fed the message with any number of `update()` calls,
//! and consumed by `finalize()` / `verify()`. Since the final call takes
//! the context by value, a context cannot be finalized twice nor updated
//! afterwards.
//!
//! For signing, the leaf (and, for HSS, the global index) has already
//! been reserved when the context is created: dropping a signing context
//! without finalizing it wastes that leaf, it never makes it available
//! again.

#![allow(non_snake_case)]

use crate::hash::{Hasher, MAX_HASH};
use crate::hss::{HssSignature, SignedPublicKey};
use crate::lm_ots::{message_hasher, LmOtsPrivateKey};
use crate::lms::{LmsPublicKey, LmsSignature};
use crate::params::LmsSigParameters;
use crate::Vec;

/// Accumulates a message to be signed with one reserved LMS leaf.
pub struct LmsSigningContext {
    key: LmOtsPrivateKey,
    sig_params: LmsSigParameters,
    C: [u8; MAX_HASH],
    path: Vec<u8>,
    hasher: Hasher,
}

impl LmsSigningContext {

    pub(crate) fn new(key: LmOtsPrivateKey, sig_params: LmsSigParameters, path: Vec<u8>)
        -> Self
    {
        let C = key.randomizer();
        Self::with_randomizer(key, sig_params, path, C)
    }

    pub(crate) fn with_randomizer(key: LmOtsPrivateKey, sig_params: LmsSigParameters,
        path: Vec<u8>, C: [u8; MAX_HASH]) -> Self
    {
        let n = key.params().n();
        let hasher = message_hasher(key.params(), key.I(), key.q(), &C[..n]);
        Self { key, sig_params, C, path, hasher }
    }

    /// Leaf used by this signature.
    pub fn q(&self) -> u32 {
        self.key.q()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Produce the signature, consuming the one-time key.
    pub fn finalize(self) -> LmsSignature {
        let n = self.key.params().n();
        let mut Q = [0u8; MAX_HASH];
        self.hasher.finalize_into(&mut Q);
        let q = self.key.q();
        let ots_sig = self.key.sign_digest(&self.C[..n], &Q[..n]);
        LmsSignature::new(q, ots_sig, self.sig_params, self.path)
    }
}

/// Accumulates a message to be checked against one LMS signature.
pub struct LmsVerifyingContext<'a> {
    pub_key: &'a LmsPublicKey,
    sig: &'a LmsSignature,
    hasher: Hasher,
}

impl<'a> LmsVerifyingContext<'a> {

    pub(crate) fn new(pub_key: &'a LmsPublicKey, sig: &'a LmsSignature) -> Self {
        let ots = sig.ots_signature();
        let hasher = message_hasher(ots.params(), pub_key.I(), sig.q(), ots.C());
        Self { pub_key, sig, hasher }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Recompute the root and compare it with the public key.
    pub fn verify(self) -> bool {
        let mut Q = [0u8; MAX_HASH];
        self.hasher.finalize_into(&mut Q);
        let ots = self.sig.ots_signature();
        let Kc = ots.candidate_key(self.pub_key.I(), self.sig.q(), &Q);
        self.pub_key.check_root(self.sig, &Kc[..ots.params().n()])
    }
}

/// Accumulates a message to be signed with an HSS key. The chain of
/// signed intermediate public keys was captured when the context was
/// created.
pub struct HssSigningContext {
    inner: LmsSigningContext,
    signed_pub_keys: Vec<SignedPublicKey>,
}

impl HssSigningContext {

    pub(crate) fn new(inner: LmsSigningContext, signed_pub_keys: Vec<SignedPublicKey>)
        -> Self
    {
        Self { inner, signed_pub_keys }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    pub fn finalize(self) -> HssSignature {
        HssSignature::new(self.signed_pub_keys, self.inner.finalize())
    }
}

/// Accumulates a message to be checked against an HSS signature. The
/// chain of intermediate public keys has already been checked when the
/// context was created; the result is only reported by `verify()`.
pub struct HssVerifyingContext<'a> {
    chain_ok: bool,
    inner: LmsVerifyingContext<'a>,
}

impl<'a> HssVerifyingContext<'a> {

    pub(crate) fn new(chain_ok: bool, inner: LmsVerifyingContext<'a>) -> Self {
        Self { chain_ok, inner }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    pub fn verify(self) -> bool {
        // Both checks always run.
        let bottom_ok = self.inner.verify();
        self.chain_ok & bottom_ok
    }
}
