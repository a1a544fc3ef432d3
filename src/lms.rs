//! LMS implementation.
//!
//! This follows RFC 8554 (section 5), with the additional parameter sets
//! of NIST SP 800-208 / draft-fluhrer-lms-more-parm-sets.
//!
//! WARNING: LMS is a stateful signature scheme; each signature modifies
//! the private key. If the same private key state is used to generate
//! two signatures on different data, then attackers observing the two
//! signature values learn enough to make forgeries. This implementation
//! always advances the leaf index of `LmsPrivateKey` before a signature
//! is produced, but it is up to the caller to ensure that the new private
//! key state (see `encode()`) is committed to stable storage before
//! showing the signature value to any third party.
//!
//! Tree nodes are numbered from 1 (the root) to `2^(h+1) - 1`; the
//! children of node `r` are `2*r` and `2*r+1`, and leaf `q` is node
//! `2^h + q`.

// We use the constant names from RFC 8554, which do not following the
// default casing style rules of Rust.
#![allow(non_snake_case)]

use alloc::collections::BTreeMap;
use core::fmt;

use subtle::ConstantTimeEq;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::codec::Reader;
use crate::context::{LmsSigningContext, LmsVerifyingContext};
use crate::hash::{Hasher, D_INTR, D_LEAF, MAX_HASH};
use crate::lm_ots::{LmOtsPrivateKey, LmOtsSignature};
use crate::params::{LmOtsParameters, LmsParameters, LmsSigParameters};
use crate::seed::{SeedDerive, J_CHILD_SEED};
use crate::{CryptoRng, Error, Result, RngCore, Vec};

// Nodes below this height bound (counted from the root) are memoized.
const MAX_CACHED_HEIGHT: usize = 15;

/// LMS private key.
///
/// The key owns the leaf counter `q` and the range `[q, max_q)` of leaves
/// it may still use. Tree nodes are computed on demand and memoized; the
/// public key is computed on first use.
pub struct LmsPrivateKey {
    params: LmsParameters,
    I: [u8; 16],
    q: u32,
    max_q: u32,
    SEED: Zeroizing<Vec<u8>>,
    pub_key: Option<LmsPublicKey>,
    t_cache: BTreeMap<u32, [u8; MAX_HASH]>,
    max_cache_r: u32,
}

impl LmsPrivateKey {

    /// Generate a new key with a random identifier and seed.
    pub fn generate<T: CryptoRng + RngCore>(params: LmsParameters, rng: &mut T)
        -> Result<Self>
    {
        params.check()?;
        let mut I = [0u8; 16];
        let mut SEED = Zeroizing::new(alloc::vec![0u8; params.sig.m()]);
        rng.fill_bytes(&mut I);
        rng.fill_bytes(&mut SEED);
        Ok(Self::with_range(params, I, SEED, 0, params.sig.leaves()))
    }

    /// Create a key from an identifier and a master seed; the first leaf
    /// to use is `q0`. The seed must be at least `m` bytes long.
    pub fn new(params: LmsParameters, q0: u32, I: [u8; 16], SEED: &[u8]) -> Result<Self> {
        params.check()?;
        if SEED.len() < params.sig.m() {
            return Err(Error::InvalidParameter("seed shorter than the hash output"));
        }
        if q0 > params.sig.leaves() {
            return Err(Error::InvalidParameter("leaf index out of range"));
        }
        Ok(Self::with_range(params, I, Zeroizing::new(SEED.to_vec()),
            q0, params.sig.leaves()))
    }

    fn with_range(params: LmsParameters, I: [u8; 16], SEED: Zeroizing<Vec<u8>>,
        q: u32, max_q: u32) -> Self
    {
        let h = params.sig.h();
        let max_cache_r = 1u32 << (core::cmp::min(h, MAX_CACHED_HEIGHT) + 1);
        Self {
            params, I, q, max_q, SEED,
            pub_key: None,
            t_cache: BTreeMap::new(),
            max_cache_r,
        }
    }

    // Deep copy, cache included. Only used for shards, where the two
    // copies get disjoint leaf ranges right away.
    pub(crate) fn duplicate(&self) -> Self {
        Self {
            params: self.params,
            I: self.I,
            q: self.q,
            max_q: self.max_q,
            SEED: self.SEED.clone(),
            pub_key: self.pub_key,
            t_cache: self.t_cache.clone(),
            max_cache_r: self.max_cache_r,
        }
    }

    pub fn params(&self) -> LmsParameters {
        self.params
    }

    pub fn I(&self) -> &[u8; 16] {
        &self.I
    }

    /// Next leaf to be used.
    pub fn index(&self) -> u32 {
        self.q
    }

    /// End (exclusive) of the usable leaf range; `2^h` unless this key
    /// is a shard.
    pub fn index_limit(&self) -> u32 {
        self.max_q
    }

    /// Number of signatures this key can still produce.
    pub fn usages_remaining(&self) -> u64 {
        (self.max_q - self.q) as u64
    }

    pub(crate) fn set_index(&mut self, q: u32) {
        self.q = q;
    }

    /// Get the public key (computing the whole tree on first call).
    pub fn public_key(&mut self) -> LmsPublicKey {
        if let Some(pk) = self.pub_key {
            return pk;
        }
        let T1 = self.find_t(1);
        let pk = LmsPublicKey { params: self.params, I: self.I, T1 };
        self.pub_key = Some(pk);
        pk
    }

    /// Hand out the one-time key of the current leaf and advance the
    /// leaf index. Once `max_q` is reached this fails with
    /// `Error::KeyExhausted`.
    pub fn next_ots_key(&mut self) -> Result<LmOtsPrivateKey> {
        let q = self.q;
        if q >= self.max_q {
            warn!(max_q = self.max_q, "LMS private key exhausted");
            return Err(Error::KeyExhausted);
        }
        self.q = q + 1;
        Ok(self.ots_key(q))
    }

    fn ots_key(&self, q: u32) -> LmOtsPrivateKey {
        LmOtsPrivateKey::new(self.params.ots, self.I, q, &self.SEED)
    }

    /// Reserve the next leaf and return a context that accumulates the
    /// message to sign.
    pub fn signing_context(&mut self) -> Result<LmsSigningContext> {
        let ots = self.next_ots_key()?;
        let path = self.auth_path(ots.q());
        Ok(LmsSigningContext::new(ots, self.params.sig, path))
    }

    /// Sign `message` with the next leaf.
    pub fn sign(&mut self, message: &[u8]) -> Result<LmsSignature> {
        let mut ctx = self.signing_context()?;
        ctx.update(message);
        Ok(ctx.finalize())
    }

    /// Sign at an explicit leaf without touching the leaf counter. The
    /// caller guarantees that `leaf` is reserved for exactly this
    /// message (signing is deterministic, so repeating the same call
    /// yields the same signature).
    pub(crate) fn sign_at(&mut self, leaf: u32, message: &[u8]) -> LmsSignature {
        let path = self.auth_path(leaf);
        let mut ctx = LmsSigningContext::new(self.ots_key(leaf), self.params.sig, path);
        ctx.update(message);
        ctx.finalize()
    }

    /// Authentication path of leaf `q`: for each depth `i`, the sibling
    /// of node `(2^h + q) >> i`.
    pub(crate) fn auth_path(&mut self, q: u32) -> Vec<u8> {
        let h = self.params.sig.h();
        let m = self.params.sig.m();
        let mut path = Vec::with_capacity(h * m);
        let mut r = (1u32 << h) + q;
        for _ in 0..h {
            let t = self.find_t(r ^ 1);
            path.extend_from_slice(&t[..m]);
            r >>= 1;
        }
        path
    }

    fn find_t(&mut self, r: u32) -> [u8; MAX_HASH] {
        if let Some(t) = self.t_cache.get(&r) {
            return *t;
        }
        let t = self.calc_t(r);
        if r < self.max_cache_r {
            self.t_cache.insert(r, t);
        }
        t
    }

    fn calc_t(&mut self, r: u32) -> [u8; MAX_HASH] {
        let leaves = self.params.sig.leaves();
        let m = self.params.sig.m();
        let mut T = [0u8; MAX_HASH];
        if r >= leaves {
            let K = self.ots_key(r - leaves).public_key();
            let mut sh = self.node_prefix(r);
            sh.update(&D_LEAF);
            sh.update(K.K());
            sh.finalize_into(&mut T);
        } else {
            let left = self.find_t(2 * r);
            let right = self.find_t(2 * r + 1);
            let mut sh = self.node_prefix(r);
            sh.update(&D_INTR);
            sh.update(&left[..m]);
            sh.update(&right[..m]);
            sh.finalize_into(&mut T);
        }
        T
    }

    fn node_prefix(&self, r: u32) -> Hasher {
        let mut sh = Hasher::new(self.params.sig.hash());
        sh.update(&self.I);
        sh.update(&r.to_be_bytes());
        sh
    }

    /// Identifier and seed of the child tree attached to `leaf` (HSS).
    /// The seed is derived at `j = 0xFFFE` and the identifier is the
    /// first 16 bytes of the value at `j = 0xFFFF`.
    pub(crate) fn child_identity(&self, leaf: u32, child: LmsParameters)
        -> ([u8; 16], Zeroizing<Vec<u8>>)
    {
        let hash = child.sig.hash();
        let mut sd = SeedDerive::new(&self.I, &self.SEED, hash);
        sd.set_q(leaf);
        sd.set_j(J_CHILD_SEED);
        let mut SEED = Zeroizing::new(alloc::vec![0u8; hash.output_len()]);
        sd.derive_into(&mut SEED, true);
        let mut post = [0u8; MAX_HASH];
        sd.derive_into(&mut post, false);
        let mut I = [0u8; 16];
        I.copy_from_slice(&post[..16]);
        (I, SEED)
    }

    pub(crate) fn has_identity(&self, I: &[u8; 16], SEED: &[u8]) -> bool {
        let same = self.I[..].ct_eq(&I[..]) & self.SEED.as_slice().ct_eq(SEED);
        same.into()
    }

    /// Split off the next `usage_count` leaves as an independent key.
    /// This key skips over them. The shard and this key must never be
    /// restored from a state older than the split.
    pub fn extract_key_shard(&mut self, usage_count: u64) -> Result<Self> {
        if usage_count == 0 {
            return Err(Error::InvalidParameter("empty shard"));
        }
        if usage_count > self.usages_remaining() {
            return Err(Error::KeyExhausted);
        }
        // usage_count <= max_q - q, so it fits in a u32.
        let end = self.q + usage_count as u32;
        let mut shard = self.duplicate();
        shard.max_q = end;
        debug!(start = self.q, end, "extracted LMS key shard");
        self.q = end;
        Ok(shard)
    }

    /// Encode as `u32(0) || u32(sigType) || u32(otsType) || I || u32(q)
    /// || u32(max_q) || u32(len) || SEED`.
    pub fn encode(&self) -> Zeroizing<Vec<u8>> {
        let mut buf = Zeroizing::new(Vec::with_capacity(40 + self.SEED.len()));
        self.write_to(&mut buf);
        buf
    }

    pub(crate) fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&self.params.sig.type_id().to_be_bytes());
        buf.extend_from_slice(&self.params.ots.type_id().to_be_bytes());
        buf.extend_from_slice(&self.I);
        buf.extend_from_slice(&self.q.to_be_bytes());
        buf.extend_from_slice(&self.max_q.to_be_bytes());
        buf.extend_from_slice(&(self.SEED.len() as u32).to_be_bytes());
        buf.extend_from_slice(&self.SEED);
    }

    pub(crate) fn read_from(r: &mut Reader<'_>) -> Result<Self> {
        if r.u32()? != 0 {
            return Err(Error::Decode("unsupported LMS private key version"));
        }
        let sig = LmsSigParameters::from_type_id(r.u32()?)?;
        let ots = LmOtsParameters::from_type_id(r.u32()?)?;
        let params = LmsParameters::new(sig, ots);
        if params.check().is_err() {
            return Err(Error::Decode("LMS and LM-OTS hash mismatch"));
        }
        let I = r.array::<16>()?;
        let q = r.u32()?;
        let max_q = r.u32()?;
        if q > max_q || max_q > sig.leaves() {
            return Err(Error::Decode("inconsistent leaf counters"));
        }
        let len = r.u32()? as usize;
        let SEED = r.bytes(len)?;
        if SEED.len() < sig.m() {
            return Err(Error::Decode("seed shorter than the hash output"));
        }
        Ok(Self::with_range(params, I, Zeroizing::new(SEED.to_vec()), q, max_q))
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf);
        let sk = Self::read_from(&mut r)?;
        r.finish()?;
        Ok(sk)
    }
}

impl fmt::Debug for LmsPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LmsPrivateKey")
            .field("params", &self.params)
            .field("I", &self.I)
            .field("q", &self.q)
            .field("max_q", &self.max_q)
            .finish_non_exhaustive()
    }
}

/// LMS public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LmsPublicKey {
    params: LmsParameters,
    I: [u8; 16],
    T1: [u8; MAX_HASH],
}

impl LmsPublicKey {

    pub fn params(&self) -> LmsParameters {
        self.params
    }

    pub fn I(&self) -> &[u8; 16] {
        &self.I
    }

    /// Tree root (`m` bytes).
    pub fn T1(&self) -> &[u8] {
        &self.T1[..self.params.sig.m()]
    }

    /// Start verifying `sig`; the message is then fed to the context.
    /// Fails if the signature parameter sets do not match this key.
    pub fn verifying_context<'a>(&'a self, sig: &'a LmsSignature)
        -> Result<LmsVerifyingContext<'a>>
    {
        if sig.ots_sig.params() != self.params.ots {
            return Err(Error::InvalidParameter("LM-OTS type mismatch"));
        }
        if sig.sig != self.params.sig {
            return Err(Error::InvalidParameter("LMS type mismatch"));
        }
        if sig.q >= self.params.sig.leaves() {
            return Err(Error::InvalidParameter("leaf index out of range"));
        }
        Ok(LmsVerifyingContext::new(self, sig))
    }

    /// Verify `sig` over `message`.
    pub fn verify(&self, message: &[u8], sig: &LmsSignature) -> bool {
        match self.verifying_context(sig) {
            Ok(mut ctx) => {
                ctx.update(message);
                ctx.verify()
            }
            Err(_) => false,
        }
    }

    /// Verify an encoded signature, reporting malformed input apart from
    /// a signature that does not match.
    pub fn verify_encoded(&self, message: &[u8], sig: &[u8]) -> Result<()> {
        let sig = LmsSignature::decode(sig)?;
        let mut ctx = self.verifying_context(&sig)?;
        ctx.update(message);
        if ctx.verify() {
            Ok(())
        } else {
            Err(Error::VerificationFailed)
        }
    }

    // Walk from the leaf to the root with the candidate OTS key `Kc`
    // and compare with T1.
    pub(crate) fn check_root(&self, sig: &LmsSignature, Kc: &[u8]) -> bool {
        let h = self.params.sig.h();
        let m = self.params.sig.m();
        let mut r = (1u32 << h) + sig.q;
        let mut tmp = [0u8; MAX_HASH];
        let mut sh = self.node_prefix(r);
        sh.update(&D_LEAF);
        sh.update(Kc);
        sh.finalize_into(&mut tmp);
        for i in 0..h {
            let sibling = &sig.path[(i * m)..((i + 1) * m)];
            let odd = (r & 1) != 0;
            r >>= 1;
            let mut sh = self.node_prefix(r);
            sh.update(&D_INTR);
            if odd {
                sh.update(sibling);
                sh.update(&tmp[..m]);
            } else {
                sh.update(&tmp[..m]);
                sh.update(sibling);
            }
            sh.finalize_into(&mut tmp);
        }
        tmp[..m].ct_eq(self.T1()).into()
    }

    fn node_prefix(&self, r: u32) -> Hasher {
        let mut sh = Hasher::new(self.params.sig.hash());
        sh.update(&self.I);
        sh.update(&r.to_be_bytes());
        sh
    }

    /// Encode as `u32(sigType) || u32(otsType) || I || T1`.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.params.public_key_len());
        self.write_to(&mut buf);
        buf
    }

    pub(crate) fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.params.sig.type_id().to_be_bytes());
        buf.extend_from_slice(&self.params.ots.type_id().to_be_bytes());
        buf.extend_from_slice(&self.I);
        buf.extend_from_slice(self.T1());
    }

    pub(crate) fn read_from(r: &mut Reader<'_>) -> Result<Self> {
        let sig = LmsSigParameters::from_type_id(r.u32()?)?;
        let ots = LmOtsParameters::from_type_id(r.u32()?)?;
        let params = LmsParameters::new(sig, ots);
        if params.check().is_err() {
            return Err(Error::Decode("LMS and LM-OTS hash mismatch"));
        }
        let I = r.array::<16>()?;
        let mut T1 = [0u8; MAX_HASH];
        T1[..sig.m()].copy_from_slice(r.bytes(sig.m())?);
        Ok(Self { params, I, T1 })
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf);
        let pk = Self::read_from(&mut r)?;
        r.finish()?;
        Ok(pk)
    }
}

/// LMS signature: leaf index, one-time signature and authentication path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LmsSignature {
    q: u32,
    ots_sig: LmOtsSignature,
    sig: LmsSigParameters,
    path: Vec<u8>,
}

impl LmsSignature {

    pub(crate) fn new(q: u32, ots_sig: LmOtsSignature, sig: LmsSigParameters,
        path: Vec<u8>) -> Self
    {
        Self { q, ots_sig, sig, path }
    }

    /// Leaf used for this signature.
    pub fn q(&self) -> u32 {
        self.q
    }

    pub fn ots_signature(&self) -> &LmOtsSignature {
        &self.ots_sig
    }

    pub fn sig_params(&self) -> LmsSigParameters {
        self.sig
    }

    /// Authentication path node at depth `i` (`m` bytes).
    ///
    /// # Panics
    ///
    /// Panics if `i` is not lower than the tree height `h`.
    pub fn path(&self, i: usize) -> &[u8] {
        let m = self.sig.m();
        &self.path[(i * m)..((i + 1) * m)]
    }

    /// Encoded length (in bytes).
    pub fn encoded_len(&self) -> usize {
        8 + self.ots_sig.encoded_len() + self.path.len()
    }

    /// Encode as `u32(q) || LM-OTS signature || u32(sigType) || path`.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut buf);
        buf
    }

    pub(crate) fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.q.to_be_bytes());
        self.ots_sig.write_to(buf);
        buf.extend_from_slice(&self.sig.type_id().to_be_bytes());
        buf.extend_from_slice(&self.path);
    }

    pub(crate) fn read_from(r: &mut Reader<'_>) -> Result<Self> {
        let q = r.u32()?;
        let ots_sig = LmOtsSignature::read_from(r)?;
        let sig = LmsSigParameters::from_type_id(r.u32()?)?;
        if q >= sig.leaves() {
            return Err(Error::Decode("leaf index out of range"));
        }
        let path = r.bytes(sig.h() * sig.m())?.to_vec();
        Ok(Self { q, ots_sig, sig, path })
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf);
        let sig = Self::read_from(&mut r)?;
        r.finish()?;
        Ok(sig)
    }
}
