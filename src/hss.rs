//! HSS implementation (RFC 8554, section 6).
//!
//! An HSS private key is a stack of `L` LMS trees: level 0 is the root
//! tree, whose public key is the HSS public key, and each tree at level
//! `i > 0` is signed by one leaf of the tree at level `i - 1`. Only one
//! tree per level is held in memory. Trees below the root are derived
//! deterministically from their parent leaf (identifier and seed come
//! from the parent's seed derivation), so the stack for any global index
//! can be rebuilt from the root key alone.
//!
//! The global index decomposes into one leaf per level, most significant
//! level first: with heights `h_0..h_{L-1}`, leaf `L-1` is the low
//! `h_{L-1}` bits, leaf `L-2` the next `h_{L-2}` bits, and so on.
//!
//! WARNING: an HSS key is stateful. The index is advanced before any
//! signature is produced; the new state (see `encode()`) must be
//! persisted before the signature is released. A key shard must never
//! be used concurrently with a copy of its parent restored from a state
//! older than the shard extraction: nothing in the key data can detect
//! that kind of reuse.

#![allow(non_snake_case)]

use core::fmt;

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::codec::Reader;
use crate::context::{HssSigningContext, HssVerifyingContext};
use crate::lms::{LmsPrivateKey, LmsPublicKey, LmsSignature};
use crate::params::LmsParameters;
use crate::{CryptoRng, Error, Result, RngCore, Vec};

/// Largest supported number of levels.
pub const MAX_LEVELS: usize = 8;

fn check_depth(depth: usize) -> Result<()> {
    if depth == 0 || depth > MAX_LEVELS {
        return Err(Error::InvalidParameter("HSS depth must be between 1 and 8"));
    }
    Ok(())
}

fn check_params(params: &[LmsParameters]) -> Result<()> {
    check_depth(params.len())?;
    params.iter().try_for_each(|ps| ps.check())
}

// Product of the per-level leaf counts, saturated to u64::MAX.
fn compute_index_limit(params: &[LmsParameters]) -> u64 {
    let total: usize = params.iter().map(|ps| ps.sig.h()).sum();
    if total >= 64 {
        u64::MAX
    } else {
        1u64 << total
    }
}

/// HSS private key.
pub struct HssPrivateKey {
    params: Vec<LmsParameters>,
    levels: Vec<LmsPrivateKey>,
    sigs: Vec<LmsSignature>,
    index: u64,
    index_limit: u64,
    is_shard: bool,
}

impl HssPrivateKey {

    /// Generate a new key; `params[0]` configures the root tree. Only
    /// the root identifier and seed are random.
    pub fn generate<T: CryptoRng + RngCore>(params: &[LmsParameters], rng: &mut T)
        -> Result<Self>
    {
        check_params(params)?;
        let root = LmsPrivateKey::generate(params[0], rng)?;
        Self::from_root(params, root)
    }

    /// Create a key from the root identifier and master seed.
    pub fn new(params: &[LmsParameters], I: [u8; 16], SEED: &[u8]) -> Result<Self> {
        check_params(params)?;
        let root = LmsPrivateKey::new(params[0], 0, I, SEED)?;
        Self::from_root(params, root)
    }

    fn from_root(params: &[LmsParameters], root: LmsPrivateKey) -> Result<Self> {
        let mut levels = Vec::with_capacity(params.len());
        levels.push(root);
        let mut sk = Self {
            params: params.to_vec(),
            levels,
            sigs: Vec::with_capacity(params.len() - 1),
            index: 0,
            index_limit: compute_index_limit(params),
            is_shard: false,
        };
        sk.reset_key_to_index()?;
        Ok(sk)
    }

    /// Number of levels `L`.
    pub fn levels(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> &[LmsParameters] {
        &self.params
    }

    /// Next global index to be used.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// End (exclusive) of the usable index range.
    pub fn index_limit(&self) -> u64 {
        self.index_limit
    }

    /// True if this key was obtained with `extract_key_shard()`.
    pub fn is_shard(&self) -> bool {
        self.is_shard
    }

    /// Number of signatures this key can still produce.
    pub fn usages_remaining(&self) -> u64 {
        self.index_limit.saturating_sub(self.index)
    }

    pub fn public_key(&mut self) -> HssPublicKey {
        HssPublicKey {
            L: self.params.len() as u32,
            lms: self.levels[0].public_key(),
        }
    }

    // Leaf of each level for the global index `self.index`.
    fn index_path(&self) -> Vec<u32> {
        let mut path = alloc::vec![0u32; self.params.len()];
        let mut rem = self.index;
        for (i, ps) in self.params.iter().enumerate().rev() {
            let h = ps.sig.h();
            path[i] = (rem & ((1u64 << h) - 1)) as u32;
            rem >>= h;
        }
        path
    }

    /// Rebuild the per-level trees for the current global index. Levels
    /// whose identifier and seed already match the derived ones are
    /// kept; every other level is regenerated from its parent leaf and
    /// signed again, parent before child. Nothing is done if the key is
    /// exhausted.
    pub fn reset_key_to_index(&mut self) -> Result<()> {
        if self.index >= self.index_limit {
            return Ok(());
        }
        let path = self.index_path();
        let depth = self.params.len();
        for i in 1..depth {
            let (I, SEED) = self.levels[i - 1].child_identity(path[i - 1], self.params[i]);
            if i < self.levels.len()
                && self.levels[i].params() == self.params[i]
                && self.levels[i].has_identity(&I, &SEED)
            {
                continue;
            }
            let mut child = LmsPrivateKey::new(self.params[i], 0, I, &SEED)?;
            let pk = child.public_key();
            let sig = self.levels[i - 1].sign_at(path[i - 1], &pk.encode());
            debug!(level = i, parent_leaf = path[i - 1], "regenerated HSS level");
            if i < self.levels.len() {
                self.levels[i] = child;
                self.sigs[i - 1] = sig;
            } else {
                self.levels.push(child);
                self.sigs.push(sig);
            }
        }
        // Upper levels have consumed the leaf that signs the level below.
        for (i, key) in self.levels.iter_mut().enumerate() {
            let q = if i + 1 < depth { path[i] + 1 } else { path[i] };
            key.set_index(q);
        }
        Ok(())
    }

    // Make sure the bottom tree has a usable leaf, replacing exhausted
    // lower trees.
    fn range_test_keys(&mut self) -> Result<()> {
        if self.index >= self.index_limit {
            warn!(index = self.index, limit = self.index_limit,
                "HSS private key exhausted");
            return Err(Error::KeyExhausted);
        }
        let depth = self.levels.len();
        let mut d = depth;
        while self.levels[d - 1].usages_remaining() == 0 {
            d -= 1;
            if d == 0 {
                warn!(index = self.index, "HSS private key exhausted");
                return Err(Error::KeyExhausted);
            }
        }
        while d < depth {
            self.replace_consumed_key(d)?;
            d += 1;
        }
        Ok(())
    }

    // Replace the tree at `level` with the child of the next parent leaf.
    fn replace_consumed_key(&mut self, level: usize) -> Result<()> {
        let leaf = self.levels[level - 1].index();
        let (I, SEED) = self.levels[level - 1].child_identity(leaf, self.params[level]);
        let mut child = LmsPrivateKey::new(self.params[level], 0, I, &SEED)?;
        let pk = child.public_key();
        let sig = self.levels[level - 1].sign(&pk.encode())?;
        debug!(level, parent_leaf = leaf, "replaced exhausted HSS level");
        self.levels[level] = child;
        self.sigs[level - 1] = sig;
        Ok(())
    }

    /// Reserve the next global index and return a context that
    /// accumulates the message to sign. This is the only place where
    /// the index advances.
    pub fn signing_context(&mut self) -> Result<HssSigningContext> {
        self.range_test_keys()?;
        let depth = self.levels.len();
        let mut signed_pub_keys = Vec::with_capacity(depth - 1);
        for i in 0..(depth - 1) {
            signed_pub_keys.push(SignedPublicKey {
                sig: self.sigs[i].clone(),
                public_key: self.levels[i + 1].public_key(),
            });
        }
        let inner = self.levels[depth - 1].signing_context()?;
        self.index += 1;
        Ok(HssSigningContext::new(inner, signed_pub_keys))
    }

    /// Sign `message` with the next global index.
    pub fn sign(&mut self, message: &[u8]) -> Result<HssSignature> {
        let mut ctx = self.signing_context()?;
        ctx.update(message);
        Ok(ctx.finalize())
    }

    /// Split off the next `usage_count` indices as an independent key.
    /// This key skips over them. Neither key may later be restored from
    /// a state older than the split.
    pub fn extract_key_shard(&mut self, usage_count: u64) -> Result<Self> {
        if usage_count == 0 {
            return Err(Error::InvalidParameter("empty shard"));
        }
        if usage_count > self.usages_remaining() {
            return Err(Error::KeyExhausted);
        }
        let start = self.index;
        let end = start + usage_count;
        let mut shard = Self {
            params: self.params.clone(),
            levels: self.levels.iter().map(|k| k.duplicate()).collect(),
            sigs: self.sigs.clone(),
            index: start,
            index_limit: end,
            is_shard: true,
        };
        shard.reset_key_to_index()?;
        self.index = end;
        self.reset_key_to_index()?;
        debug!(start, end, "extracted HSS key shard");
        Ok(shard)
    }

    /// Encode the private key state: `u32(0) || u32(L) || u64(index) ||
    /// u64(indexLimit) || u8(isShard) || LMS private keys || LMS
    /// signatures`.
    pub fn encode(&self) -> Zeroizing<Vec<u8>> {
        let mut buf = Zeroizing::new(Vec::new());
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&(self.levels.len() as u32).to_be_bytes());
        buf.extend_from_slice(&self.index.to_be_bytes());
        buf.extend_from_slice(&self.index_limit.to_be_bytes());
        buf.push(self.is_shard as u8);
        for key in self.levels.iter() {
            key.write_to(&mut buf);
        }
        for sig in self.sigs.iter() {
            sig.write_to(&mut buf);
        }
        buf
    }

    /// Decode a private key state; the per-level trees are then brought
    /// in line with the stored index.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf);
        if r.u32()? != 0 {
            return Err(Error::Decode("unsupported HSS private key version"));
        }
        let depth = r.u32()? as usize;
        if depth == 0 || depth > MAX_LEVELS {
            return Err(Error::Decode("bad HSS depth"));
        }
        let index = r.u64()?;
        let index_limit = r.u64()?;
        let is_shard = match r.u8()? {
            0 => false,
            1 => true,
            _ => return Err(Error::Decode("bad shard flag")),
        };
        let mut levels = Vec::with_capacity(depth);
        for _ in 0..depth {
            let key = LmsPrivateKey::read_from(&mut r)?;
            if key.index_limit() != key.params().sig.leaves() {
                return Err(Error::Decode("HSS level is not a full tree"));
            }
            levels.push(key);
        }
        let mut sigs = Vec::with_capacity(depth - 1);
        for _ in 1..depth {
            sigs.push(LmsSignature::read_from(&mut r)?);
        }
        r.finish()?;

        let params: Vec<LmsParameters> = levels.iter().map(|k| k.params()).collect();
        if index > index_limit || index_limit > compute_index_limit(&params) {
            return Err(Error::Decode("inconsistent HSS index"));
        }
        let mut sk = Self { params, levels, sigs, index, index_limit, is_shard };
        sk.check_level_signatures()?;
        sk.reset_key_to_index()?;
        Ok(sk)
    }

    // Every stored level that `reset_key_to_index` keeps must come with
    // the signature of its parent at the leaf of the current index.
    // Scanning stops at the first stale level: it and all levels below
    // are regenerated anyway.
    fn check_level_signatures(&mut self) -> Result<()> {
        if self.index >= self.index_limit {
            return Ok(());
        }
        let path = self.index_path();
        for i in 1..self.levels.len() {
            let (I, SEED) = self.levels[i - 1].child_identity(path[i - 1], self.params[i]);
            if !self.levels[i].has_identity(&I, &SEED) {
                break;
            }
            let child = self.levels[i].public_key();
            let parent = self.levels[i - 1].public_key();
            let sig = &self.sigs[i - 1];
            if sig.q() != path[i - 1] || !parent.verify(&child.encode(), sig) {
                return Err(Error::Decode("bad HSS level signature"));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for HssPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HssPrivateKey")
            .field("params", &self.params)
            .field("index", &self.index)
            .field("index_limit", &self.index_limit)
            .field("is_shard", &self.is_shard)
            .finish_non_exhaustive()
    }
}

/// HSS public key: the depth and the root tree public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HssPublicKey {
    L: u32,
    lms: LmsPublicKey,
}

impl HssPublicKey {

    /// Number of levels `L`.
    pub fn levels(&self) -> u32 {
        self.L
    }

    pub fn lms_public_key(&self) -> &LmsPublicKey {
        &self.lms
    }

    /// Start verifying `sig`. The chain of intermediate public keys is
    /// checked here, but a broken link is reported only by the final
    /// `verify()`.
    pub fn verifying_context<'a>(&'a self, sig: &'a HssSignature)
        -> Result<HssVerifyingContext<'a>>
    {
        if sig.signed_pub_keys.len() + 1 != self.L as usize {
            return Err(Error::InvalidParameter("HSS level count mismatch"));
        }
        let mut chain_ok = true;
        let mut key = &self.lms;
        for spk in sig.signed_pub_keys.iter() {
            // Every link is checked, even after a failure.
            chain_ok &= key.verify(&spk.public_key.encode(), &spk.sig);
            key = &spk.public_key;
        }
        let inner = key.verifying_context(&sig.sig)?;
        Ok(HssVerifyingContext::new(chain_ok, inner))
    }

    pub fn verify(&self, message: &[u8], sig: &HssSignature) -> bool {
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
        let sig = HssSignature::decode(sig)?;
        let mut ctx = self.verifying_context(&sig)?;
        ctx.update(message);
        if ctx.verify() {
            Ok(())
        } else {
            Err(Error::VerificationFailed)
        }
    }

    /// Encode as `u32(L) || LMS public key`.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(4 + self.lms.params().public_key_len());
        buf.extend_from_slice(&self.L.to_be_bytes());
        self.lms.write_to(&mut buf);
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf);
        let L = r.u32()?;
        check_depth(L as usize)?;
        let lms = LmsPublicKey::read_from(&mut r)?;
        r.finish()?;
        Ok(Self { L, lms })
    }
}

/// A lower-level LMS public key and its signature by the level above.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedPublicKey {
    pub(crate) sig: LmsSignature,
    pub(crate) public_key: LmsPublicKey,
}

impl SignedPublicKey {

    pub fn signature(&self) -> &LmsSignature {
        &self.sig
    }

    pub fn public_key(&self) -> &LmsPublicKey {
        &self.public_key
    }
}

/// HSS signature: `L-1` signed public keys and the message signature by
/// the bottom tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HssSignature {
    signed_pub_keys: Vec<SignedPublicKey>,
    sig: LmsSignature,
}

impl HssSignature {

    pub(crate) fn new(signed_pub_keys: Vec<SignedPublicKey>, sig: LmsSignature) -> Self {
        Self { signed_pub_keys, sig }
    }

    pub fn signed_pub_keys(&self) -> &[SignedPublicKey] {
        &self.signed_pub_keys
    }

    /// Signature of the message by the bottom tree.
    pub fn signature(&self) -> &LmsSignature {
        &self.sig
    }

    /// Encode as `u32(L-1) || (LMS signature || LMS public key)* ||
    /// LMS signature`.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(self.signed_pub_keys.len() as u32).to_be_bytes());
        for spk in self.signed_pub_keys.iter() {
            spk.sig.write_to(&mut buf);
            spk.public_key.write_to(&mut buf);
        }
        self.sig.write_to(&mut buf);
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf);
        let nspk = r.u32()? as usize;
        if nspk >= MAX_LEVELS {
            return Err(Error::Decode("too many signed public keys"));
        }
        let mut signed_pub_keys = Vec::with_capacity(nspk);
        for _ in 0..nspk {
            let sig = LmsSignature::read_from(&mut r)?;
            let public_key = LmsPublicKey::read_from(&mut r)?;
            signed_pub_keys.push(SignedPublicKey { sig, public_key });
        }
        let sig = LmsSignature::read_from(&mut r)?;
        r.finish()?;
        Ok(Self { signed_pub_keys, sig })
    }
}
