//! LM-OTS one-time signatures (RFC 8554, section 4).
//!
//! A one-time private key is never created by the caller directly: it is
//! handed out by its owning LMS key (see
//! [`LmsPrivateKey::next_ots_key`](crate::LmsPrivateKey::next_ots_key)),
//! which advances its leaf counter first. `LmOtsPrivateKey` is not
//! `Clone` and `sign()` consumes it, so a given instance can produce at
//! most one signature.

// We use the constant names from RFC 8554, which do not following the
// default casing style rules of Rust.
#![allow(non_snake_case)]

use core::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use crate::codec::Reader;
use crate::hash::{Hasher, D_MESG, D_PBLC, MAX_HASH};
use crate::params::LmOtsParameters;
use crate::seed::{SeedDerive, J_RANDOMIZER};
use crate::{Error, Result, Vec};

/// Coefficient `i` of `Q` for Winternitz width `w` (RFC 8554, section 3.1.3).
pub fn coef(Q: &[u8], i: usize, w: usize) -> u8 {
    let m8 = ((1u32 << w) - 1) as u8;
    (Q[(i * w) / 8] >> (8 - (w * (i % (8 / w)) + w))) & m8
}

/// Winternitz checksum of the `n`-byte digest `Q`, already shifted left by
/// `ls` bits.
pub fn checksum(params: LmOtsParameters, Q: &[u8]) -> u16 {
    let w = params.w();
    let mut sum = 0u16;
    for i in 0..((params.n() * 8) / w) {
        sum = sum.wrapping_add((1u16 << w) - 1);
        sum = sum.wrapping_sub(coef(Q, i, w) as u16);
    }
    sum << params.ls()
}

// Q || Cksm(Q), as used by both signing and verification.
fn digest_with_checksum(params: LmOtsParameters, Q: &[u8]) -> [u8; MAX_HASH + 2] {
    let n = params.n();
    let mut Qck = [0u8; MAX_HASH + 2];
    Qck[..n].copy_from_slice(&Q[..n]);
    Qck[n..(n + 2)].copy_from_slice(&checksum(params, &Q[..n]).to_be_bytes());
    Qck
}

// Advance the chain value in tmp[..n] from step `start` to step `end`.
// Each step is H(I || u32(q) || u16(i) || u8(j) || tmp).
fn chain(prefix: &Hasher, i: u16, start: usize, end: usize, tmp: &mut [u8]) {
    let n = prefix.output_len();
    for j in start..end {
        let mut sh = prefix.clone();
        sh.update(&i.to_be_bytes());
        sh.update(&[j as u8]);
        sh.update(&tmp[..n]);
        sh.finalize_into(tmp);
    }
}

fn leaf_prefix(params: LmOtsParameters, I: &[u8; 16], q: u32) -> Hasher {
    let mut sh = Hasher::new(params.hash());
    sh.update(I);
    sh.update(&q.to_be_bytes());
    sh
}

/// Running computation of the message digest
/// `Q = H(I || u32(q) || D_MESG || C || message)`.
pub(crate) fn message_hasher(params: LmOtsParameters, I: &[u8; 16], q: u32, C: &[u8])
    -> Hasher
{
    let mut sh = leaf_prefix(params, I, q);
    sh.update(&D_MESG);
    sh.update(C);
    sh
}

/// LM-OTS private key for leaf `q` of the tree identified by `I`.
pub struct LmOtsPrivateKey {
    params: LmOtsParameters,
    I: [u8; 16],
    q: u32,
    SEED: Zeroizing<Vec<u8>>,
}

impl LmOtsPrivateKey {

    pub(crate) fn new(params: LmOtsParameters, I: [u8; 16], q: u32, SEED: &[u8])
        -> Self
    {
        Self { params, I, q, SEED: Zeroizing::new(SEED.to_vec()) }
    }

    pub fn params(&self) -> LmOtsParameters {
        self.params
    }

    pub fn I(&self) -> &[u8; 16] {
        &self.I
    }

    pub fn q(&self) -> u32 {
        self.q
    }

    fn seed_derive(&self) -> SeedDerive<'_> {
        let mut sd = SeedDerive::new(&self.I, &self.SEED, self.params.hash());
        sd.set_q(self.q);
        sd
    }

    /// Compute the matching public key (`2^w - 1` hash steps per chain).
    pub fn public_key(&self) -> LmOtsPublicKey {
        let params = self.params;
        let prefix = leaf_prefix(params, &self.I, self.q);
        let mut kh = prefix.clone();
        kh.update(&D_PBLC);
        let mut sd = self.seed_derive();
        let top = (1usize << params.w()) - 1;
        let mut tmp = Zeroizing::new([0u8; MAX_HASH]);
        for i in 0..params.p() {
            sd.derive_into(&mut tmp[..], true);
            chain(&prefix, i as u16, 0, top, &mut tmp[..]);
            kh.update(&tmp[..params.n()]);
        }
        let mut K = [0u8; MAX_HASH];
        kh.finalize_into(&mut K);
        LmOtsPublicKey { params, I: self.I, q: self.q, K }
    }

    /// Per-signature randomizer `C`. It is derived from the seed, so
    /// signing the same message at the same leaf twice is reproducible
    /// (the one-time key is still consumed only once).
    pub(crate) fn randomizer(&self) -> [u8; MAX_HASH] {
        let mut sd = self.seed_derive();
        sd.set_j(J_RANDOMIZER);
        let mut C = [0u8; MAX_HASH];
        sd.derive_into(&mut C, false);
        C
    }

    /// Sign `message` with the derived randomizer.
    pub fn sign(self, message: &[u8]) -> LmOtsSignature {
        let C = self.randomizer();
        let n = self.params.n();
        let mut sh = message_hasher(self.params, &self.I, self.q, &C[..n]);
        sh.update(message);
        let mut Q = [0u8; MAX_HASH];
        sh.finalize_into(&mut Q);
        self.sign_digest(&C[..n], &Q[..n])
    }

    /// Sign the `n`-byte message digest `Q` computed with randomizer `C`.
    pub(crate) fn sign_digest(self, C: &[u8], Q: &[u8]) -> LmOtsSignature {
        let params = self.params;
        let n = params.n();
        let w = params.w();
        let Qck = digest_with_checksum(params, Q);
        let prefix = leaf_prefix(params, &self.I, self.q);
        let mut sd = self.seed_derive();
        let mut y = Vec::with_capacity(params.p() * n);
        let mut tmp = Zeroizing::new([0u8; MAX_HASH]);
        for i in 0..params.p() {
            sd.derive_into(&mut tmp[..], true);
            let a = coef(&Qck, i, w) as usize;
            chain(&prefix, i as u16, 0, a, &mut tmp[..]);
            y.extend_from_slice(&tmp[..n]);
        }
        LmOtsSignature { params, C: C[..n].to_vec(), y }
    }
}

impl fmt::Debug for LmOtsPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LmOtsPrivateKey")
            .field("params", &self.params)
            .field("I", &self.I)
            .field("q", &self.q)
            .finish_non_exhaustive()
    }
}

/// LM-OTS public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LmOtsPublicKey {
    params: LmOtsParameters,
    I: [u8; 16],
    q: u32,
    K: [u8; MAX_HASH],
}

impl LmOtsPublicKey {

    pub fn params(&self) -> LmOtsParameters {
        self.params
    }

    pub fn I(&self) -> &[u8; 16] {
        &self.I
    }

    pub fn q(&self) -> u32 {
        self.q
    }

    pub fn K(&self) -> &[u8] {
        &self.K[..self.params.n()]
    }

    /// Verify `sig` over `message`.
    pub fn verify(&self, message: &[u8], sig: &LmOtsSignature) -> bool {
        if sig.params != self.params {
            return false;
        }
        let mut sh = message_hasher(self.params, &self.I, self.q, &sig.C);
        sh.update(message);
        let mut Q = [0u8; MAX_HASH];
        sh.finalize_into(&mut Q);
        let Kc = sig.candidate_key(&self.I, self.q, &Q);
        self.K().ct_eq(&Kc[..self.params.n()]).into()
    }

    /// Encode as `u32(type) || I || u32(q) || K`.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(24 + self.params.n());
        buf.extend_from_slice(&self.params.type_id().to_be_bytes());
        buf.extend_from_slice(&self.I);
        buf.extend_from_slice(&self.q.to_be_bytes());
        buf.extend_from_slice(self.K());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf);
        let params = LmOtsParameters::from_type_id(r.u32()?)?;
        let I = r.array::<16>()?;
        let q = r.u32()?;
        let mut K = [0u8; MAX_HASH];
        K[..params.n()].copy_from_slice(r.bytes(params.n())?);
        r.finish()?;
        Ok(Self { params, I, q, K })
    }
}

/// LM-OTS signature: randomizer `C` and the `p` chain values `y`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LmOtsSignature {
    params: LmOtsParameters,
    C: Vec<u8>,
    y: Vec<u8>,
}

impl LmOtsSignature {

    pub fn params(&self) -> LmOtsParameters {
        self.params
    }

    pub fn C(&self) -> &[u8] {
        &self.C
    }

    /// Chain value `i` (`n` bytes).
    ///
    /// # Panics
    ///
    /// Panics if `i` is not lower than `p`.
    pub fn y(&self, i: usize) -> &[u8] {
        let n = self.params.n();
        &self.y[(i * n)..((i + 1) * n)]
    }

    /// Recompute the candidate public key `Kc` from the digest `Q`
    /// (the first `n` bytes of `Q` are used).
    pub(crate) fn candidate_key(&self, I: &[u8; 16], q: u32, Q: &[u8]) -> [u8; MAX_HASH] {
        let params = self.params;
        let n = params.n();
        let w = params.w();
        let top = (1usize << w) - 1;
        let Qck = digest_with_checksum(params, Q);
        let prefix = leaf_prefix(params, I, q);
        let mut kh = prefix.clone();
        kh.update(&D_PBLC);
        let mut tmp = [0u8; MAX_HASH];
        for i in 0..params.p() {
            let a = coef(&Qck, i, w) as usize;
            tmp[..n].copy_from_slice(self.y(i));
            chain(&prefix, i as u16, a, top, &mut tmp[..]);
            kh.update(&tmp[..n]);
        }
        tmp.zeroize();
        let mut Kc = [0u8; MAX_HASH];
        kh.finalize_into(&mut Kc);
        Kc
    }

    /// Encoded length (in bytes).
    pub fn encoded_len(&self) -> usize {
        self.params.signature_len()
    }

    pub(crate) fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.params.type_id().to_be_bytes());
        buf.extend_from_slice(&self.C);
        buf.extend_from_slice(&self.y);
    }

    /// Encode as `u32(type) || C || y[0] || ... || y[p-1]`.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut buf);
        buf
    }

    pub(crate) fn read_from(r: &mut Reader<'_>) -> Result<Self> {
        let params = LmOtsParameters::from_type_id(r.u32()?)?;
        let n = params.n();
        let C = r.bytes(n)?.to_vec();
        let y = r.bytes(params.p() * n)?.to_vec();
        Ok(Self { params, C, y })
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut r = Reader::new(buf);
        let sig = Self::read_from(&mut r)?;
        r.finish()?;
        Ok(sig)
    }
}
