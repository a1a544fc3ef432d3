//! Pseudorandom key generation (RFC 8554, appendix A).
//!
//! Every secret value of a tree (Winternitz chain starts, message
//! randomizers, child tree seeds) is `H(I || u32(q) || u16(j) || 0xFF ||
//! SEED)` for some `(q, j)`. Identical inputs always give identical
//! outputs, which is what allows any leaf key (or any HSS level) to be
//! regenerated from the master seed alone.

use crate::hash::Hasher;
use crate::params::HashAlgorithm;
use crate::{Error, Result};

/// `j` value for the per-signature randomizer `C`.
pub(crate) const J_RANDOMIZER: u16 = 0xFFFD;

/// `j` value for the seed of a child tree (HSS); the following `j`
/// (0xFFFF) yields the child identifier.
pub(crate) const J_CHILD_SEED: u16 = 0xFFFE;

/// Seed derivation engine for one `(I, SEED)` pair.
#[allow(non_snake_case)]
#[derive(Clone, Copy)]
pub struct SeedDerive<'a> {
    I: &'a [u8; 16],
    SEED: &'a [u8],
    hash: HashAlgorithm,
    q: u32,
    j: u16,
}

impl<'a> SeedDerive<'a> {

    /// Create an engine; `q` and `j` start at zero.
    #[allow(non_snake_case)]
    pub fn new(I: &'a [u8; 16], SEED: &'a [u8], hash: HashAlgorithm) -> Self {
        Self { I, SEED, hash, q: 0, j: 0 }
    }

    pub fn q(&self) -> u32 {
        self.q
    }

    pub fn set_q(&mut self, q: u32) {
        self.q = q;
    }

    pub fn j(&self) -> u16 {
        self.j
    }

    pub fn set_j(&mut self, j: u16) {
        self.j = j;
    }

    /// Output length (in bytes).
    pub fn output_len(&self) -> usize {
        self.hash.output_len()
    }

    /// Write the derived value for the current `(q, j)` into the first
    /// `output_len()` bytes of `out`. If `increment_j` is set, `j` is
    /// incremented afterwards (wrapping).
    pub fn derive_seed(&mut self, out: &mut [u8], increment_j: bool) -> Result<()> {
        let need = self.output_len();
        if out.len() < need {
            return Err(Error::BufferTooSmall { need, got: out.len() });
        }
        self.derive_into(out, increment_j);
        Ok(())
    }

    // Caller guarantees out.len() >= output_len().
    pub(crate) fn derive_into(&mut self, out: &mut [u8], increment_j: bool) {
        let mut sh = Hasher::new(self.hash);
        sh.update(self.I);
        sh.update(&self.q.to_be_bytes());
        sh.update(&self.j.to_be_bytes());
        sh.update(&[0xFF]);
        sh.update(self.SEED);
        sh.finalize_into(out);
        if increment_j {
            self.j = self.j.wrapping_add(1);
        }
    }
}
