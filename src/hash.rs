//! Digest provider keyed by `HashAlgorithm`.
//!
//! All hash computations of LM-OTS and LMS go through `Hasher`, which
//! dispatches to SHA-256 (`sha2`) or SHAKE256 (`sha3`) and truncates the
//! output to the parameter set length.

use sha2::Sha256;
use sha3::Shake256;
use sha3::digest::{ExtendableOutput, Update, XofReader};

use crate::params::HashAlgorithm;

/// Largest `n` / `m` of all supported parameter sets.
pub(crate) const MAX_HASH: usize = 32;

// Domain separators (RFC 8554, section 3.3).
pub(crate) const D_PBLC: [u8; 2] = [ 0x80, 0x80, ];
pub(crate) const D_MESG: [u8; 2] = [ 0x81, 0x81, ];
pub(crate) const D_LEAF: [u8; 2] = [ 0x82, 0x82, ];
pub(crate) const D_INTR: [u8; 2] = [ 0x83, 0x83, ];

/// A running hash computation. Cloning captures the current state, which
/// lets callers hash a common prefix once.
#[derive(Clone)]
pub(crate) enum Hasher {
    Sha2(Sha256, usize),
    Shake(Shake256, usize),
}

impl Hasher {

    pub(crate) fn new(alg: HashAlgorithm) -> Self {
        let len = alg.output_len();
        match alg {
            HashAlgorithm::Sha256 | HashAlgorithm::Sha256_192 =>
                Hasher::Sha2(<Sha256 as sha2::Digest>::new(), len),
            HashAlgorithm::Shake256 | HashAlgorithm::Shake256_192 =>
                Hasher::Shake(Shake256::default(), len),
        }
    }

    /// Output length (in bytes).
    pub(crate) fn output_len(&self) -> usize {
        match self {
            Hasher::Sha2(_, len) | Hasher::Shake(_, len) => *len,
        }
    }

    pub(crate) fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha2(sh, _) => sha2::Digest::update(sh, data),
            Hasher::Shake(sh, _) => Update::update(sh, data),
        }
    }

    /// Write the output into the first `output_len()` bytes of `out`.
    pub(crate) fn finalize_into(self, out: &mut [u8]) {
        match self {
            Hasher::Sha2(sh, len) => {
                out[..len].copy_from_slice(&sha2::Digest::finalize(sh)[..len]);
            }
            Hasher::Shake(sh, len) => {
                sh.finalize_xof().read(&mut out[..len]);
            }
        }
    }
}
