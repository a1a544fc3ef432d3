//! Parameter catalog for LM-OTS and LMS.
//!
//! Type codes follow RFC 8554 (SHA-256 with 256-bit outputs) and NIST
//! SP 800-208 / draft-fluhrer-lms-more-parm-sets (SHA-256 truncated to
//! 192 bits, SHAKE256 with 256-bit and 192-bit outputs). Unknown codes
//! are rejected with `Error::InvalidParameter`.

use crate::{Error, Result};

/// Digest algorithm used by a parameter set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHA-256.
    Sha256,
    /// SHA-256, output truncated to 192 bits.
    Sha256_192,
    /// SHAKE256 with a 256-bit output.
    Shake256,
    /// SHAKE256 with a 192-bit output.
    Shake256_192,
}

impl HashAlgorithm {

    /// Output length (in bytes).
    pub const fn output_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 | HashAlgorithm::Shake256 => 32,
            HashAlgorithm::Sha256_192 | HashAlgorithm::Shake256_192 => 24,
        }
    }

    // Code groups are laid out in the same order for LM-OTS (groups of
    // four Winternitz widths) and LMS (groups of five heights).
    const fn from_group(g: u32) -> Self {
        match g {
            0 => HashAlgorithm::Sha256,
            1 => HashAlgorithm::Sha256_192,
            2 => HashAlgorithm::Shake256,
            _ => HashAlgorithm::Shake256_192,
        }
    }
}

/// LM-OTS parameter sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum LmOtsParameters {
    Sha256N32W1 = 1,
    Sha256N32W2 = 2,
    Sha256N32W4 = 3,
    Sha256N32W8 = 4,
    Sha256N24W1 = 5,
    Sha256N24W2 = 6,
    Sha256N24W4 = 7,
    Sha256N24W8 = 8,
    ShakeN32W1 = 9,
    ShakeN32W2 = 10,
    ShakeN32W4 = 11,
    ShakeN32W8 = 12,
    ShakeN24W1 = 13,
    ShakeN24W2 = 14,
    ShakeN24W4 = 15,
    ShakeN24W8 = 16,
}

impl LmOtsParameters {

    /// All supported LM-OTS parameter sets, by increasing type code.
    pub const ALL: [Self; 16] = [
        Self::Sha256N32W1, Self::Sha256N32W2, Self::Sha256N32W4, Self::Sha256N32W8,
        Self::Sha256N24W1, Self::Sha256N24W2, Self::Sha256N24W4, Self::Sha256N24W8,
        Self::ShakeN32W1, Self::ShakeN32W2, Self::ShakeN32W4, Self::ShakeN32W8,
        Self::ShakeN24W1, Self::ShakeN24W2, Self::ShakeN24W4, Self::ShakeN24W8,
    ];

    /// Look up a parameter set by its type code.
    pub fn from_type_id(id: u32) -> Result<Self> {
        Self::ALL.iter().copied().find(|ps| ps.type_id() == id)
            .ok_or(Error::InvalidParameter("unknown LM-OTS type"))
    }

    /// Numeric type code (as used on the wire).
    pub const fn type_id(self) -> u32 {
        self as u32
    }

    /// Digest algorithm.
    pub const fn hash(self) -> HashAlgorithm {
        HashAlgorithm::from_group((self.type_id() - 1) / 4)
    }

    /// Hash output length `n` (in bytes).
    pub const fn n(self) -> usize {
        self.hash().output_len()
    }

    /// Winternitz width `w` (in bits).
    pub const fn w(self) -> usize {
        1usize << ((self.type_id() - 1) % 4)
    }

    /// Number of hash chains `p`.
    pub const fn p(self) -> usize {
        let (p, _) = p_ls(self.n(), self.w());
        p
    }

    /// Left shift `ls` applied to the checksum.
    pub const fn ls(self) -> usize {
        let (_, ls) = p_ls(self.n(), self.w());
        ls
    }

    /// Encoded length of an LM-OTS signature: `u32 || C || y[p]`.
    pub const fn signature_len(self) -> usize {
        4 + self.n() * (self.p() + 1)
    }
}

// RFC 8554, appendix B: u = ceil(8*n/w), v = floor(lg((2^w-1)*u)/w) + 1,
// p = u + v, ls = 16 - v*w.
const fn p_ls(n: usize, w: usize) -> (usize, usize) {
    let u = (8 * n + w - 1) / w;
    let x = ((1usize << w) - 1) * u;
    let (x0, t0) = if x > 0xFFFF { (x >> 16, 16) } else { (x, 0) };
    let (x1, t1) = if x0 > 0xFF { (x0 >> 8, 8) } else { (x0, 0) };
    let (x2, t2) = if x1 > 0x0F { (x1 >> 4, 4) } else { (x1, 0) };
    let (x3, t3) = if x2 > 0x03 { (x2 >> 2, 2) } else { (x2, 0) };
    let t4 = if x3 > 0x01 { 1 } else { 0 };
    let lg = t0 + t1 + t2 + t3 + t4;
    let v = (lg + w) / w;
    (u + v, 16 - (v * w))
}

/// LMS parameter sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum LmsSigParameters {
    Sha256M32H5 = 5,
    Sha256M32H10 = 6,
    Sha256M32H15 = 7,
    Sha256M32H20 = 8,
    Sha256M32H25 = 9,
    Sha256M24H5 = 10,
    Sha256M24H10 = 11,
    Sha256M24H15 = 12,
    Sha256M24H20 = 13,
    Sha256M24H25 = 14,
    ShakeM32H5 = 15,
    ShakeM32H10 = 16,
    ShakeM32H15 = 17,
    ShakeM32H20 = 18,
    ShakeM32H25 = 19,
    ShakeM24H5 = 20,
    ShakeM24H10 = 21,
    ShakeM24H15 = 22,
    ShakeM24H20 = 23,
    ShakeM24H25 = 24,
}

impl LmsSigParameters {

    /// All supported LMS parameter sets, by increasing type code.
    pub const ALL: [Self; 20] = [
        Self::Sha256M32H5, Self::Sha256M32H10, Self::Sha256M32H15,
        Self::Sha256M32H20, Self::Sha256M32H25,
        Self::Sha256M24H5, Self::Sha256M24H10, Self::Sha256M24H15,
        Self::Sha256M24H20, Self::Sha256M24H25,
        Self::ShakeM32H5, Self::ShakeM32H10, Self::ShakeM32H15,
        Self::ShakeM32H20, Self::ShakeM32H25,
        Self::ShakeM24H5, Self::ShakeM24H10, Self::ShakeM24H15,
        Self::ShakeM24H20, Self::ShakeM24H25,
    ];

    /// Look up a parameter set by its type code.
    pub fn from_type_id(id: u32) -> Result<Self> {
        Self::ALL.iter().copied().find(|ps| ps.type_id() == id)
            .ok_or(Error::InvalidParameter("unknown LMS type"))
    }

    /// Numeric type code (as used on the wire).
    pub const fn type_id(self) -> u32 {
        self as u32
    }

    /// Digest algorithm.
    pub const fn hash(self) -> HashAlgorithm {
        HashAlgorithm::from_group((self.type_id() - 5) / 5)
    }

    /// Hash output length `m` (in bytes).
    pub const fn m(self) -> usize {
        self.hash().output_len()
    }

    /// Tree height `h`.
    pub const fn h(self) -> usize {
        5 * (((self.type_id() - 5) % 5) as usize + 1)
    }

    /// Number of leaves (`2^h`).
    pub const fn leaves(self) -> u32 {
        1u32 << self.h()
    }
}

/// Configuration of one tree: an LMS parameter set and the LM-OTS
/// parameter set of its leaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LmsParameters {
    pub sig: LmsSigParameters,
    pub ots: LmOtsParameters,
}

impl LmsParameters {

    pub const fn new(sig: LmsSigParameters, ots: LmOtsParameters) -> Self {
        Self { sig, ots }
    }

    /// Check that the tree and its one-time keys use the same digest
    /// (hence `n == m`), as SP 800-208 requires.
    pub fn check(self) -> Result<()> {
        if self.sig.hash() != self.ots.hash() {
            return Err(Error::InvalidParameter("LMS and LM-OTS hash mismatch"));
        }
        Ok(())
    }

    /// Encoded length of an LMS public key.
    pub const fn public_key_len(self) -> usize {
        4 + 4 + 16 + self.sig.m()
    }

    /// Encoded length of an LMS signature.
    pub const fn signature_len(self) -> usize {
        4 + self.ots.signature_len() + 4 + self.sig.h() * self.sig.m()
    }
}
