//! LMS and HSS stateful hash-based signatures (RFC 8554).
//!
//! This library implements the Leighton-Micali one-time signatures
//! (LM-OTS, module `lm_ots`), the Merkle tree signatures built on them
//! (LMS, module `lms`), and the hierarchical composition of LMS trees
//! (HSS, module `hss`). All parameter sets of RFC 8554 and NIST SP 800-208
//! are supported: SHA-256 with 256-bit and 192-bit outputs, and SHAKE256
//! with 256-bit and 192-bit outputs, tree heights 5 to 25, and Winternitz
//! widths 1, 2, 4 and 8 (module `params`).
//!
//! # Statefulness
//!
//! LMS and HSS private keys are _stateful_: every signature consumes one
//! leaf (one index) and the key must never produce two signatures with the
//! same leaf, otherwise the corresponding one-time key is revealed and
//! forgeries become possible. This library advances the index before any
//! signature is computed, and never hands out the same one-time key
//! twice. It cannot, however, protect against a private key state being
//! restored from an old copy. Callers must persist the new state (as
//! returned by `encode()`) before any signature is released.
//!
//! Signing is deterministic: the per-signature randomizer is derived from
//! the private seed. Signing again from a restored state thus yields the
//! same signatures for the same messages, but different messages at the
//! same index still break security.
//!
//! # Sharding
//!
//! `extract_key_shard()` carves a disjoint index range out of a private
//! key, to be used by an independent signer (another process or
//! machine). The parent skips that range. Once a shard is extracted, the
//! parent state from before the extraction must be discarded: using both
//! the shard and an older copy of the parent reuses one-time keys, and
//! nothing in the key data can detect it.
//!
//! Within a single process, the `sync::SharedKey` wrapper (feature `std`)
//! serializes all index updates of a key shared between threads.
//!
//! # Usage
//!
//! The library is `no_std` but requires `alloc`. By default, it compiles
//! against the standard library, which adds the `sync` module and the
//! `std::error::Error` implementation of `Error`.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub(crate) use alloc::vec::Vec;

pub use rand_core::{CryptoRng, RngCore, Error as RngError};

mod codec;
mod hash;

pub mod context;
pub mod error;
pub mod hss;
pub mod lm_ots;
pub mod lms;
pub mod params;
pub mod seed;
pub mod traits;

#[cfg(feature = "std")]
pub mod sync;

#[cfg(test)]
mod kat;

pub use context::{HssSigningContext, HssVerifyingContext, LmsSigningContext, LmsVerifyingContext};
pub use error::{Error, Result};
pub use hss::{HssPrivateKey, HssPublicKey, HssSignature, SignedPublicKey};
pub use lm_ots::{LmOtsPrivateKey, LmOtsPublicKey, LmOtsSignature};
pub use lms::{LmsPrivateKey, LmsPublicKey, LmsSignature};
pub use params::{HashAlgorithm, LmOtsParameters, LmsParameters, LmsSigParameters};
pub use traits::StatefulSigner;
