//! Error type shared by all LMS / HSS operations.
//!
//! Exhaustion is kept apart from every other failure: it is the normal
//! end of life of a stateful key and calls for provisioning a new key (or
//! a new shard), whereas the other variants denote malformed input, a
//! programming error, or an attack.

/// Result type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

/// Errors reported by key generation, signing, verification and decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {

    /// The private key (or shard) has no unused one-time key left.
    #[error("private key exhausted")]
    KeyExhausted,

    /// Unknown type identifier, bad identifier/seed length, mismatched
    /// parameter sets, or an out-of-range argument.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// Malformed encoded value (truncated input, bad version tag, trailing
    /// bytes, inconsistent counters).
    #[error("decode error: {0}")]
    Decode(&'static str),

    /// A well-formed signature does not match the message and public key.
    #[error("signature verification failed")]
    VerificationFailed,

    /// The key object cannot be used in its current state.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// An output buffer is shorter than the digest output.
    #[error("buffer too small: need {need}, got {got}")]
    BufferTooSmall {
        /// Required length in bytes.
        need: usize,
        /// Provided length in bytes.
        got: usize,
    },
}
