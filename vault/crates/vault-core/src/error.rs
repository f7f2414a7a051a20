use thiserror::Error;

/// Canonical error type exposed by the core primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The recovery id is not one of 0, 1, 27 or 28.
    #[error("invalid signature recovery id {0}")]
    InvalidRecoveryId(u8),

    /// `(r, s)` do not form a recoverable secp256k1 signature.
    #[error("unrecoverable signature: {0}")]
    Unrecoverable(String),

    /// The local signer refused to produce a signature.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Amount string could not be parsed.
    #[error("invalid amount {input:?}: {reason}")]
    InvalidAmount { input: String, reason: String },
}
