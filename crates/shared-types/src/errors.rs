//! # Error Types
//!
//! Errors raised by the shared crypto helpers.

use thiserror::Error;

/// Errors that can occur while signing or recovering a signer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature is not 65 bytes or r/s do not form a valid scalar pair.
    #[error("Invalid signature format")]
    InvalidFormat,

    /// Invalid recovery ID (v must be 0, 1, 27, or 28)
    #[error("Invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    /// Failed to recover public key from signature
    #[error("Failed to recover public key")]
    RecoveryFailed,

    /// The signing backend rejected the message hash.
    #[error("Signing failed")]
    SigningFailed,
}
