//! # Shared Types Crate
//!
//! Primitive types used across the Authority-Chain workspace.
//!
//! ## Contents
//!
//! - **entities**: `Hash`, `Address`, `Signature` aliases and the `U256`
//!   re-export from `primitive-types`.
//! - **crypto**: Keccak-256 hashing and secp256k1 signer recovery.
//! - **errors**: errors raised by the crypto helpers.

pub mod crypto;
pub mod entities;
pub mod errors;

pub use crypto::*;
pub use entities::*;
pub use errors::*;
