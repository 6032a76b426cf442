//! # Hashing and Signer Recovery
//!
//! Keccak-256 and recoverable secp256k1 signatures. Headers and
//! transactions never carry their signer explicitly; it is always recovered
//! from the signature over the signing hash.

use crate::entities::{Address, Hash, Signature};
use crate::errors::SignatureError;
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use sha3::{Digest, Keccak256};

pub use k256::ecdsa::SigningKey;

/// Keccak256 hash function.
pub fn keccak256(data: &[u8]) -> Hash {
    keccak256_concat(&[data])
}

/// Keccak256 over the concatenation of `parts`.
pub fn keccak256_concat(parts: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Recover the signer address from a 65-byte `r || s || v` signature.
///
/// Valid v values: 0, 1, 27, 28
pub fn recover_address(message_hash: &Hash, signature: &[u8]) -> Result<Address, SignatureError> {
    if signature.len() != 65 {
        return Err(SignatureError::InvalidFormat);
    }

    let recovery_id = parse_recovery_id(signature[64])?;
    let sig =
        EcdsaSignature::from_slice(&signature[..64]).map_err(|_| SignatureError::InvalidFormat)?;

    let recovered_key = VerifyingKey::recover_from_prehash(message_hash, &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;

    Ok(address_from_pubkey(&recovered_key))
}

/// Derive Ethereum address from public key.
pub fn address_from_pubkey(public_key: &VerifyingKey) -> Address {
    let pubkey_bytes = public_key.to_encoded_point(false);
    let pubkey_slice = pubkey_bytes.as_bytes();

    // Keccak256 hash of public key (without 0x04 prefix)
    let hash = keccak256(&pubkey_slice[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

/// Address controlled by a signing key.
pub fn address_of(key: &SigningKey) -> Address {
    address_from_pubkey(key.verifying_key())
}

/// Sign a 32-byte message hash, producing `r || s || v` with `v` in {0, 1}.
pub fn sign_hash(message_hash: &Hash, key: &SigningKey) -> Result<Signature, SignatureError> {
    let (sig, recid) = key
        .sign_prehash_recoverable(message_hash)
        .map_err(|_| SignatureError::SigningFailed)?;

    let mut signature = [0u8; 65];
    signature[..64].copy_from_slice(&sig.to_bytes());
    signature[64] = recid.to_byte();
    Ok(signature)
}

fn parse_recovery_id(v: u8) -> Result<RecoveryId, SignatureError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };

    RecoveryId::try_from(id).map_err(|_| SignatureError::InvalidRecoveryId(v))
}
