//! Proof-of-burn pre-image commitment.
//!
//! A contributor claims a burn by putting `0x17 0x01 || HASH160(name)` into
//! the OP_RETURN output of the burn transaction, where `HASH160` is
//! `RIPEMD160(SHA256(x))` and `name` is the UTF-8 contributor name. Anybody
//! can re-derive the binding from public data.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::constants::{PROOF_OF_BURN_HASH_LEN, PROOF_OF_BURN_OP_RETURN_PREFIX};

/// `RIPEMD160(SHA256(pre_image))`.
pub fn hash(pre_image: &[u8]) -> [u8; PROOF_OF_BURN_HASH_LEN] {
    let sha = Sha256::digest(pre_image);
    Ripemd160::digest(sha).into()
}

/// Commitment hash for a contributor name.
pub fn name_hash(name: &str) -> [u8; PROOF_OF_BURN_HASH_LEN] {
    hash(name.as_bytes())
}

/// Full OP_RETURN data a proof-of-burn tx for `pre_image` carries.
pub fn op_return_data(pre_image: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(PROOF_OF_BURN_OP_RETURN_PREFIX.len() + PROOF_OF_BURN_HASH_LEN);
    data.extend_from_slice(&PROOF_OF_BURN_OP_RETURN_PREFIX);
    data.extend_from_slice(&hash(pre_image));
    data
}

/// Extract the committed hash from proof-of-burn OP_RETURN data.
///
/// Returns `None` if the data is not exactly prefix plus hash.
pub fn hash_from_op_return_data(data: &[u8]) -> Option<[u8; PROOF_OF_BURN_HASH_LEN]> {
    let prefix_len = PROOF_OF_BURN_OP_RETURN_PREFIX.len();
    if data.len() != prefix_len + PROOF_OF_BURN_HASH_LEN {
        return None;
    }
    data[prefix_len..].try_into().ok()
}
