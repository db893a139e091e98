//! Acceptance checks for opponent-countersigned board snapshots.
//!
//! A player who has been playing off-chain submits the last position the
//! opponent signed together with their own next move. The signature binds
//! the snapshot to one game: `keccak256(xdr(state) || game_id)`.

use soroban_sdk::xdr::ToXdr;
use soroban_sdk::{Address, Bytes, BytesN, Env};

use crate::types::BoardState;
use crate::{SignatureVerifierClient, WagerError};

pub fn state_message(env: &Env, game_id: &BytesN<32>, state: &BoardState) -> BytesN<32> {
    let mut preimage = state.clone().to_xdr(env);
    preimage.append(&Bytes::from_array(env, &game_id.to_array()));
    env.crypto().keccak256(&preimage).into()
}

/// The verifier traps on a malformed or forged signature, so any failed
/// invocation counts as a bad signature, the same as a `false` answer.
pub fn verify_countersignature(
    env: &Env,
    verifier: &Address,
    signer: &Address,
    message: &BytesN<32>,
    signature: &BytesN<64>,
) -> Result<(), WagerError> {
    let client = SignatureVerifierClient::new(env, verifier);
    match client.try_verify(signer, message, signature) {
        Ok(Ok(true)) => Ok(()),
        _ => Err(WagerError::BadSignature),
    }
}

/// Ties are accepted so a player can catch up to the same position.
pub fn ensure_fresh(stored: &BoardState, incoming: &BoardState) -> Result<(), WagerError> {
    if incoming.move_count < stored.move_count {
        return Err(WagerError::StaleState);
    }
    Ok(())
}
