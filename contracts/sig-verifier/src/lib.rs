#![no_std]

//! # Ed25519 Signature Verifier
//!
//! Verifies that a player signed a 32-byte message hash. Players register
//! the ed25519 public key they sign game snapshots with; game contracts then
//! call `verify(signer, message_hash, signature)`.
//!
//! ## Result semantics
//! - `true`: the signature is valid for the signer's registered key.
//! - `false`: the signer has no registered key (`EvVerifyFailed` is published).
//! - invocation failure: the signature does not verify. The host aborts in
//!   `ed25519_verify`, so callers use `try_verify` and treat any failure as a
//!   rejection.

use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, Address, Bytes, BytesN,
    Env,
};

// ═══════════════════════════════════════════════════════════════════════════════
//  Error codes
// ═══════════════════════════════════════════════════════════════════════════════

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum SigVerifyError {
    KeyNotRegistered = 1,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Events
// ═══════════════════════════════════════════════════════════════════════════════

#[contractevent]
pub struct EvKeyRegistered {
    pub player: Address,
    pub public_key: BytesN<32>,
}

#[contractevent]
pub struct EvVerifyFailed {
    pub signer: Address,
    pub reason: u32,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Storage
// ═══════════════════════════════════════════════════════════════════════════════

#[contracttype]
#[derive(Clone)]
enum DataKey {
    Key(Address),
}

// Ledger rate is approximately 5 seconds per ledger on Stellar
const LEDGER_RATE_SECS: u32 = 5;

// Keys stay registered for a year of inactivity
const KEY_TTL_SECONDS: u32 = 365 * 24 * 60 * 60;
const KEY_TTL_LEDGERS: u32 = KEY_TTL_SECONDS / LEDGER_RATE_SECS; // 6,307,200 ledgers

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract
// ═══════════════════════════════════════════════════════════════════════════════

#[contract]
pub struct Ed25519Verifier;

#[contractimpl]
impl Ed25519Verifier {
    /// Register (or rotate) the caller's signing key.
    pub fn register_key(env: Env, player: Address, public_key: BytesN<32>) {
        player.require_auth();

        let key = DataKey::Key(player.clone());
        env.storage().persistent().set(&key, &public_key);
        env.storage()
            .persistent()
            .extend_ttl(&key, KEY_TTL_LEDGERS, KEY_TTL_LEDGERS);

        EvKeyRegistered { player, public_key }.publish(&env);
    }

    pub fn get_key(env: Env, player: Address) -> Result<BytesN<32>, SigVerifyError> {
        env.storage()
            .persistent()
            .get(&DataKey::Key(player))
            .ok_or(SigVerifyError::KeyNotRegistered)
    }

    pub fn verify(
        env: Env,
        signer: Address,
        message_hash: BytesN<32>,
        signature: BytesN<64>,
    ) -> bool {
        let Some(public_key) = env
            .storage()
            .persistent()
            .get::<DataKey, BytesN<32>>(&DataKey::Key(signer.clone()))
        else {
            EvVerifyFailed {
                signer,
                reason: SigVerifyError::KeyNotRegistered as u32,
            }
            .publish(&env);
            return false;
        };

        let message = Bytes::from_array(&env, &message_hash.to_array());
        env.crypto().ed25519_verify(&public_key, &message, &signature);
        true
    }
}
