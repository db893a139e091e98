//! Listing indices over games.
//!
//! Each list is a singly linked chain stored one node per storage entry:
//! `Head(list) -> id` and `Next(list, id) -> id`. A missing `Next` entry
//! terminates the chain, so no game id is ever reserved as an end marker.
//! Insertion is always at the head; removal scans for the predecessor and
//! splices, keeping the remaining order intact.

use soroban_sdk::{contracttype, Address, BytesN, Env, Vec};

use crate::INDEX_TTL_LEDGERS;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GameList {
    /// Games waiting for a second player.
    Open,
    /// Games a given address takes part in.
    Player(Address),
}

#[contracttype]
#[derive(Clone)]
enum IndexKey {
    Head(GameList),
    Next(GameList, BytesN<32>),
}

pub fn add_open(env: &Env, game_id: &BytesN<32>) {
    push_front(env, GameList::Open, game_id);
}

pub fn remove_open(env: &Env, game_id: &BytesN<32>) -> bool {
    unlink(env, GameList::Open, game_id)
}

pub fn add_to_player(env: &Env, player: &Address, game_id: &BytesN<32>) {
    push_front(env, GameList::Player(player.clone()), game_id);
}

pub fn remove_from_player(env: &Env, player: &Address, game_id: &BytesN<32>) -> bool {
    unlink(env, GameList::Player(player.clone()), game_id)
}

pub fn list_open(env: &Env) -> Vec<BytesN<32>> {
    collect(env, GameList::Open)
}

pub fn list_for_player(env: &Env, player: &Address) -> Vec<BytesN<32>> {
    collect(env, GameList::Player(player.clone()))
}

fn push_front(env: &Env, list: GameList, game_id: &BytesN<32>) {
    let head_key = IndexKey::Head(list.clone());
    let current_head: Option<BytesN<32>> = env.storage().persistent().get(&head_key);
    if let Some(head) = current_head {
        write_link(env, &IndexKey::Next(list, game_id.clone()), &head);
    }
    write_link(env, &head_key, game_id);
}

/// Returns false when `game_id` is not in the list; nothing is touched then.
fn unlink(env: &Env, list: GameList, game_id: &BytesN<32>) -> bool {
    let store = env.storage().persistent();
    let head_key = IndexKey::Head(list.clone());
    let Some(head) = read_link(env, &head_key) else {
        return false;
    };

    let removed_key = IndexKey::Next(list.clone(), game_id.clone());
    let successor: Option<BytesN<32>> = store.get(&removed_key);

    if head == *game_id {
        relink(env, &head_key, successor);
        store.remove(&removed_key);
        return true;
    }

    let mut prev = head;
    loop {
        let prev_key = IndexKey::Next(list.clone(), prev.clone());
        let Some(current) = read_link(env, &prev_key) else {
            return false;
        };
        if current == *game_id {
            relink(env, &prev_key, successor);
            store.remove(&removed_key);
            return true;
        }
        prev = current;
    }
}

fn collect(env: &Env, list: GameList) -> Vec<BytesN<32>> {
    let mut ids = Vec::new(env);
    let mut key = IndexKey::Head(list.clone());
    while let Some(id) = read_link(env, &key) {
        key = IndexKey::Next(list.clone(), id.clone());
        ids.push_back(id);
    }
    ids
}

/// Refreshes the links `game_id` owns in every list that can hold it.
pub fn keep_alive(env: &Env, game_id: &BytesN<32>, players: &[Option<Address>]) {
    touch(env, &IndexKey::Head(GameList::Open));
    touch(env, &IndexKey::Next(GameList::Open, game_id.clone()));
    for player in players.iter().flatten() {
        let list = GameList::Player(player.clone());
        touch(env, &IndexKey::Head(list.clone()));
        touch(env, &IndexKey::Next(list, game_id.clone()));
    }
}

/// Every link walked past gets its TTL refreshed, so a chain stays whole
/// as long as it is read.
fn read_link(env: &Env, key: &IndexKey) -> Option<BytesN<32>> {
    let target = env.storage().persistent().get(key)?;
    env.storage()
        .persistent()
        .extend_ttl(key, INDEX_TTL_LEDGERS, INDEX_TTL_LEDGERS);
    Some(target)
}

fn touch(env: &Env, key: &IndexKey) {
    let store = env.storage().persistent();
    if store.has(key) {
        store.extend_ttl(key, INDEX_TTL_LEDGERS, INDEX_TTL_LEDGERS);
    }
}

fn relink(env: &Env, key: &IndexKey, target: Option<BytesN<32>>) {
    match target {
        Some(id) => write_link(env, key, &id),
        None => env.storage().persistent().remove(key),
    }
}

fn write_link(env: &Env, key: &IndexKey, target: &BytesN<32>) {
    env.storage().persistent().set(key, target);
    env.storage()
        .persistent()
        .extend_ttl(key, INDEX_TTL_LEDGERS, INDEX_TTL_LEDGERS);
}
