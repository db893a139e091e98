#![no_std]

//! # Leaderboard Contract
//!
//! ELO ratings and win/loss/draw records for wager-chess players.
//! Game contracts that the admin authorized report finished games through
//! `record_result`; anyone can read scores.
//!
//! ## Features
//! - ELO rating (K=32 provisional, K=16 after 30 games)
//! - Win/loss/draw counters and win streaks
//! - Top-N query sorted by rating
//! - `get_score` defaulting to the starting rating for unknown players

use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, Address, Env, Vec,
};

// ═══════════════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════════════

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayerRecord {
    pub address: Address,
    pub rating: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub games: u32,
    pub streak: u32,
    pub best_streak: u32,
    pub last_game_at: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
enum DataKey {
    Admin,
    Reporters,
    Record(Address),
    /// Addresses sorted by rating, highest first
    Ranking,
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum LeaderboardError {
    AdminNotSet = 1,
    ReporterNotAuthorized = 2,
    SelfPlay = 3,
    WinnerNotInGame = 4,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Events
// ═══════════════════════════════════════════════════════════════════════════════

/// `winner` is `None` for a draw.
#[contractevent]
pub struct EvResultRecorded {
    pub player_a: Address,
    pub player_b: Address,
    pub winner: Option<Address>,
    pub rating_a: u32,
    pub rating_b: u32,
}

#[contractevent]
pub struct EvPlayerRegistered {
    pub player: Address,
    pub rating: u32,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Constants
// ═══════════════════════════════════════════════════════════════════════════════

pub const STARTING_RATING: u32 = 1200;
const RATING_FLOOR: u32 = 100;
const K_PROVISIONAL: i64 = 32;
const K_ESTABLISHED: i64 = 16;
const PROVISIONAL_GAMES: u32 = 30;
const MAX_RANKED: u32 = 50;

// Ledger rate is approximately 5 seconds per ledger on Stellar
const LEDGER_RATE_SECS: u32 = 5;

// Player records outlive idle periods of up to 120 days
const TTL_SECONDS: u32 = 120 * 24 * 60 * 60;
const TTL_LEDGERS: u32 = TTL_SECONDS / LEDGER_RATE_SECS; // 2,073,600 ledgers

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract
// ═══════════════════════════════════════════════════════════════════════════════

#[contract]
pub struct Leaderboard;

#[contractimpl]
impl Leaderboard {
    pub fn __constructor(env: Env, admin: Address) {
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage()
            .instance()
            .set(&DataKey::Reporters, &Vec::<Address>::new(&env));
        env.storage()
            .instance()
            .set(&DataKey::Ranking, &Vec::<Address>::new(&env));
    }

    /// Admin-only: allow `reporter` (a game contract) to record results.
    pub fn authorize_reporter(env: Env, reporter: Address) -> Result<(), LeaderboardError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();

        let mut reporters = Self::reporters(&env);
        if !reporters.contains(&reporter) {
            reporters.push_back(reporter);
            env.storage().instance().set(&DataKey::Reporters, &reporters);
        }
        Ok(())
    }

    pub fn revoke_reporter(env: Env, reporter: Address) -> Result<(), LeaderboardError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();

        let mut reporters = Self::reporters(&env);
        if let Some(idx) = reporters.first_index_of(&reporter) {
            reporters.remove(idx);
            env.storage().instance().set(&DataKey::Reporters, &reporters);
        }
        Ok(())
    }

    /// Record a finished game between `player_a` and `player_b`.
    /// `winner` is `None` for a draw. The reporter must be the admin or an
    /// authorized game contract.
    pub fn record_result(
        env: Env,
        reporter: Address,
        player_a: Address,
        player_b: Address,
        winner: Option<Address>,
    ) -> Result<(), LeaderboardError> {
        reporter.require_auth();
        if reporter != Self::load_admin(&env)? && !Self::reporters(&env).contains(&reporter) {
            return Err(LeaderboardError::ReporterNotAuthorized);
        }
        if player_a == player_b {
            return Err(LeaderboardError::SelfPlay);
        }

        // Score for player_a, in hundredths: 100 win, 50 draw, 0 loss
        let score_a: i64 = match &winner {
            None => 50,
            Some(w) if *w == player_a => 100,
            Some(w) if *w == player_b => 0,
            Some(_) => return Err(LeaderboardError::WinnerNotInGame),
        };

        let now = env.ledger().timestamp();
        let mut a = Self::load_or_register(&env, &player_a, now);
        let mut b = Self::load_or_register(&env, &player_b, now);

        let new_a = next_rating(a.rating, b.rating, score_a, k_factor(a.games));
        let new_b = next_rating(b.rating, a.rating, 100 - score_a, k_factor(b.games));

        a.rating = new_a;
        b.rating = new_b;
        match score_a {
            100 => tally_win_loss(&mut a, &mut b),
            0 => tally_win_loss(&mut b, &mut a),
            _ => {
                for record in [&mut a, &mut b] {
                    record.draws += 1;
                    record.streak = 0;
                }
            }
        }
        for record in [&mut a, &mut b] {
            record.games += 1;
            record.last_game_at = now;
        }

        Self::save(&env, &a);
        Self::save(&env, &b);
        Self::rerank(&env, &player_a, new_a);
        Self::rerank(&env, &player_b, new_b);

        EvResultRecorded {
            player_a,
            player_b,
            winner,
            rating_a: new_a,
            rating_b: new_b,
        }
        .publish(&env);
        Ok(())
    }

    /// Current rating; players who never finished a game sit at the start.
    pub fn get_score(env: Env, player: Address) -> u32 {
        Self::load(&env, &player)
            .map(|r| r.rating)
            .unwrap_or(STARTING_RATING)
    }

    pub fn get_player(env: Env, player: Address) -> Option<PlayerRecord> {
        Self::load(&env, &player)
    }

    /// Up to `limit` records, highest rating first.
    pub fn get_top_players(env: Env, limit: u32) -> Vec<PlayerRecord> {
        let mut out = Vec::new(&env);
        for addr in Self::ranking(&env).iter().take(limit as usize) {
            if let Some(record) = Self::load(&env, &addr) {
                out.push_back(record);
            }
        }
        out
    }

    pub fn total_players(env: Env) -> u32 {
        Self::ranking(&env).len()
    }

    pub fn get_admin(env: Env) -> Result<Address, LeaderboardError> {
        Self::load_admin(&env)
    }

    // ─── Internal helpers ──────────────────────────────────────────────────

    fn load_admin(env: &Env) -> Result<Address, LeaderboardError> {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(LeaderboardError::AdminNotSet)
    }

    fn reporters(env: &Env) -> Vec<Address> {
        env.storage()
            .instance()
            .get(&DataKey::Reporters)
            .unwrap_or(Vec::new(env))
    }

    fn ranking(env: &Env) -> Vec<Address> {
        env.storage()
            .instance()
            .get(&DataKey::Ranking)
            .unwrap_or(Vec::new(env))
    }

    fn load(env: &Env, player: &Address) -> Option<PlayerRecord> {
        env.storage()
            .persistent()
            .get(&DataKey::Record(player.clone()))
    }

    fn load_or_register(env: &Env, player: &Address, now: u64) -> PlayerRecord {
        if let Some(record) = Self::load(env, player) {
            return record;
        }
        EvPlayerRegistered {
            player: player.clone(),
            rating: STARTING_RATING,
        }
        .publish(env);
        PlayerRecord {
            address: player.clone(),
            rating: STARTING_RATING,
            wins: 0,
            losses: 0,
            draws: 0,
            games: 0,
            streak: 0,
            best_streak: 0,
            last_game_at: now,
        }
    }

    fn save(env: &Env, record: &PlayerRecord) {
        let key = DataKey::Record(record.address.clone());
        env.storage().persistent().set(&key, record);
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_LEDGERS, TTL_LEDGERS);
    }

    /// Re-insert `player` at its sorted position and cap the list.
    fn rerank(env: &Env, player: &Address, rating: u32) {
        let mut ranking = Self::ranking(env);
        if let Some(idx) = ranking.first_index_of(player) {
            ranking.remove(idx);
        }

        let mut at = ranking.len();
        for (i, addr) in ranking.iter().enumerate() {
            let other = Self::load(env, &addr).map(|r| r.rating).unwrap_or(0);
            if rating > other {
                at = i as u32;
                break;
            }
        }
        ranking.insert(at, player.clone());
        while ranking.len() > MAX_RANKED {
            ranking.pop_back();
        }
        env.storage().instance().set(&DataKey::Ranking, &ranking);
    }
}

fn tally_win_loss(winner: &mut PlayerRecord, loser: &mut PlayerRecord) {
    winner.wins += 1;
    winner.streak += 1;
    winner.best_streak = winner.best_streak.max(winner.streak);
    loser.losses += 1;
    loser.streak = 0;
}

fn k_factor(games: u32) -> i64 {
    if games < PROVISIONAL_GAMES {
        K_PROVISIONAL
    } else {
        K_ESTABLISHED
    }
}

/// `score` is the actual result in hundredths (100 / 50 / 0).
fn next_rating(own: u32, opponent: u32, score: i64, k: i64) -> u32 {
    let expected = expected_pct(opponent as i64 - own as i64);
    let updated = own as i64 + k * (score - expected) / 100;
    updated.max(RATING_FLOOR as i64) as u32
}

/// Expected score in percent for a rating gap of `opponent - own`,
/// a stepwise fit of 1 / (1 + 10^(gap/400)).
fn expected_pct(gap: i64) -> i64 {
    const STEPS: [(i64, i64); 10] = [
        (-400, 91),
        (-300, 85),
        (-200, 76),
        (-100, 64),
        (-50, 57),
        (0, 50),
        (50, 43),
        (100, 36),
        (200, 24),
        (300, 15),
    ];
    for (bound, pct) in STEPS {
        if gap <= bound {
            return pct;
        }
    }
    9
}

#[cfg(test)]
mod test;
