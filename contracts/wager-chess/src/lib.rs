#![no_std]

//! # Wager Chess
//!
//! Two-player escrowed chess without a referee. Both players stake the same
//! amount of a token into a shared pot, alternate moves under a per-move time
//! budget, and the contract decides who is owed the pot from stored state
//! alone.
//!
//! ## Game flow
//! 1. `init_game`: creator stakes, picks a turn time (≥ 5 minutes) and plays
//!    white. The game is listed as open.
//! 2. `join_game`: the second player matches the pot exactly. White moves.
//! 3. `make_move` / `submit_signed_state`: moves are checked by the rules
//!    engine contract. A signed state lets a player resume from a position
//!    the opponent attested to off-chain.
//! 4. The game ends by `surrender`, or by a claim that is either confirmed
//!    by the opponent or left uncontested for one turn window.
//! 5. `withdraw`: each side pulls what the escrow owes them.
//!
//! ## Dispute protocol
//! ```text
//!  Idle ──claim_win (waiting)──────────▶ WinClaimed
//!  Idle ──claim_timeout_started (waiting)▶ TimeoutClaimed
//!  Idle ──offer_draw (mover)───────────▶ DrawOfferByMover
//!  Idle ──offer_draw (waiting)─────────▶ DrawOfferByWaiting
//!  TimeoutClaimed ──offer_draw after 2×turn──▶ DrawOffer*
//!  DrawOfferByMover ──reject_draw (waiting)──▶ Idle
//!  any ──legal move by mover──▶ Idle
//! ```
//! Pending states are resolved by `claim_timeout_ended` once the window has
//! passed, or straight away by `confirm_game_ended` from the other side.
//!
//! ## Collaborators
//! - rules engine: initial position, move legality, check detection
//! - signature verifier: opponent countersignatures on board snapshots
//! - rating book: ELO update for every decided game

use soroban_sdk::{
    contract, contractclient, contracterror, contractevent, contractimpl, contracttype, token,
    Address, Bytes, BytesN, Env, String, Vec,
};

pub mod escrow;
pub mod rating;
pub mod registry;
pub mod signed_state;
pub mod timeout;
pub mod types;

pub use types::{BoardState, Game, TimeoutState};

use timeout::{Clock, Resolution};

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract Events
// ═══════════════════════════════════════════════════════════════════════════════

#[contractevent]
pub struct EvGameCreated {
    pub game_id: BytesN<32>,
    pub player1: Address,
    pub alias: String,
    pub turn_time: u32,
    pub pot: i128,
}

#[contractevent]
pub struct EvGameJoined {
    pub game_id: BytesN<32>,
    pub player2: Address,
    pub alias: String,
    pub pot: i128,
}

/// Emitted for every applied move, with the resulting board.
#[contractevent]
pub struct EvMoved {
    pub game_id: BytesN<32>,
    pub player: Address,
    pub from: u32,
    pub to: u32,
    pub state: BoardState,
}

/// `timeout_state` uses the numeric codes documented on [`TimeoutState`].
#[contractevent]
pub struct EvTimeoutStateChanged {
    pub game_id: BytesN<32>,
    pub timeout_state: i32,
    pub timeout_started: u64,
}

#[contractevent]
pub struct EvDrawRejected {
    pub game_id: BytesN<32>,
    pub player: Address,
}

/// `winner` is `None` for a split pot.
#[contractevent]
pub struct EvGameEnded {
    pub game_id: BytesN<32>,
    pub winner: Option<Address>,
    pub player1_winnings: i128,
    pub player2_winnings: i128,
}

#[contractevent]
pub struct EvRatingUpdated {
    pub game_id: BytesN<32>,
    pub player1: Address,
    pub player1_score: u32,
    pub player2: Address,
    pub player2_score: u32,
}

/// The rating book rejected or could not take the result; the game is
/// settled anyway.
#[contractevent]
pub struct EvRatingSkipped {
    pub game_id: BytesN<32>,
}

#[contractevent]
pub struct EvWithdrawn {
    pub game_id: BytesN<32>,
    pub player: Address,
    pub amount: i128,
}

#[contractevent]
pub struct EvGameClosed {
    pub game_id: BytesN<32>,
    pub player: Address,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  External trait interfaces
// ═══════════════════════════════════════════════════════════════════════════════

/// Board representation and move legality. `apply_move` fails the
/// invocation for an illegal move.
#[contractclient(name = "RulesEngineClient")]
pub trait RulesEngine {
    fn initial_state(env: Env) -> BoardState;

    fn apply_move(
        env: Env,
        state: BoardState,
        from: u32,
        to: u32,
        mover_is_white: bool,
    ) -> BoardState;

    fn is_in_check(env: Env, state: BoardState, king_position: u32, white: bool) -> bool;
}

#[contractclient(name = "SignatureVerifierClient")]
pub trait SignatureVerifier {
    fn verify(env: Env, signer: Address, message_hash: BytesN<32>, signature: BytesN<64>) -> bool;
}

/// `winner` is `None` for a draw.
#[contractclient(name = "RatingBookClient")]
pub trait RatingBook {
    fn record_result(
        env: Env,
        reporter: Address,
        player_a: Address,
        player_b: Address,
        winner: Option<Address>,
    );

    fn get_score(env: Env, player: Address) -> u32;
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Errors
// ═══════════════════════════════════════════════════════════════════════════════

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum WagerError {
    GameNotFound = 1,
    GameAlreadyExists = 2,
    NotParticipant = 3,
    SelfPlayNotAllowed = 4,
    GameAlreadyEnded = 5,
    GameNotStarted = 6,
    GameAlreadyJoined = 7,
    NotYourTurn = 8,
    InvalidTimeoutState = 9,
    TimeoutWindowNotElapsed = 10,
    StakeMismatch = 11,
    InvalidStake = 12,
    InvalidTurnTime = 13,
    IllegalMove = 14,
    BadSignature = 15,
    StaleState = 16,
    NothingOwed = 17,
    TransferFailed = 18,
    GameNotEnded = 19,
    GameNotListed = 20,
    AdminNotSet = 21,
    TokenNotSet = 22,
    RulesNotSet = 23,
    VerifierNotSet = 24,
    RatingsNotSet = 25,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Storage keys & configuration
// ═══════════════════════════════════════════════════════════════════════════════

#[contracttype]
#[derive(Clone)]
enum StorageKey {
    Admin,
    Token,
    Rules,
    Verifier,
    Ratings,
    Game(BytesN<32>),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub admin: Address,
    pub token: Address,
    pub rules: Address,
    pub verifier: Address,
    pub ratings: Address,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Constants
// ═══════════════════════════════════════════════════════════════════════════════

pub const MIN_TURN_TIME_MINUTES: u32 = 5;

// Ledger rate is approximately 5 seconds per ledger on Stellar
const LEDGER_RATE_SECS: u32 = 5;

// Escrowed games must outlive any realistic dispute: 180 days
const GAME_TTL_SECONDS: u32 = 180 * 24 * 60 * 60;
const GAME_TTL_LEDGERS: u32 = GAME_TTL_SECONDS / LEDGER_RATE_SECS; // 3,110,400 ledgers

/// Listing nodes share the game lifetime.
pub(crate) const INDEX_TTL_LEDGERS: u32 = GAME_TTL_LEDGERS;

// ═══════════════════════════════════════════════════════════════════════════════
//  Contract
// ═══════════════════════════════════════════════════════════════════════════════

#[contract]
pub struct WagerChess;

#[contractimpl]
impl WagerChess {
    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Constructor
    // ───────────────────────────────────────────────────────────────────────────

    /// `token` is fixed for the contract lifetime: every pot is denominated
    /// in it.
    pub fn __constructor(
        env: Env,
        admin: Address,
        token: Address,
        rules: Address,
        verifier: Address,
        ratings: Address,
    ) {
        let instance = env.storage().instance();
        instance.set(&StorageKey::Admin, &admin);
        instance.set(&StorageKey::Token, &token);
        instance.set(&StorageKey::Rules, &rules);
        instance.set(&StorageKey::Verifier, &verifier);
        instance.set(&StorageKey::Ratings, &ratings);
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Lifecycle
    // ───────────────────────────────────────────────────────────────────────────

    /// Open a new game. The creator plays white and `stake` is transferred
    /// into escrow. Returns the game id derived from the creator address and
    /// the current ledger sequence.
    pub fn init_game(
        env: Env,
        player: Address,
        alias: String,
        turn_time: u32,
        stake: i128,
    ) -> Result<BytesN<32>, WagerError> {
        player.require_auth();

        if turn_time < MIN_TURN_TIME_MINUTES {
            return Err(WagerError::InvalidTurnTime);
        }

        let game_id = Self::derive_game_id(&env, &player);
        if env
            .storage()
            .persistent()
            .has(&StorageKey::Game(game_id.clone()))
        {
            return Err(WagerError::GameAlreadyExists);
        }

        let rules = RulesEngineClient::new(&env, &Self::load_rules(&env)?);
        let mut game = Game {
            player1: player.clone(),
            player2: None,
            player1_alias: alias.clone(),
            player2_alias: String::from_str(&env, ""),
            next_player: None,
            winner: None,
            ended: false,
            pot: 0,
            deposited: 0,
            player1_winnings: 0,
            player2_winnings: 0,
            turn_time,
            timeout_started: 0,
            timeout_state: TimeoutState::Idle,
            state: rules.initial_state(),
        };
        escrow::open_pot(&mut game, stake)?;
        Self::collect_stake(&env, &player, stake)?;

        registry::add_open(&env, &game_id);
        registry::add_to_player(&env, &player, &game_id);

        EvGameCreated {
            game_id: game_id.clone(),
            player1: player,
            alias,
            turn_time,
            pot: game.pot,
        }
        .publish(&env);

        Self::write_game(&env, &game_id, &game);
        Ok(game_id)
    }

    /// Join an open game by matching its pot. White (the creator) moves first.
    pub fn join_game(
        env: Env,
        game_id: BytesN<32>,
        player: Address,
        alias: String,
        stake: i128,
    ) -> Result<(), WagerError> {
        player.require_auth();

        let mut game = Self::read_game(&env, &game_id)?;
        Self::require_not_ended(&game)?;
        if game.player2.is_some() {
            return Err(WagerError::GameAlreadyJoined);
        }
        if player == game.player1 {
            return Err(WagerError::SelfPlayNotAllowed);
        }

        escrow::join(&mut game, stake)?;
        Self::collect_stake(&env, &player, stake)?;

        game.player2 = Some(player.clone());
        game.player2_alias = alias.clone();
        game.next_player = Some(game.player1.clone());

        if !registry::remove_open(&env, &game_id) {
            return Err(WagerError::GameNotListed);
        }
        registry::add_to_player(&env, &player, &game_id);

        EvGameJoined {
            game_id: game_id.clone(),
            player2: player,
            alias,
            pot: game.pot,
        }
        .publish(&env);

        Self::write_game(&env, &game_id, &game);
        Ok(())
    }

    /// Creator-only: cancel a game nobody joined. The stake becomes
    /// withdrawable through `withdraw`.
    pub fn close_unjoined_game(
        env: Env,
        game_id: BytesN<32>,
        player: Address,
    ) -> Result<(), WagerError> {
        player.require_auth();

        let mut game = Self::read_game(&env, &game_id)?;
        Self::require_not_ended(&game)?;
        if player != game.player1 {
            return Err(WagerError::NotParticipant);
        }
        if game.player2.is_some() {
            return Err(WagerError::GameAlreadyJoined);
        }

        escrow::settle_winner(&mut game, &player)?;
        game.ended = true;

        if !registry::remove_open(&env, &game_id)
            || !registry::remove_from_player(&env, &player, &game_id)
        {
            return Err(WagerError::GameNotListed);
        }

        EvGameClosed {
            game_id: game_id.clone(),
            player,
        }
        .publish(&env);

        Self::write_game(&env, &game_id, &game);
        Ok(())
    }

    /// Drop a finished game from the caller's own listing.
    pub fn close_player_game(
        env: Env,
        game_id: BytesN<32>,
        player: Address,
    ) -> Result<(), WagerError> {
        player.require_auth();

        let game = Self::read_game(&env, &game_id)?;
        if !game.is_participant(&player) {
            return Err(WagerError::NotParticipant);
        }
        if !game.ended {
            return Err(WagerError::GameNotEnded);
        }
        if !registry::remove_from_player(&env, &player, &game_id) {
            return Err(WagerError::GameNotListed);
        }

        EvGameClosed { game_id, player }.publish(&env);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Moves
    // ───────────────────────────────────────────────────────────────────────────

    pub fn make_move(
        env: Env,
        game_id: BytesN<32>,
        player: Address,
        from: u32,
        to: u32,
    ) -> Result<(), WagerError> {
        let mut game = Self::read_running(&env, &game_id, &player)?;
        Self::apply_move(&env, &game_id, &mut game, &player, from, to)?;
        Self::write_game(&env, &game_id, &game);
        Ok(())
    }

    /// Resume from a snapshot the opponent signed, then play `from → to`.
    ///
    /// The opponent's signature over `state_message(game_id, state)` proves
    /// it is the caller's turn in `state`. Snapshots older than the stored
    /// position are refused.
    pub fn submit_signed_state(
        env: Env,
        game_id: BytesN<32>,
        player: Address,
        state: BoardState,
        from: u32,
        to: u32,
        signature: BytesN<64>,
    ) -> Result<(), WagerError> {
        let mut game = Self::read_running(&env, &game_id, &player)?;
        let opponent = game
            .opponent_of(&player)
            .ok_or(WagerError::NotParticipant)?;

        let message = signed_state::state_message(&env, &game_id, &state);
        let verifier = Self::load_verifier(&env)?;
        signed_state::verify_countersignature(&env, &verifier, &opponent, &message, &signature)?;
        signed_state::ensure_fresh(&game.state, &state)?;

        game.state = state;
        game.next_player = Some(player.clone());
        Self::apply_move(&env, &game_id, &mut game, &player, from, to)?;

        Self::write_game(&env, &game_id, &game);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Ending the game
    // ───────────────────────────────────────────────────────────────────────────

    /// The caller concedes; the opponent is owed the whole pot.
    pub fn surrender(env: Env, game_id: BytesN<32>, player: Address) -> Result<(), WagerError> {
        let mut game = Self::read_running(&env, &game_id, &player)?;
        let opponent = game
            .opponent_of(&player)
            .ok_or(WagerError::NotParticipant)?;
        Self::finish_with_winner(&env, &game_id, &mut game, &opponent)?;
        Self::write_game(&env, &game_id, &game);
        Ok(())
    }

    /// Waiting player claims the win (e.g. checkmate on the board).
    pub fn claim_win(env: Env, game_id: BytesN<32>, player: Address) -> Result<(), WagerError> {
        let mut game = Self::read_running(&env, &game_id, &player)?;
        let next = timeout::claim_win(game.timeout_state, game.is_mover(&player))?;
        Self::enter_timeout(&env, &game_id, &mut game, next);
        Self::write_game(&env, &game_id, &game);
        Ok(())
    }

    /// Waiting player starts the clock on an unresponsive mover.
    pub fn claim_timeout_started(
        env: Env,
        game_id: BytesN<32>,
        player: Address,
    ) -> Result<(), WagerError> {
        let mut game = Self::read_running(&env, &game_id, &player)?;
        let next = timeout::claim_timeout_started(game.timeout_state, game.is_mover(&player))?;
        Self::enter_timeout(&env, &game_id, &mut game, next);
        Self::write_game(&env, &game_id, &game);
        Ok(())
    }

    pub fn offer_draw(env: Env, game_id: BytesN<32>, player: Address) -> Result<(), WagerError> {
        let mut game = Self::read_running(&env, &game_id, &player)?;
        let clock = Self::clock(&env, &game);
        let next = timeout::offer_draw(game.timeout_state, game.is_mover(&player), &clock)?;
        Self::enter_timeout(&env, &game_id, &mut game, next);
        Self::write_game(&env, &game_id, &game);
        Ok(())
    }

    /// Waiting player turns down the mover's draw offer.
    pub fn reject_draw(env: Env, game_id: BytesN<32>, player: Address) -> Result<(), WagerError> {
        let mut game = Self::read_running(&env, &game_id, &player)?;
        game.timeout_state = timeout::reject_draw(game.timeout_state, game.is_mover(&player))?;

        EvDrawRejected {
            game_id: game_id.clone(),
            player,
        }
        .publish(&env);
        EvTimeoutStateChanged {
            game_id: game_id.clone(),
            timeout_state: game.timeout_state.code(),
            timeout_started: game.timeout_started,
        }
        .publish(&env);

        Self::write_game(&env, &game_id, &game);
        Ok(())
    }

    /// Resolve a pending claim or draw offer after one turn window.
    pub fn claim_timeout_ended(
        env: Env,
        game_id: BytesN<32>,
        player: Address,
    ) -> Result<(), WagerError> {
        let mut game = Self::read_running(&env, &game_id, &player)?;
        let clock = Self::clock(&env, &game);
        let resolution = timeout::timeout_ended(game.timeout_state, game.is_mover(&player), &clock)?;
        Self::resolve(&env, &game_id, &mut game, resolution)?;
        Self::write_game(&env, &game_id, &game);
        Ok(())
    }

    /// Accept the other side's pending claim or draw offer immediately.
    pub fn confirm_game_ended(
        env: Env,
        game_id: BytesN<32>,
        player: Address,
    ) -> Result<(), WagerError> {
        let mut game = Self::read_running(&env, &game_id, &player)?;
        let resolution = timeout::confirm_ended(game.timeout_state, game.is_mover(&player))?;
        Self::resolve(&env, &game_id, &mut game, resolution)?;
        Self::write_game(&env, &game_id, &game);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Escrow
    // ───────────────────────────────────────────────────────────────────────────

    /// Pay out the caller's pending winnings for this game.
    pub fn withdraw(env: Env, game_id: BytesN<32>, player: Address) -> Result<i128, WagerError> {
        player.require_auth();

        let token = token::Client::new(&env, &Self::load_token(&env)?);
        let mut game = Self::read_game(&env, &game_id)?;

        let amount = escrow::debit_winnings(&mut game, &player)?;
        Self::write_game(&env, &game_id, &game);

        let escrow_account = env.current_contract_address();
        if !matches!(
            token.try_transfer(&escrow_account, &player, &amount),
            Ok(Ok(()))
        ) {
            escrow::restore_winnings(&mut game, &player, amount)?;
            Self::write_game(&env, &game_id, &game);
            return Err(WagerError::TransferFailed);
        }

        EvWithdrawn {
            game_id,
            player,
            amount,
        }
        .publish(&env);
        Ok(amount)
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Read
    // ───────────────────────────────────────────────────────────────────────────

    pub fn get_game(env: Env, game_id: BytesN<32>) -> Result<Game, WagerError> {
        Self::read_game(&env, &game_id)
    }

    pub fn is_ended(env: Env, game_id: BytesN<32>) -> Result<bool, WagerError> {
        Ok(Self::read_game(&env, &game_id)?.ended)
    }

    /// Games waiting for a second player, most recent first.
    pub fn list_open_games(env: Env) -> Vec<BytesN<32>> {
        registry::list_open(&env)
    }

    /// Games `player` created or joined and has not closed, most recent first.
    pub fn list_player_games(env: Env, player: Address) -> Vec<BytesN<32>> {
        registry::list_for_player(&env, &player)
    }

    /// The hash a player signs to countersign `state` for this game.
    pub fn state_message(env: Env, game_id: BytesN<32>, state: BoardState) -> BytesN<32> {
        signed_state::state_message(&env, &game_id, &state)
    }

    /// Whether the side to move has its king at `king_position` under attack.
    /// A position the engine cannot evaluate is `IllegalMove`.
    pub fn is_mover_in_check(
        env: Env,
        game_id: BytesN<32>,
        king_position: u32,
    ) -> Result<bool, WagerError> {
        let game = Self::read_game(&env, &game_id)?;
        let mover = game.next_player.clone().ok_or(WagerError::GameNotStarted)?;
        let rules = RulesEngineClient::new(&env, &Self::load_rules(&env)?);
        match rules.try_is_in_check(&game.state, &king_position, &(mover == game.player1)) {
            Ok(Ok(in_check)) => Ok(in_check),
            _ => Err(WagerError::IllegalMove),
        }
    }

    pub fn get_config(env: Env) -> Result<Config, WagerError> {
        Ok(Config {
            admin: Self::load_admin(&env)?,
            token: Self::load_token(&env)?,
            rules: Self::load_rules(&env)?,
            verifier: Self::load_verifier(&env)?,
            ratings: Self::load_ratings(&env)?,
        })
    }

    // ───────────────────────────────────────────────────────────────────────────
    //  Public: Admin
    // ───────────────────────────────────────────────────────────────────────────

    pub fn get_admin(env: Env) -> Result<Address, WagerError> {
        Self::load_admin(&env)
    }

    pub fn set_admin(env: Env, new_admin: Address) -> Result<(), WagerError> {
        Self::set_config_address(&env, StorageKey::Admin, &new_admin)
    }

    pub fn set_rules(env: Env, new_rules: Address) -> Result<(), WagerError> {
        Self::set_config_address(&env, StorageKey::Rules, &new_rules)
    }

    pub fn set_verifier(env: Env, new_verifier: Address) -> Result<(), WagerError> {
        Self::set_config_address(&env, StorageKey::Verifier, &new_verifier)
    }

    pub fn set_ratings(env: Env, new_ratings: Address) -> Result<(), WagerError> {
        Self::set_config_address(&env, StorageKey::Ratings, &new_ratings)
    }

    pub fn upgrade(env: Env, new_wasm_hash: BytesN<32>) -> Result<(), WagerError> {
        let admin = Self::load_admin(&env)?;
        admin.require_auth();
        env.deployer().update_current_contract_wasm(new_wasm_hash);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Moves & timeout bookkeeping
    // ═══════════════════════════════════════════════════════════════════════════

    /// Shared by `make_move` and `submit_signed_state`: validates the turn,
    /// runs the rules engine, hands the turn over and clears any pending
    /// claim or offer.
    fn apply_move(
        env: &Env,
        game_id: &BytesN<32>,
        game: &mut Game,
        player: &Address,
        from: u32,
        to: u32,
    ) -> Result<(), WagerError> {
        if !game.is_mover(player) {
            return Err(WagerError::NotYourTurn);
        }
        let opponent = game
            .opponent_of(player)
            .ok_or(WagerError::NotParticipant)?;

        let rules = RulesEngineClient::new(env, &Self::load_rules(env)?);
        let mover_is_white = *player == game.player1;
        let next_state = match rules.try_apply_move(&game.state, &from, &to, &mover_is_white) {
            Ok(Ok(next)) => next,
            _ => return Err(WagerError::IllegalMove),
        };

        game.state = next_state;
        game.next_player = Some(opponent);

        if game.timeout_state != TimeoutState::Idle {
            game.timeout_state = TimeoutState::Idle;
            EvTimeoutStateChanged {
                game_id: game_id.clone(),
                timeout_state: TimeoutState::Idle.code(),
                timeout_started: game.timeout_started,
            }
            .publish(env);
        }

        EvMoved {
            game_id: game_id.clone(),
            player: player.clone(),
            from,
            to,
            state: game.state.clone(),
        }
        .publish(env);
        Ok(())
    }

    fn enter_timeout(env: &Env, game_id: &BytesN<32>, game: &mut Game, next: TimeoutState) {
        game.timeout_state = next;
        game.timeout_started = env.ledger().timestamp();

        EvTimeoutStateChanged {
            game_id: game_id.clone(),
            timeout_state: next.code(),
            timeout_started: game.timeout_started,
        }
        .publish(env);
    }

    fn clock(env: &Env, game: &Game) -> Clock {
        Clock {
            now: env.ledger().timestamp(),
            started: game.timeout_started,
            turn_secs: game.turn_time_secs(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Finalization
    // ═══════════════════════════════════════════════════════════════════════════

    fn resolve(
        env: &Env,
        game_id: &BytesN<32>,
        game: &mut Game,
        resolution: Resolution,
    ) -> Result<(), WagerError> {
        match resolution {
            Resolution::Split => {
                Self::finish_split(env, game_id, game);
                Ok(())
            }
            Resolution::WaitingPlayerWins => {
                let winner = game.waiting_player().ok_or(WagerError::GameNotStarted)?;
                Self::finish_with_winner(env, game_id, game, &winner)
            }
        }
    }

    /// Single path that decides a winner: settles the pot, ends the game and
    /// reports to the rating book exactly once.
    fn finish_with_winner(
        env: &Env,
        game_id: &BytesN<32>,
        game: &mut Game,
        winner: &Address,
    ) -> Result<(), WagerError> {
        Self::require_not_ended(game)?;

        escrow::settle_winner(game, winner)?;
        game.winner = Some(winner.clone());
        game.ended = true;

        EvGameEnded {
            game_id: game_id.clone(),
            winner: game.winner.clone(),
            player1_winnings: game.player1_winnings,
            player2_winnings: game.player2_winnings,
        }
        .publish(env);

        match Self::load_ratings(env) {
            Ok(ratings) => rating::report_winner(env, &ratings, game_id, game, winner),
            Err(_) => rating::report_skipped(env, game_id),
        }
        Ok(())
    }

    fn finish_split(env: &Env, game_id: &BytesN<32>, game: &mut Game) {
        escrow::settle_split(game);
        game.ended = true;

        EvGameEnded {
            game_id: game_id.clone(),
            winner: None,
            player1_winnings: game.player1_winnings,
            player2_winnings: game.player2_winnings,
        }
        .publish(env);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Guards
    // ═══════════════════════════════════════════════════════════════════════════

    /// Auth + load + "joined, not ended, caller plays in it".
    fn read_running(
        env: &Env,
        game_id: &BytesN<32>,
        player: &Address,
    ) -> Result<Game, WagerError> {
        player.require_auth();

        let game = Self::read_game(env, game_id)?;
        Self::require_not_ended(&game)?;
        if !game.is_participant(player) {
            return Err(WagerError::NotParticipant);
        }
        if game.player2.is_none() {
            return Err(WagerError::GameNotStarted);
        }
        Ok(game)
    }

    fn require_not_ended(game: &Game) -> Result<(), WagerError> {
        if game.ended {
            return Err(WagerError::GameAlreadyEnded);
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Funds
    // ═══════════════════════════════════════════════════════════════════════════

    fn collect_stake(env: &Env, player: &Address, stake: i128) -> Result<(), WagerError> {
        if stake > 0 {
            let token = token::Client::new(env, &Self::load_token(env)?);
            token.transfer(player, &env.current_contract_address(), &stake);
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  Internal: Storage
    // ═══════════════════════════════════════════════════════════════════════════

    fn derive_game_id(env: &Env, creator: &Address) -> BytesN<32> {
        let mut preimage = creator.to_string().to_bytes();
        preimage.append(&Bytes::from_array(env, &env.ledger().sequence().to_be_bytes()));
        env.crypto().keccak256(&preimage).into()
    }

    fn read_game(env: &Env, game_id: &BytesN<32>) -> Result<Game, WagerError> {
        env.storage()
            .persistent()
            .get(&StorageKey::Game(game_id.clone()))
            .ok_or(WagerError::GameNotFound)
    }

    fn write_game(env: &Env, game_id: &BytesN<32>, game: &Game) {
        let key = StorageKey::Game(game_id.clone());
        env.storage().persistent().set(&key, game);
        env.storage()
            .persistent()
            .extend_ttl(&key, GAME_TTL_LEDGERS, GAME_TTL_LEDGERS);
        registry::keep_alive(
            env,
            game_id,
            &[Some(game.player1.clone()), game.player2.clone()],
        );
        // Keep instance storage (admin, token, collaborators) alive
        env.storage()
            .instance()
            .extend_ttl(GAME_TTL_LEDGERS, GAME_TTL_LEDGERS);
    }

    fn set_config_address(env: &Env, key: StorageKey, value: &Address) -> Result<(), WagerError> {
        let admin = Self::load_admin(env)?;
        admin.require_auth();
        env.storage().instance().set(&key, value);
        Ok(())
    }

    fn load_admin(env: &Env) -> Result<Address, WagerError> {
        env.storage()
            .instance()
            .get(&StorageKey::Admin)
            .ok_or(WagerError::AdminNotSet)
    }

    fn load_token(env: &Env) -> Result<Address, WagerError> {
        env.storage()
            .instance()
            .get(&StorageKey::Token)
            .ok_or(WagerError::TokenNotSet)
    }

    fn load_rules(env: &Env) -> Result<Address, WagerError> {
        env.storage()
            .instance()
            .get(&StorageKey::Rules)
            .ok_or(WagerError::RulesNotSet)
    }

    fn load_verifier(env: &Env) -> Result<Address, WagerError> {
        env.storage()
            .instance()
            .get(&StorageKey::Verifier)
            .ok_or(WagerError::VerifierNotSet)
    }

    fn load_ratings(env: &Env) -> Result<Address, WagerError> {
        env.storage()
            .instance()
            .get(&StorageKey::Ratings)
            .ok_or(WagerError::RatingsNotSet)
    }
}
