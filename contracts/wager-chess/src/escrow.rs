//! Pot and pending-withdrawal accounting for a single game.
//!
//! Funds only ever move between `pot`, `player1_winnings` and
//! `player2_winnings`; token transfers happen in the contract layer.

use soroban_sdk::Address;

use crate::types::Game;
use crate::WagerError;

pub fn open_pot(game: &mut Game, stake: i128) -> Result<(), WagerError> {
    if stake < 0 {
        return Err(WagerError::InvalidStake);
    }
    game.pot = stake;
    game.deposited = stake;
    Ok(())
}

/// The joining stake must match the pot exactly; the pot doubles.
pub fn join(game: &mut Game, stake: i128) -> Result<(), WagerError> {
    if stake != game.pot {
        return Err(WagerError::StakeMismatch);
    }
    game.pot = game
        .pot
        .checked_add(stake)
        .ok_or(WagerError::InvalidStake)?;
    game.deposited = game
        .deposited
        .checked_add(stake)
        .ok_or(WagerError::InvalidStake)?;
    Ok(())
}

pub fn settle_winner(game: &mut Game, winner: &Address) -> Result<(), WagerError> {
    let pot = game.pot;
    *winnings_of(game, winner)? += pot;
    game.pot = 0;
    Ok(())
}

/// Each side gets floor(pot / 2). An odd unit stays in the pot for good.
pub fn settle_split(game: &mut Game) {
    let half = game.pot / 2;
    game.player1_winnings += half;
    game.player2_winnings += half;
    game.pot -= half * 2;
}

/// Zeroes the caller's pending balance and returns what was owed.
/// The balance is cleared before any transfer is attempted.
pub fn debit_winnings(game: &mut Game, player: &Address) -> Result<i128, WagerError> {
    let balance = winnings_of(game, player)?;
    if *balance == 0 {
        return Err(WagerError::NothingOwed);
    }
    let amount = *balance;
    *balance = 0;
    Ok(amount)
}

/// Puts back an amount whose outbound transfer was rejected.
pub fn restore_winnings(game: &mut Game, player: &Address, amount: i128) -> Result<(), WagerError> {
    *winnings_of(game, player)? += amount;
    Ok(())
}

fn winnings_of<'a>(game: &'a mut Game, player: &Address) -> Result<&'a mut i128, WagerError> {
    if *player == game.player1 {
        Ok(&mut game.player1_winnings)
    } else if game.player2.as_ref() == Some(player) {
        Ok(&mut game.player2_winnings)
    } else {
        Err(WagerError::NotParticipant)
    }
}
