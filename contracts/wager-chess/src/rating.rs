use soroban_sdk::{Address, BytesN, Env};

use crate::types::Game;
use crate::{EvRatingSkipped, EvRatingUpdated, RatingBookClient};

/// Reports a decided game to the rating book and re-publishes both scores.
/// Called once, from the single terminal path that sets `winner`.
///
/// The rating book cannot block settlement: a rejected report publishes
/// `EvRatingSkipped` and the game ends regardless.
pub fn report_winner(
    env: &Env,
    ratings: &Address,
    game_id: &BytesN<32>,
    game: &Game,
    winner: &Address,
) {
    let Some(player2) = game.player2.clone() else {
        return report_skipped(env, game_id);
    };
    let book = RatingBookClient::new(env, ratings);

    let recorded = book.try_record_result(
        &env.current_contract_address(),
        &game.player1,
        &player2,
        &Some(winner.clone()),
    );
    if !matches!(recorded, Ok(Ok(()))) {
        return report_skipped(env, game_id);
    }

    // Recorded; the score read-back only feeds the event.
    let (Ok(Ok(player1_score)), Ok(Ok(player2_score))) = (
        book.try_get_score(&game.player1),
        book.try_get_score(&player2),
    ) else {
        return;
    };

    EvRatingUpdated {
        game_id: game_id.clone(),
        player1: game.player1.clone(),
        player1_score,
        player2,
        player2_score,
    }
    .publish(env);
}

pub fn report_skipped(env: &Env, game_id: &BytesN<32>) {
    EvRatingSkipped {
        game_id: game_id.clone(),
    }
    .publish(env);
}
