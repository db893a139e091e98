#![cfg(test)]

use crate::{
    expected_pct, next_rating, Leaderboard, LeaderboardClient, LeaderboardError, STARTING_RATING,
};
use soroban_sdk::testutils::{Address as _, Ledger as _};
use soroban_sdk::{Address, Env};

// ════════════════════════════════════════════════════════════════════════════
//  Helpers
// ════════════════════════════════════════════════════════════════════════════

fn setup() -> (Env, LeaderboardClient<'static>, Address) {
    let env = Env::default();
    env.mock_all_auths();

    env.ledger().set(soroban_sdk::testutils::LedgerInfo {
        timestamp: 1_700_000_000,
        protocol_version: 25,
        sequence_number: 100,
        network_id: Default::default(),
        base_reserve: 10,
        min_temp_entry_ttl: u32::MAX / 2,
        min_persistent_entry_ttl: u32::MAX / 2,
        max_entry_ttl: u32::MAX / 2,
    });

    let admin = Address::generate(&env);
    let contract_id = env.register(Leaderboard, (&admin,));
    let client = LeaderboardClient::new(&env, &contract_id);

    (env, client, admin)
}

fn players(env: &Env) -> (Address, Address) {
    (Address::generate(env), Address::generate(env))
}

fn assert_leaderboard_error<T, E>(
    result: &Result<Result<T, E>, Result<LeaderboardError, soroban_sdk::InvokeError>>,
    expected: LeaderboardError,
) {
    match result {
        Err(Ok(actual)) => assert_eq!(*actual, expected),
        Err(Err(invoke_err)) => panic!("Expected {:?}, got invoke error: {:?}", expected, invoke_err),
        Ok(_) => panic!("Expected {:?}, but operation succeeded", expected),
    }
}

// ════════════════════════════════════════════════════════════════════════════
//  Initialization
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn test_init_empty() {
    let (env, client, admin) = setup();
    assert_eq!(client.total_players(), 0);
    assert_eq!(client.get_top_players(&10).len(), 0);
    assert_eq!(client.get_admin(), admin);

    let stranger = Address::generate(&env);
    assert_eq!(client.get_score(&stranger), STARTING_RATING);
    assert!(client.get_player(&stranger).is_none());
}

// ════════════════════════════════════════════════════════════════════════════
//  Recording results
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn test_win_between_equal_players() {
    let (env, client, admin) = setup();
    let (a, b) = players(&env);

    client.record_result(&admin, &a, &b, &Some(a.clone()));

    let ra = client.get_player(&a).unwrap();
    assert_eq!(ra.wins, 1);
    assert_eq!(ra.losses, 0);
    assert_eq!(ra.games, 1);
    assert_eq!(ra.rating, 1216);

    let rb = client.get_player(&b).unwrap();
    assert_eq!(rb.losses, 1);
    assert_eq!(rb.games, 1);
    assert_eq!(rb.rating, 1184);

    assert_eq!(client.get_score(&a), 1216);
    assert_eq!(client.get_score(&b), 1184);
}

#[test]
fn test_second_player_can_win() {
    let (env, client, admin) = setup();
    let (a, b) = players(&env);

    client.record_result(&admin, &a, &b, &Some(b.clone()));

    assert_eq!(client.get_player(&a).unwrap().losses, 1);
    assert_eq!(client.get_player(&b).unwrap().wins, 1);
    assert!(client.get_score(&b) > client.get_score(&a));
}

#[test]
fn test_draw_between_equal_players_keeps_ratings() {
    let (env, client, admin) = setup();
    let (a, b) = players(&env);

    client.record_result(&admin, &a, &b, &None);

    let ra = client.get_player(&a).unwrap();
    let rb = client.get_player(&b).unwrap();
    assert_eq!(ra.draws, 1);
    assert_eq!(rb.draws, 1);
    assert_eq!(ra.rating, STARTING_RATING);
    assert_eq!(rb.rating, STARTING_RATING);
}

#[test]
fn test_favourite_gains_less() {
    let (env, client, admin) = setup();
    let (a, b) = players(&env);

    client.record_result(&admin, &a, &b, &Some(a.clone()));
    // a: 1216, b: 1184; gap of 32 either way
    client.record_result(&admin, &a, &b, &Some(a.clone()));

    assert_eq!(client.get_score(&a), 1232);
    assert_eq!(client.get_score(&b), 1171);
}

#[test]
fn test_streaks() {
    let (env, client, admin) = setup();
    let (a, b) = players(&env);

    client.record_result(&admin, &a, &b, &Some(a.clone()));
    client.record_result(&admin, &a, &b, &Some(a.clone()));
    client.record_result(&admin, &a, &b, &Some(a.clone()));
    assert_eq!(client.get_player(&a).unwrap().streak, 3);

    client.record_result(&admin, &a, &b, &None);
    let ra = client.get_player(&a).unwrap();
    assert_eq!(ra.streak, 0);
    assert_eq!(ra.best_streak, 3);
    assert_eq!(ra.games, 4);
    assert_eq!(client.get_player(&b).unwrap().best_streak, 0);
}

// ════════════════════════════════════════════════════════════════════════════
//  Authorization & validation
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn test_unknown_reporter_rejected() {
    let (env, client, _admin) = setup();
    let (a, b) = players(&env);
    let game = Address::generate(&env);

    let result = client.try_record_result(&game, &a, &b, &None);
    assert_leaderboard_error(&result, LeaderboardError::ReporterNotAuthorized);
    assert_eq!(client.total_players(), 0);
}

#[test]
fn test_authorized_reporter_records_until_revoked() {
    let (env, client, _admin) = setup();
    let (a, b) = players(&env);
    let game = Address::generate(&env);

    client.authorize_reporter(&game);
    client.authorize_reporter(&game);
    client.record_result(&game, &a, &b, &Some(b.clone()));
    assert_eq!(client.total_players(), 2);

    client.revoke_reporter(&game);
    let result = client.try_record_result(&game, &a, &b, &None);
    assert_leaderboard_error(&result, LeaderboardError::ReporterNotAuthorized);
}

#[test]
fn test_reporter_management_needs_admin_auth() {
    let (env, client, admin) = setup();
    let game = Address::generate(&env);

    client.authorize_reporter(&game);
    let auths = env.auths();
    assert_eq!(auths.len(), 1);
    assert_eq!(auths[0].0, admin);

    client.revoke_reporter(&game);
    assert_eq!(env.auths()[0].0, admin);
}

#[test]
fn test_error_codes_are_stable() {
    assert_eq!(LeaderboardError::AdminNotSet as u32, 1);
    assert_eq!(LeaderboardError::ReporterNotAuthorized as u32, 2);
    assert_eq!(LeaderboardError::SelfPlay as u32, 3);
    assert_eq!(LeaderboardError::WinnerNotInGame as u32, 4);
}

#[test]
fn test_self_play_rejected() {
    let (env, client, admin) = setup();
    let a = Address::generate(&env);
    let result = client.try_record_result(&admin, &a, &a, &Some(a.clone()));
    assert_leaderboard_error(&result, LeaderboardError::SelfPlay);
}

#[test]
fn test_winner_must_be_a_player() {
    let (env, client, admin) = setup();
    let (a, b) = players(&env);
    let outsider = Address::generate(&env);
    let result = client.try_record_result(&admin, &a, &b, &Some(outsider));
    assert_leaderboard_error(&result, LeaderboardError::WinnerNotInGame);
    assert!(client.get_player(&a).is_none());
}

// ════════════════════════════════════════════════════════════════════════════
//  Ranking
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn test_top_players_sorted_by_rating() {
    let (env, client, admin) = setup();
    let (a, b) = players(&env);
    let c = Address::generate(&env);

    client.record_result(&admin, &a, &b, &Some(a.clone()));
    client.record_result(&admin, &c, &b, &Some(c.clone()));
    client.record_result(&admin, &a, &c, &Some(a.clone()));

    let top = client.get_top_players(&10);
    assert_eq!(top.len(), 3);
    assert_eq!(top.get(0).unwrap().address, a);
    for i in 1..top.len() {
        assert!(top.get(i - 1).unwrap().rating >= top.get(i).unwrap().rating);
    }

    let first_two = client.get_top_players(&2);
    assert_eq!(first_two.len(), 2);
    assert_eq!(client.total_players(), 3);
}

#[test]
fn test_last_game_timestamp() {
    let (env, client, admin) = setup();
    let (a, b) = players(&env);

    env.ledger().with_mut(|li| li.timestamp = 1_700_000_500);
    client.record_result(&admin, &a, &b, &None);
    assert_eq!(client.get_player(&a).unwrap().last_game_at, 1_700_000_500);
}

// ════════════════════════════════════════════════════════════════════════════
//  Rating arithmetic
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn test_rating_never_drops_below_floor() {
    assert_eq!(next_rating(100, 2000, 0, 32), 100);
}

#[test]
fn test_expected_score_is_monotonic() {
    let mut last = 100;
    let mut gap = -500;
    while gap <= 500 {
        let pct = expected_pct(gap);
        assert!(pct <= last);
        last = pct;
        gap += 25;
    }
    assert_eq!(expected_pct(0), 50);
}
