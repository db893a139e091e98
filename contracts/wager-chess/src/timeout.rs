//! Dispute protocol over [`TimeoutState`].
//!
//! Every function here is pure: it takes the stored state, which side the
//! caller is on and (where relevant) the clock, and either returns the next
//! state / resolution or the reason the request is refused. The contract
//! layer re-reads stored state on every call, so a losing competing claim
//! simply fails here.
//!
//! Side rules:
//! - only the waiting player can open a win or timeout claim;
//! - either side can offer a draw, which records who offered it;
//! - resolution after the window, or early confirmation by the opponent,
//!   always pays the waiting player or splits the pot.

use crate::types::TimeoutState;
use crate::WagerError;

/// How a pending claim ends the game.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Resolution {
    Split,
    WaitingPlayerWins,
}

#[derive(Clone, Copy, Debug)]
pub struct Clock {
    pub now: u64,
    pub started: u64,
    pub turn_secs: u64,
}

impl Clock {
    fn elapsed(&self, windows: u64) -> bool {
        self.now
            >= self
                .started
                .saturating_add(self.turn_secs.saturating_mul(windows))
    }
}

pub fn claim_win(state: TimeoutState, caller_is_mover: bool) -> Result<TimeoutState, WagerError> {
    open_claim(state, caller_is_mover, TimeoutState::WinClaimed)
}

pub fn claim_timeout_started(
    state: TimeoutState,
    caller_is_mover: bool,
) -> Result<TimeoutState, WagerError> {
    open_claim(state, caller_is_mover, TimeoutState::TimeoutClaimed)
}

fn open_claim(
    state: TimeoutState,
    caller_is_mover: bool,
    claim: TimeoutState,
) -> Result<TimeoutState, WagerError> {
    if state != TimeoutState::Idle || caller_is_mover {
        return Err(WagerError::InvalidTimeoutState);
    }
    Ok(claim)
}

/// A draw may be offered from Idle, or on top of a timeout claim once the
/// mover has had two full turn windows to answer it.
pub fn offer_draw(
    state: TimeoutState,
    caller_is_mover: bool,
    clock: &Clock,
) -> Result<TimeoutState, WagerError> {
    match state {
        TimeoutState::Idle => {}
        TimeoutState::TimeoutClaimed => {
            if !clock.elapsed(2) {
                return Err(WagerError::TimeoutWindowNotElapsed);
            }
        }
        _ => return Err(WagerError::InvalidTimeoutState),
    }
    Ok(if caller_is_mover {
        TimeoutState::DrawOfferByMover
    } else {
        TimeoutState::DrawOfferByWaiting
    })
}

pub fn reject_draw(state: TimeoutState, caller_is_mover: bool) -> Result<TimeoutState, WagerError> {
    if state != TimeoutState::DrawOfferByMover || caller_is_mover {
        return Err(WagerError::InvalidTimeoutState);
    }
    Ok(TimeoutState::Idle)
}

pub fn timeout_ended(
    state: TimeoutState,
    caller_is_mover: bool,
    clock: &Clock,
) -> Result<Resolution, WagerError> {
    if state == TimeoutState::Idle {
        return Err(WagerError::InvalidTimeoutState);
    }
    if !clock.elapsed(1) {
        return Err(WagerError::TimeoutWindowNotElapsed);
    }
    match (caller_is_mover, state) {
        (true, TimeoutState::DrawOfferByMover) => Ok(Resolution::Split),
        (false, TimeoutState::DrawOfferByWaiting) => Ok(Resolution::Split),
        (false, TimeoutState::WinClaimed) => Ok(Resolution::WaitingPlayerWins),
        // The mover let a timeout claim run out without moving.
        (false, TimeoutState::TimeoutClaimed) => Ok(Resolution::WaitingPlayerWins),
        _ => Err(WagerError::InvalidTimeoutState),
    }
}

pub fn confirm_ended(state: TimeoutState, caller_is_mover: bool) -> Result<Resolution, WagerError> {
    match (caller_is_mover, state) {
        (false, TimeoutState::DrawOfferByMover) => Ok(Resolution::Split),
        (true, TimeoutState::DrawOfferByWaiting) => Ok(Resolution::Split),
        (true, TimeoutState::WinClaimed) | (true, TimeoutState::TimeoutClaimed) => {
            Ok(Resolution::WaitingPlayerWins)
        }
        _ => Err(WagerError::InvalidTimeoutState),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TURN: u64 = 5 * 60;

    fn clock(started: u64, now: u64) -> Clock {
        Clock {
            now,
            started,
            turn_secs: TURN,
        }
    }

    const ALL: [TimeoutState; 5] = [
        TimeoutState::Idle,
        TimeoutState::WinClaimed,
        TimeoutState::TimeoutClaimed,
        TimeoutState::DrawOfferByWaiting,
        TimeoutState::DrawOfferByMover,
    ];

    #[test]
    fn test_only_waiting_player_opens_claims() {
        assert_eq!(claim_win(TimeoutState::Idle, false), Ok(TimeoutState::WinClaimed));
        assert_eq!(
            claim_timeout_started(TimeoutState::Idle, false),
            Ok(TimeoutState::TimeoutClaimed)
        );
        assert_eq!(
            claim_win(TimeoutState::Idle, true),
            Err(WagerError::InvalidTimeoutState)
        );
        assert_eq!(
            claim_timeout_started(TimeoutState::Idle, true),
            Err(WagerError::InvalidTimeoutState)
        );
    }

    #[test]
    fn test_claims_need_idle_state() {
        for state in ALL.iter().skip(1) {
            assert_eq!(claim_win(*state, false), Err(WagerError::InvalidTimeoutState));
            assert_eq!(
                claim_timeout_started(*state, false),
                Err(WagerError::InvalidTimeoutState)
            );
        }
    }

    #[test]
    fn test_draw_offer_records_offering_side() {
        let c = clock(0, 0);
        assert_eq!(
            offer_draw(TimeoutState::Idle, true, &c),
            Ok(TimeoutState::DrawOfferByMover)
        );
        assert_eq!(
            offer_draw(TimeoutState::Idle, false, &c),
            Ok(TimeoutState::DrawOfferByWaiting)
        );
    }

    #[test]
    fn test_draw_over_timeout_claim_waits_two_windows() {
        assert_eq!(
            offer_draw(TimeoutState::TimeoutClaimed, true, &clock(1_000, 1_000 + 2 * TURN - 1)),
            Err(WagerError::TimeoutWindowNotElapsed)
        );
        assert_eq!(
            offer_draw(TimeoutState::TimeoutClaimed, true, &clock(1_000, 1_000 + 2 * TURN)),
            Ok(TimeoutState::DrawOfferByMover)
        );
        assert_eq!(
            offer_draw(TimeoutState::WinClaimed, true, &clock(0, 10 * TURN)),
            Err(WagerError::InvalidTimeoutState)
        );
    }

    #[test]
    fn test_reject_draw_only_from_mover_offer() {
        assert_eq!(
            reject_draw(TimeoutState::DrawOfferByMover, false),
            Ok(TimeoutState::Idle)
        );
        assert_eq!(
            reject_draw(TimeoutState::DrawOfferByMover, true),
            Err(WagerError::InvalidTimeoutState)
        );
        for state in ALL {
            if state == TimeoutState::DrawOfferByMover {
                continue;
            }
            assert_eq!(reject_draw(state, false), Err(WagerError::InvalidTimeoutState));
            assert_eq!(reject_draw(state, true), Err(WagerError::InvalidTimeoutState));
        }
    }

    #[test]
    fn test_timeout_ended_respects_window() {
        let early = clock(500, 500 + TURN - 1);
        for state in ALL.iter().skip(1) {
            assert_eq!(
                timeout_ended(*state, false, &early),
                Err(WagerError::TimeoutWindowNotElapsed)
            );
        }
        assert_eq!(
            timeout_ended(TimeoutState::Idle, false, &clock(0, 10 * TURN)),
            Err(WagerError::InvalidTimeoutState)
        );
    }

    #[test]
    fn test_timeout_ended_resolution_table() {
        let late = clock(0, TURN);
        assert_eq!(
            timeout_ended(TimeoutState::DrawOfferByMover, true, &late),
            Ok(Resolution::Split)
        );
        assert_eq!(
            timeout_ended(TimeoutState::DrawOfferByWaiting, false, &late),
            Ok(Resolution::Split)
        );
        assert_eq!(
            timeout_ended(TimeoutState::WinClaimed, false, &late),
            Ok(Resolution::WaitingPlayerWins)
        );
        assert_eq!(
            timeout_ended(TimeoutState::TimeoutClaimed, false, &late),
            Ok(Resolution::WaitingPlayerWins)
        );

        // Wrong side for each pending state.
        assert_eq!(
            timeout_ended(TimeoutState::DrawOfferByMover, false, &late),
            Err(WagerError::InvalidTimeoutState)
        );
        assert_eq!(
            timeout_ended(TimeoutState::DrawOfferByWaiting, true, &late),
            Err(WagerError::InvalidTimeoutState)
        );
        assert_eq!(
            timeout_ended(TimeoutState::WinClaimed, true, &late),
            Err(WagerError::InvalidTimeoutState)
        );
        assert_eq!(
            timeout_ended(TimeoutState::TimeoutClaimed, true, &late),
            Err(WagerError::InvalidTimeoutState)
        );
    }

    #[test]
    fn test_confirm_resolution_table() {
        assert_eq!(
            confirm_ended(TimeoutState::DrawOfferByMover, false),
            Ok(Resolution::Split)
        );
        assert_eq!(
            confirm_ended(TimeoutState::DrawOfferByWaiting, true),
            Ok(Resolution::Split)
        );
        assert_eq!(
            confirm_ended(TimeoutState::WinClaimed, true),
            Ok(Resolution::WaitingPlayerWins)
        );
        assert_eq!(
            confirm_ended(TimeoutState::TimeoutClaimed, true),
            Ok(Resolution::WaitingPlayerWins)
        );

        assert_eq!(
            confirm_ended(TimeoutState::DrawOfferByMover, true),
            Err(WagerError::InvalidTimeoutState)
        );
        assert_eq!(
            confirm_ended(TimeoutState::DrawOfferByWaiting, false),
            Err(WagerError::InvalidTimeoutState)
        );
        assert_eq!(
            confirm_ended(TimeoutState::WinClaimed, false),
            Err(WagerError::InvalidTimeoutState)
        );
        assert_eq!(
            confirm_ended(TimeoutState::Idle, true),
            Err(WagerError::InvalidTimeoutState)
        );
        assert_eq!(
            confirm_ended(TimeoutState::Idle, false),
            Err(WagerError::InvalidTimeoutState)
        );
    }

    #[test]
    fn test_codes_match_wire_mapping() {
        assert_eq!(TimeoutState::Idle.code(), 0);
        assert_eq!(TimeoutState::WinClaimed.code(), 1);
        assert_eq!(TimeoutState::TimeoutClaimed.code(), 2);
        assert_eq!(TimeoutState::DrawOfferByWaiting.code(), -1);
        assert_eq!(TimeoutState::DrawOfferByMover.code(), -2);
    }
}
