use soroban_sdk::{contracttype, Address, Bytes, String};

/// Board snapshot as produced by the rules engine.
///
/// The core never looks inside `board`; it only relies on `move_count`
/// growing by one per applied move so that signed snapshots can be ordered.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BoardState {
    pub board: Bytes,
    pub move_count: u32,
}

/// Pending dispute marker.
///
/// Numeric codes (as published in events):
///   0 = Idle, 1 = WinClaimed, 2 = TimeoutClaimed,
///  -1 = DrawOfferByWaiting, -2 = DrawOfferByMover
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimeoutState {
    Idle,
    WinClaimed,
    TimeoutClaimed,
    DrawOfferByWaiting,
    DrawOfferByMover,
}

impl TimeoutState {
    pub fn code(self) -> i32 {
        match self {
            TimeoutState::Idle => 0,
            TimeoutState::WinClaimed => 1,
            TimeoutState::TimeoutClaimed => 2,
            TimeoutState::DrawOfferByWaiting => -1,
            TimeoutState::DrawOfferByMover => -2,
        }
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Game {
    pub player1: Address,
    pub player2: Option<Address>,
    pub player1_alias: String,
    pub player2_alias: String,
    pub next_player: Option<Address>,
    pub winner: Option<Address>,
    pub ended: bool,
    // Escrow: pot + player1_winnings + player2_winnings == deposited
    // until winnings are withdrawn.
    pub pot: i128,
    pub deposited: i128,
    pub player1_winnings: i128,
    pub player2_winnings: i128,
    /// Move time budget in minutes.
    pub turn_time: u32,
    pub timeout_started: u64,
    pub timeout_state: TimeoutState,
    pub state: BoardState,
}

impl Game {
    pub fn is_participant(&self, player: &Address) -> bool {
        *player == self.player1 || self.player2.as_ref() == Some(player)
    }

    pub fn opponent_of(&self, player: &Address) -> Option<Address> {
        let player2 = self.player2.clone()?;
        if *player == self.player1 {
            Some(player2)
        } else if *player == player2 {
            Some(self.player1.clone())
        } else {
            None
        }
    }

    /// True when `player` is the side to move.
    pub fn is_mover(&self, player: &Address) -> bool {
        self.next_player.as_ref() == Some(player)
    }

    pub fn waiting_player(&self) -> Option<Address> {
        let mover = self.next_player.as_ref()?;
        self.opponent_of(mover)
    }

    pub fn turn_time_secs(&self) -> u64 {
        (self.turn_time as u64) * 60
    }
}
