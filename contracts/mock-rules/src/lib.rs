#![no_std]

//! # Mock Rules Engine
//!
//! Stand-in board engine for local networks and tests. It tracks pieces on
//! a 64-square board and enforces turn colour, piece ownership and target
//! occupancy. It does **not** implement chess movement rules.
//!
//! Square `n` is rank `n / 8`, file `n % 8`; white starts on ranks 0-1.
//! A square byte is 0 when empty, otherwise a piece kind (1-6) with bit 3
//! set for black.

use soroban_sdk::{contract, contracterror, contractimpl, contracttype, Bytes, Env};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BoardState {
    pub board: Bytes,
    pub move_count: u32,
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum RulesError {
    MalformedBoard = 1,
    OffBoard = 2,
    EmptySquare = 3,
    NotYourPiece = 4,
    OwnPieceOnTarget = 5,
    KingCapture = 6,
    NoKingThere = 7,
}

pub const SQUARES: u32 = 64;

pub const PAWN: u8 = 1;
pub const KNIGHT: u8 = 2;
pub const BISHOP: u8 = 3;
pub const ROOK: u8 = 4;
pub const QUEEN: u8 = 5;
pub const KING: u8 = 6;
pub const BLACK: u8 = 8;

const BACK_RANK: [u8; 8] = [ROOK, KNIGHT, BISHOP, QUEEN, KING, BISHOP, KNIGHT, ROOK];

#[contract]
pub struct MockRules;

#[contractimpl]
impl MockRules {
    pub fn initial_state(env: Env) -> BoardState {
        let mut squares = [0u8; SQUARES as usize];
        for file in 0..8 {
            squares[file] = BACK_RANK[file];
            squares[8 + file] = PAWN;
            squares[48 + file] = PAWN | BLACK;
            squares[56 + file] = BACK_RANK[file] | BLACK;
        }
        BoardState {
            board: Bytes::from_array(&env, &squares),
            move_count: 0,
        }
    }

    /// Move the piece on `from` to `to`, capturing whatever stands there.
    pub fn apply_move(
        _env: Env,
        state: BoardState,
        from: u32,
        to: u32,
        mover_is_white: bool,
    ) -> Result<BoardState, RulesError> {
        if state.board.len() != SQUARES {
            return Err(RulesError::MalformedBoard);
        }
        if from >= SQUARES || to >= SQUARES || from == to {
            return Err(RulesError::OffBoard);
        }

        let piece = state.board.get_unchecked(from);
        if piece == 0 {
            return Err(RulesError::EmptySquare);
        }
        if is_white(piece) != mover_is_white {
            return Err(RulesError::NotYourPiece);
        }

        let target = state.board.get_unchecked(to);
        if target != 0 {
            if is_white(target) == mover_is_white {
                return Err(RulesError::OwnPieceOnTarget);
            }
            if kind(target) == KING {
                return Err(RulesError::KingCapture);
            }
        }

        let mut board = state.board;
        board.set(to, piece);
        board.set(from, 0);
        Ok(BoardState {
            board,
            move_count: state.move_count + 1,
        })
    }

    /// Adjacency approximation: the king on `king_position` counts as in
    /// check when an enemy piece stands on any neighbouring square.
    pub fn is_in_check(
        _env: Env,
        state: BoardState,
        king_position: u32,
        white: bool,
    ) -> Result<bool, RulesError> {
        if state.board.len() != SQUARES {
            return Err(RulesError::MalformedBoard);
        }
        if king_position >= SQUARES {
            return Err(RulesError::OffBoard);
        }
        let king = state.board.get_unchecked(king_position);
        if kind(king) != KING || is_white(king) != white {
            return Err(RulesError::NoKingThere);
        }

        let rank = (king_position / 8) as i32;
        let file = (king_position % 8) as i32;
        for dr in -1..=1i32 {
            for df in -1..=1i32 {
                if dr == 0 && df == 0 {
                    continue;
                }
                let (r, f) = (rank + dr, file + df);
                if !(0..8).contains(&r) || !(0..8).contains(&f) {
                    continue;
                }
                let piece = state.board.get_unchecked((r * 8 + f) as u32);
                if piece != 0 && is_white(piece) != white {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

fn is_white(piece: u8) -> bool {
    piece & BLACK == 0
}

fn kind(piece: u8) -> u8 {
    piece & !BLACK
}
