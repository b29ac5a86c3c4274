//! Move validation and application, with one line evaluator shared by the
//! inner grids and the outer board.

use crate::board::{Board, Coord, Player};

pub type Line = [Coord; 3];

/// The 8 canonical win combinations, identical at both nesting levels.
/// Fixed order: the first fully-matching line owns the grid.
pub const WIN_LINES: [Line; 8] = [
    [Coord::new(0, 0), Coord::new(0, 1), Coord::new(0, 2)],
    [Coord::new(0, 0), Coord::new(1, 0), Coord::new(2, 0)],
    [Coord::new(1, 0), Coord::new(1, 1), Coord::new(1, 2)],
    [Coord::new(0, 1), Coord::new(1, 1), Coord::new(2, 1)],
    [Coord::new(2, 0), Coord::new(2, 1), Coord::new(2, 2)],
    [Coord::new(0, 2), Coord::new(1, 2), Coord::new(2, 2)],
    [Coord::new(0, 0), Coord::new(1, 1), Coord::new(2, 2)],
    [Coord::new(0, 2), Coord::new(1, 1), Coord::new(2, 0)],
];

/// Why a candidate move was rejected. Display strings double as the status
/// messages shown to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IllegalMoveReason {
    #[error("This square is already taken")]
    AlreadyOccupied,
    #[error("You cannot play in this square")]
    WrongSubBoard,
    #[error("This grid has already been played")]
    SubBoardAlreadyDecided,
}

/// A candidate move: the sub-board to play in and the cell within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MoveAddress {
    pub outer: Coord,
    pub inner: Coord,
}

impl MoveAddress {
    pub fn new(outer: Coord, inner: Coord) -> MoveAddress {
        MoveAddress { outer, inner }
    }
}

/// Result of evaluating one 3x3 grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalResult {
    Open,
    Won(Player, Line),
    Drawn,
}

/// Evaluates a 3x3 grid through two lookups: `owner` yields the mark
/// claiming a slot (a cell's mark, or a sub-board's winner one level up) and
/// `decided` whether the slot is terminal (occupied, or played; a drawn
/// sub-board counts as decided the same as a won one).
///
/// Pure and deterministic: the same configuration always evaluates the same
/// way, however often it is called.
pub fn evaluate_lines<O, D>(owner: O, decided: D) -> EvalResult
where
    O: Fn(Coord) -> Option<Player>,
    D: Fn(Coord) -> bool,
{
    for line in WIN_LINES {
        if let Some(first) = owner(line[0]) {
            if line.iter().all(|&at| owner(at) == Some(first)) {
                return EvalResult::Won(first, line);
            }
        }
    }

    if Coord::all().all(decided) {
        EvalResult::Drawn
    } else {
        EvalResult::Open
    }
}

/// What an accepted move did to the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Continue,
    /// The target sub-board was won by this move; the round continues.
    SubBoardWon { sub: Coord, by: Player },
    /// The outer board was won, with the winning outer line.
    BoardWon { by: Player, line: Line },
    /// Every sub-board is decided and no outer line matched.
    Draw,
}

/// An applied move plus the constraint the opponent now plays under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub outcome: MoveOutcome,
    pub next_active: Option<Coord>,
}

/// Checks the three legality predicates in their fixed order and reports the
/// first failure, so rejection messages are deterministic.
pub fn legal(board: &Board, address: MoveAddress) -> Result<(), IllegalMoveReason> {
    let sub = board.sub(address.outer);
    if sub.cell(address.inner).is_some() {
        return Err(IllegalMoveReason::AlreadyOccupied);
    }
    if let Some(active) = board.active_subboard() {
        if active != address.outer {
            return Err(IllegalMoveReason::WrongSubBoard);
        }
    }
    if sub.played() {
        return Err(IllegalMoveReason::SubBoardAlreadyDecided);
    }
    Ok(())
}

/// Applies a move [`legal`] has accepted: marks the cell, recomputes the
/// containing sub-board's status, then the outer board's status over the
/// sub-board winners, and derives the next active-subboard constraint.
///
/// This is the single apply path: local input and replayed peer moves both
/// go through here, so two peers fed the same move sequence converge on the
/// same board.
pub fn apply(board: &mut Board, address: MoveAddress, player: Player) -> Applied {
    let MoveAddress { outer, inner } = address;
    board.sub_mut(outer).set_cell(inner, player);

    let sub_eval = {
        let sub = board.sub(outer);
        evaluate_lines(|at| sub.cell(at), |at| sub.cell(at).is_some())
    };
    let sub_winner = match sub_eval {
        EvalResult::Won(by, _) => {
            board.sub_mut(outer).set_status(true, Some(by));
            Some(by)
        }
        EvalResult::Drawn => {
            board.sub_mut(outer).set_status(true, None);
            None
        }
        EvalResult::Open => None,
    };

    let board_eval = evaluate_lines(|at| board.sub(at).winner(), |at| board.sub(at).played());
    let (outcome, next_active) = match board_eval {
        EvalResult::Won(by, line) => {
            board.set_status(true, Some(by));
            (MoveOutcome::BoardWon { by, line }, None)
        }
        EvalResult::Drawn => {
            board.set_status(true, None);
            (MoveOutcome::Draw, None)
        }
        EvalResult::Open => {
            // The opponent is sent to the sub-board named by the inner
            // coordinate, unless that sub-board is already decided.
            let next = if board.sub(inner).played() {
                None
            } else {
                Some(inner)
            };
            let outcome = match sub_winner {
                Some(by) => MoveOutcome::SubBoardWon { sub: outer, by },
                None => MoveOutcome::Continue,
            };
            (outcome, next)
        }
    };

    board.set_active(next_active);
    log::debug!(
        "{} played {}/{} -> {:?}, next active {:?}",
        player,
        outer,
        inner,
        outcome,
        next_active
    );
    Applied {
        outcome,
        next_active,
    }
}
