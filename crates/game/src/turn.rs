//! Turn ownership and round lifecycle on top of the rules engine.

use crate::board::{Board, Coord, Player};
use crate::net::SessionError;
use crate::rules::{self, Applied, IllegalMoveReason, MoveAddress, MoveOutcome};

/// Why a submitted move was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// The round is already decided; no further moves are accepted.
    #[error("The game is already over")]
    RoundOver,
    #[error(transparent)]
    Illegal(#[from] IllegalMoveReason),
}

/// Tracks whose turn it is and where they are allowed to play. Advances only
/// after a move has been accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnCoordinator {
    current_player: Player,
    active_subboard: Option<Coord>,
}

impl Default for TurnCoordinator {
    fn default() -> Self {
        TurnCoordinator {
            current_player: Player::Cross,
            active_subboard: None,
        }
    }
}

impl TurnCoordinator {
    pub fn new() -> TurnCoordinator {
        TurnCoordinator::default()
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn active_subboard(&self) -> Option<Coord> {
        self.active_subboard
    }

    pub fn advance(&mut self, next_active: Option<Coord>) {
        self.current_player = self.current_player.switch();
        self.active_subboard = next_active;
    }
}

/// Where a round stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    InProgress,
    Won(Player),
    Drawn,
}

/// One round of play: a fresh board plus turn state. All mutation, local
/// input and moves replayed from the peer alike, funnels through
/// [`Round::submit`], so both sides of a networked round share one apply
/// path.
///
/// Once the round is over the value is discarded; a new round starts from
/// `Round::new()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Round {
    board: Board,
    turn: TurnCoordinator,
}

impl Round {
    pub fn new() -> Round {
        Round::default()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Player {
        self.turn.current_player()
    }

    pub fn phase(&self) -> RoundPhase {
        if let Some(winner) = self.board.winner() {
            RoundPhase::Won(winner)
        } else if self.board.played() {
            RoundPhase::Drawn
        } else {
            RoundPhase::InProgress
        }
    }

    pub fn is_over(&self) -> bool {
        self.board.played()
    }

    /// Validates and applies a move for the player whose turn it is. A
    /// rejected move leaves the round untouched, including anything
    /// submitted after the round is decided.
    pub fn submit(&mut self, address: MoveAddress) -> Result<MoveOutcome, MoveError> {
        if self.is_over() {
            return Err(MoveError::RoundOver);
        }
        rules::legal(&self.board, address)?;

        let player = self.turn.current_player();
        let Applied {
            outcome,
            next_active,
        } = rules::apply(&mut self.board, address, player);
        self.turn.advance(next_active);
        Ok(outcome)
    }

    /// Replays a record received from the peer through the same apply path
    /// as local input. The sender ran the same checks before transmitting,
    /// so any rejection here means the two boards diverged and the session
    /// has to close.
    pub fn replay(&mut self, address: MoveAddress) -> Result<MoveOutcome, SessionError> {
        self.submit(address).map_err(SessionError::ProtocolViolation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: u8, x: u8) -> Coord {
        Coord::new(y, x)
    }

    fn mv(oy: u8, ox: u8, iy: u8, ix: u8) -> MoveAddress {
        MoveAddress::new(at(oy, ox), at(iy, ix))
    }

    #[test]
    fn turn_alternates_on_accepted_moves_only() {
        let mut round = Round::new();
        assert_eq!(round.current_player(), Player::Cross);

        round.submit(mv(1, 1, 1, 1)).unwrap();
        assert_eq!(round.current_player(), Player::Nought);
        assert_eq!(round.board().active_subboard(), Some(at(1, 1)));

        // Rejected move: turn and constraint unchanged.
        assert_eq!(
            round.submit(mv(1, 1, 1, 1)),
            Err(MoveError::Illegal(IllegalMoveReason::AlreadyOccupied))
        );
        assert_eq!(round.current_player(), Player::Nought);
        assert_eq!(round.board().active_subboard(), Some(at(1, 1)));
    }

    #[test]
    fn coordinator_state_mirrors_board_constraint() {
        let mut round = Round::new();
        round.submit(mv(0, 0, 2, 2)).unwrap();
        assert_eq!(round.turn.active_subboard(), Some(at(2, 2)));
        assert_eq!(
            round.turn.active_subboard(),
            round.board().active_subboard()
        );
    }

    /// Crosses takes the top row of sub-boards, which decides the board.
    fn drive_to_cross_win(round: &mut Round) {
        for outer in [at(0, 0), at(0, 1), at(0, 2)] {
            for inner in [at(0, 0), at(0, 1), at(0, 2)] {
                rules::apply(&mut round.board, MoveAddress::new(outer, inner), Player::Cross);
            }
        }
    }

    #[test]
    fn terminal_status_is_monotonic() {
        // Drive the board straight to an outer win, then check the derived
        // status survives further evaluation unchanged.
        let mut round = Round::new();
        drive_to_cross_win(&mut round);

        assert_eq!(round.phase(), RoundPhase::Won(Player::Cross));
        assert!(round.is_over());

        let again = rules::evaluate_lines(
            |c| round.board.sub(c).winner(),
            |c| round.board.sub(c).played(),
        );
        assert!(matches!(again, rules::EvalResult::Won(Player::Cross, _)));
        assert_eq!(round.board.winner(), Some(Player::Cross));
        assert!(round.board.played());
    }

    #[test]
    fn finished_round_rejects_further_moves() {
        let mut round = Round::new();
        drive_to_cross_win(&mut round);
        assert!(round.is_over());

        // Moves arriving after the win, whether typed locally or replayed
        // from the peer, bounce off without touching the board.
        let snapshot = round.clone();
        assert_eq!(round.submit(mv(2, 2, 1, 1)), Err(MoveError::RoundOver));
        assert!(matches!(
            round.replay(mv(2, 2, 1, 1)),
            Err(SessionError::ProtocolViolation(MoveError::RoundOver))
        ));
        assert_eq!(round, snapshot);
        assert_eq!(round.phase(), RoundPhase::Won(Player::Cross));
    }

    #[test]
    fn phase_reports_winner() {
        let mut round = Round::new();
        assert_eq!(round.phase(), RoundPhase::InProgress);
        round.submit(mv(1, 1, 1, 1)).unwrap();
        assert_eq!(round.phase(), RoundPhase::InProgress);
    }
}
