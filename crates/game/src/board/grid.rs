use super::{Coord, Player};

/// One of the nine inner 3x3 grids. `played` and `winner` are derived from
/// the cells and recomputed by the rules engine right after a cell changes;
/// `winner.is_some()` implies `played`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubBoard {
    cells: [[Option<Player>; 3]; 3],
    played: bool,
    winner: Option<Player>,
}

impl SubBoard {
    pub fn cell(&self, at: Coord) -> Option<Player> {
        self.cells[at.y()][at.x()]
    }

    /// Terminal: won or drawn. Immutable once set.
    pub fn played(&self) -> bool {
        self.played
    }

    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// A cell is set at most once per round.
    pub(crate) fn set_cell(&mut self, at: Coord, player: Player) {
        debug_assert!(self.cells[at.y()][at.x()].is_none());
        self.cells[at.y()][at.x()] = Some(player);
    }

    pub(crate) fn set_status(&mut self, played: bool, winner: Option<Player>) {
        debug_assert!(winner.is_none() || played);
        self.played = played;
        self.winner = winner;
    }
}

/// The outer 3x3 grid of sub-boards, with the same derived status shape one
/// level up, plus the active-subboard constraint: `Some(c)` restricts the
/// next move to sub-board `c`, `None` allows any unplayed sub-board.
///
/// Mutated exclusively through the rules engine; a fresh board starts a
/// round and the value is discarded once terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    subs: [[SubBoard; 3]; 3],
    played: bool,
    winner: Option<Player>,
    active: Option<Coord>,
}

impl Board {
    pub fn new() -> Board {
        Board::default()
    }

    pub fn sub(&self, at: Coord) -> &SubBoard {
        &self.subs[at.y()][at.x()]
    }

    pub fn played(&self) -> bool {
        self.played
    }

    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    pub fn active_subboard(&self) -> Option<Coord> {
        self.active
    }

    pub(crate) fn sub_mut(&mut self, at: Coord) -> &mut SubBoard {
        &mut self.subs[at.y()][at.x()]
    }

    pub(crate) fn set_status(&mut self, played: bool, winner: Option<Player>) {
        debug_assert!(winner.is_none() || played);
        // A board-level winner is terminal and never changes.
        debug_assert!(self.winner.is_none() || self.winner == winner);
        self.played = played;
        self.winner = winner;
    }

    pub(crate) fn set_active(&mut self, active: Option<Coord>) {
        self.active = active;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_board_is_open_everywhere() {
        let board = Board::new();
        assert!(!board.played());
        assert_eq!(board.winner(), None);
        assert_eq!(board.active_subboard(), None);
        for outer in Coord::all() {
            let sub = board.sub(outer);
            assert!(!sub.played());
            assert_eq!(sub.winner(), None);
            for inner in Coord::all() {
                assert_eq!(sub.cell(inner), None);
            }
        }
    }

    #[test]
    fn sub_board_status_tracks_winner() {
        let mut sub = SubBoard::default();
        sub.set_cell(Coord::new(1, 1), Player::Cross);
        assert_eq!(sub.cell(Coord::new(1, 1)), Some(Player::Cross));
        assert!(!sub.played());

        sub.set_status(true, Some(Player::Cross));
        assert!(sub.played());
        assert_eq!(sub.winner(), Some(Player::Cross));
    }
}
