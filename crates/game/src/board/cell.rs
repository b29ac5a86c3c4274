use std::fmt;

use rkyv::{Archive, Deserialize, Serialize};

/// One of the two marks. The host side of a networked round always plays
/// `Cross`; `Nought` goes second.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Archive,
    Serialize,
    Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub enum Player {
    Cross,
    Nought,
}

impl Player {
    /// The opposite player. Involutive: `p.switch().switch() == p`.
    pub fn switch(self) -> Player {
        match self {
            Player::Cross => Player::Nought,
            Player::Nought => Player::Cross,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Player::Cross => 'X',
            Player::Nought => 'O',
        }
    }

    pub fn long_name(self) -> &'static str {
        match self {
            Player::Cross => "Crosses",
            Player::Nought => "Noughts",
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("coordinate ({y}, {x}) out of range")]
pub struct CoordError {
    pub y: u8,
    pub x: u8,
}

/// A row/column pair addressing one slot of a 3x3 grid. Both components are
/// always in [0, 2]; a `Coord` cannot be constructed otherwise.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Archive,
    Serialize,
    Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct Coord {
    y: u8,
    x: u8,
}

impl Coord {
    /// Panics if either component is outside [0, 2]. Use [`Coord::checked`]
    /// for untrusted input.
    pub const fn new(y: u8, x: u8) -> Coord {
        assert!(y < 3 && x < 3);
        Coord { y, x }
    }

    pub const fn checked(y: u8, x: u8) -> Result<Coord, CoordError> {
        if y < 3 && x < 3 {
            Ok(Coord { y, x })
        } else {
            Err(CoordError { y, x })
        }
    }

    pub const fn y(self) -> usize {
        self.y as usize
    }

    pub const fn x(self) -> usize {
        self.x as usize
    }

    /// All nine coordinates in row-major order.
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..3u8).flat_map(|y| (0..3u8).map(move |x| Coord { y, x }))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.y, self.x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_is_involutive() {
        for player in [Player::Cross, Player::Nought] {
            assert_eq!(player.switch().switch(), player);
        }
        assert_eq!(Player::Cross.switch(), Player::Nought);
    }

    #[test]
    fn coord_range_check() {
        assert!(Coord::checked(2, 2).is_ok());
        assert_eq!(Coord::checked(3, 0), Err(CoordError { y: 3, x: 0 }));
        assert_eq!(Coord::checked(0, 255), Err(CoordError { y: 0, x: 255 }));
    }

    #[test]
    fn all_coords_row_major() {
        let coords: Vec<Coord> = Coord::all().collect();
        assert_eq!(coords.len(), 9);
        assert_eq!(coords[0], Coord::new(0, 0));
        assert_eq!(coords[3], Coord::new(1, 0));
        assert_eq!(coords[8], Coord::new(2, 2));
    }
}
