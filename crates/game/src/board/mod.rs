mod cell;
mod grid;

pub use cell::{Coord, CoordError, Player};
pub use grid::{Board, SubBoard};
