pub mod board;
pub mod net;
pub mod rules;
pub mod turn;

pub use board::{Board, Coord, CoordError, Player, SubBoard};
pub use net::{
    DEFAULT_HOST, DEFAULT_PORT, MAX_FRAME_LEN, Message, MoveRecord, PROTOCOL_MAGIC,
    PROTOCOL_VERSION, ProtocolError, Role, Session, SessionError, SessionEvent,
};
pub use rules::{
    Applied, EvalResult, IllegalMoveReason, Line, MoveAddress, MoveOutcome, WIN_LINES,
    evaluate_lines,
};
pub use turn::{MoveError, Round, RoundPhase, TurnCoordinator};
