mod protocol;
mod session;

pub use protocol::{
    DEFAULT_HOST, DEFAULT_PORT, Envelope, MAX_FRAME_LEN, Message, MoveRecord, PROTOCOL_MAGIC,
    PROTOCOL_VERSION, ProtocolError, read_frame, write_frame,
};
pub use session::{Role, Session, SessionError, SessionEvent};
