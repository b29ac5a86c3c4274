use std::io::{Read, Write};

use rkyv::{Archive, Deserialize, Serialize, rancor};

use crate::board::{Coord, CoordError};
use crate::rules::MoveAddress;

pub const PROTOCOL_MAGIC: u32 = 0x4E4F584F; // "NOXO"
pub const PROTOCOL_VERSION: u16 = 1;
/// Frames are tiny; a longer length prefix means a corrupt stream.
pub const MAX_FRAME_LEN: usize = 256;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 65432;

/// One move as it crosses the wire: the address the sender just applied,
/// whether the round continues, and the sender's resulting active-subboard
/// constraint. The mark is never transmitted; each side infers it from whose
/// turn it was.
///
/// Components travel as raw bytes and are range-checked on the way out via
/// [`MoveRecord::address`] and [`MoveRecord::next_active`]; nothing decoded
/// from the peer becomes a coordinate without that check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct MoveRecord {
    pub outer_y: u8,
    pub outer_x: u8,
    pub inner_y: u8,
    pub inner_x: u8,
    pub continuing: bool,
    pub next_active: Option<(u8, u8)>,
}

impl MoveRecord {
    pub fn new(address: MoveAddress, continuing: bool, next_active: Option<Coord>) -> MoveRecord {
        MoveRecord {
            outer_y: address.outer.y() as u8,
            outer_x: address.outer.x() as u8,
            inner_y: address.inner.y() as u8,
            inner_x: address.inner.x() as u8,
            continuing,
            next_active: next_active.map(|c| (c.y() as u8, c.x() as u8)),
        }
    }

    pub fn address(&self) -> Result<MoveAddress, ProtocolError> {
        let outer = Coord::checked(self.outer_y, self.outer_x)?;
        let inner = Coord::checked(self.inner_y, self.inner_x)?;
        Ok(MoveAddress::new(outer, inner))
    }

    pub fn next_active(&self) -> Result<Option<Coord>, ProtocolError> {
        match self.next_active {
            Some((y, x)) => Ok(Some(Coord::checked(y, x)?)),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub enum Message {
    Move(MoveRecord),
    /// Orderly end of the session; the sender closes right after.
    Bye,
}

/// Every frame carries the magic and version so a stray connection from
/// something that is not a peer is rejected on the first read.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct Envelope {
    pub magic: u32,
    pub version: u16,
    pub message: Message,
}

impl Envelope {
    pub fn new(message: Message) -> Envelope {
        Envelope {
            magic: PROTOCOL_MAGIC,
            version: PROTOCOL_VERSION,
            message,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PROTOCOL_MAGIC && self.version == PROTOCOL_VERSION
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("encoding failed: {0}")]
    Encode(rancor::Error),
    #[error("decoding failed: {0}")]
    Decode(rancor::Error),
    #[error("bad magic or unsupported version")]
    BadHeader,
    #[error("frame length {0} outside limits")]
    BadLength(usize),
    #[error(transparent)]
    OutOfRange(#[from] CoordError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Writes one length-prefixed frame. The big-endian u32 prefix makes frames
/// survive arbitrary TCP segmentation; the stream carries nothing else, so
/// order on the wire is order of application.
pub fn write_frame<W: Write>(writer: &mut W, message: &Message) -> Result<(), ProtocolError> {
    let envelope = Envelope::new(message.clone());
    let bytes = rkyv::to_bytes::<rancor::Error>(&envelope).map_err(ProtocolError::Encode)?;
    if bytes.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::BadLength(bytes.len()));
    }
    writer.write_all(&(bytes.len() as u32).to_be_bytes())?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Reads one frame, blocking until it is complete. Anything that does not
/// match the grammar is an error, never a move.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Message, ProtocolError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len == 0 || len > MAX_FRAME_LEN {
        return Err(ProtocolError::BadLength(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;

    let envelope =
        rkyv::from_bytes::<Envelope, rancor::Error>(&payload).map_err(ProtocolError::Decode)?;
    if !envelope.is_valid() {
        return Err(ProtocolError::BadHeader);
    }
    Ok(envelope.message)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn record() -> MoveRecord {
        let address = MoveAddress::new(Coord::new(1, 2), Coord::new(0, 1));
        MoveRecord::new(address, true, Some(Coord::new(0, 1)))
    }

    #[test]
    fn move_frame_round_trip() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &Message::Move(record())).unwrap();

        let message = read_frame(&mut Cursor::new(&buf)).unwrap();
        match message {
            Message::Move(decoded) => {
                assert_eq!(decoded, record());
                let address = decoded.address().unwrap();
                assert_eq!(address.outer, Coord::new(1, 2));
                assert_eq!(address.inner, Coord::new(0, 1));
                assert_eq!(decoded.next_active().unwrap(), Some(Coord::new(0, 1)));
            }
            other => panic!("expected Move, got {:?}", other),
        }
    }

    #[test]
    fn bye_round_trip() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &Message::Bye).unwrap();
        assert_eq!(read_frame(&mut Cursor::new(&buf)).unwrap(), Message::Bye);
    }

    #[test]
    fn frames_survive_concatenation() {
        // Two frames back to back on one stream decode one by one.
        let mut buf = Vec::new();
        write_frame(&mut buf, &Message::Move(record())).unwrap();
        write_frame(&mut buf, &Message::Bye).unwrap();

        let mut cursor = Cursor::new(&buf);
        assert!(matches!(read_frame(&mut cursor).unwrap(), Message::Move(_)));
        assert_eq!(read_frame(&mut cursor).unwrap(), Message::Bye);
    }

    #[test]
    fn oversized_length_prefix_rejected() {
        let mut buf = Vec::from(u32::MAX.to_be_bytes());
        buf.extend_from_slice(&[0u8; 16]);
        match read_frame(&mut Cursor::new(&buf)) {
            Err(ProtocolError::BadLength(len)) => assert_eq!(len, u32::MAX as usize),
            other => panic!("expected BadLength, got {:?}", other),
        }
    }

    #[test]
    fn zero_length_frame_rejected() {
        let buf = 0u32.to_be_bytes();
        assert!(matches!(
            read_frame(&mut Cursor::new(&buf[..])),
            Err(ProtocolError::BadLength(0))
        ));
    }

    #[test]
    fn garbage_payload_rejected() {
        let mut buf = Vec::from(8u32.to_be_bytes());
        buf.extend_from_slice(&[0xAB; 8]);
        assert!(matches!(
            read_frame(&mut Cursor::new(&buf)),
            Err(ProtocolError::Decode(_)) | Err(ProtocolError::BadHeader)
        ));
    }

    #[test]
    fn wrong_magic_rejected() {
        let envelope = Envelope {
            magic: 0xDEADBEEF,
            version: PROTOCOL_VERSION,
            message: Message::Bye,
        };
        let bytes = rkyv::to_bytes::<rancor::Error>(&envelope).unwrap();
        let mut buf = Vec::from((bytes.len() as u32).to_be_bytes());
        buf.extend_from_slice(&bytes);

        assert!(matches!(
            read_frame(&mut Cursor::new(&buf)),
            Err(ProtocolError::BadHeader)
        ));
    }

    #[test]
    fn out_of_range_components_never_become_coordinates() {
        let mut decoded = record();
        decoded.outer_y = 7;
        assert!(matches!(
            decoded.address(),
            Err(ProtocolError::OutOfRange(_))
        ));

        let mut decoded = record();
        decoded.next_active = Some((0, 9));
        assert!(matches!(
            decoded.next_active(),
            Err(ProtocolError::OutOfRange(_))
        ));
    }

    #[test]
    fn truncated_frame_reports_eof() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &Message::Move(record())).unwrap();
        buf.truncate(buf.len() - 3);

        match read_frame(&mut Cursor::new(&buf)) {
            Err(ProtocolError::Io(e)) => {
                assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof);
            }
            other => panic!("expected Io, got {:?}", other),
        }
    }
}
