//! Frame envelope shared by every protocol.
//!
//! ```text
//! [discriminator u8][type id u16 LE][body ...][checksum, C::WIDTH bytes LE]
//! ```
//!
//! The checksum covers the header and the body. Protocols only decide how the
//! body is laid out; header handling, integrity and dispatch live here.

use crate::checksum::{read_trailer, write_trailer, Checksum, Trailer};
use crate::error::{Error, Result};
use crate::layout::StaticLayout;
use crate::message::Message;
use crate::tlv::Tlv;
use tracing::warn;

/// Discriminator byte plus message type id.
pub const HEADER_LEN: usize = 3;

/// How a protocol sizes its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyLayout {
    /// Only set fields are written; length varies.
    Tagged,
    /// Every field has a reserved slot; length is `M::FIXED_LEN`.
    Fixed,
}

impl BodyLayout {
    /// Largest body `M` can produce under this layout.
    pub const fn max_body_len<M: Message>(self) -> usize {
        match self {
            BodyLayout::Tagged => M::MAX_TAGGED_LEN,
            BodyLayout::Fixed => M::FIXED_LEN,
        }
    }
}

/// A body encoding. Implementations are zero-sized markers used as type parameters.
pub trait Protocol {
    /// First byte of every frame written with this protocol.
    const DISCRIMINATOR: u8;
    const NAME: &'static str;
    const LAYOUT: BodyLayout;

    /// Body length `message` encodes to.
    fn body_len<M: Message>(message: &M) -> usize;

    /// Writes the body into `out`, returning the bytes used.
    fn encode_body<M: Message>(message: &M, out: &mut [u8]) -> Result<usize>;

    /// Builds a fresh message from `body`. No validators run.
    fn decode_body<M: Message>(body: &[u8]) -> Result<M>;
}

/// Writes `message` as a complete frame into `out`, returning the frame length.
///
/// The message is not validated here; see [`serialize`](crate::serialize).
pub fn encode_frame<M, C, P>(message: &M, checksum: &C, out: &mut [u8]) -> Result<usize>
where
    M: Message,
    C: Checksum,
    P: Protocol,
{
    let width = Trailer::<C>::WIDTH;
    let body_len = P::body_len(message);
    let required = HEADER_LEN + body_len + width;
    if out.len() < required {
        return Err(Error::overflow(required, out.len()));
    }

    out[0] = P::DISCRIMINATOR;
    out[1..HEADER_LEN].copy_from_slice(&M::TYPE_ID.to_le_bytes());
    let written = P::encode_body(message, &mut out[HEADER_LEN..HEADER_LEN + body_len])?;
    let covered = HEADER_LEN + written;

    let value = checksum.calculate(&out[..covered]);
    write_trailer(value, &mut out[covered..covered + width]);
    Ok(covered + width)
}

/// Decodes a frame written with protocol `P`.
///
/// Checks run in a fixed order: minimum length, protocol, static length,
/// integrity, type id, then the body. The message is built in a fresh instance
/// and only returned when every step succeeds. No validators run.
pub fn decode_frame<M, C, P>(frame: &[u8], checksum: &C) -> Result<M>
where
    M: Message,
    C: Checksum,
    P: Protocol,
{
    let width = Trailer::<C>::WIDTH;
    if frame.len() < HEADER_LEN + width {
        return Err(Error::invalid_frame("frame shorter than header and trailer"));
    }
    if frame[0] != P::DISCRIMINATOR {
        return Err(Error::invalid_frame("protocol discriminator mismatch"));
    }
    if P::LAYOUT == BodyLayout::Fixed && frame.len() != HEADER_LEN + M::FIXED_LEN + width {
        return Err(Error::invalid_frame("truncated static layout"));
    }

    let (covered, trailer) = frame.split_at(frame.len() - width);
    if let Err(err) = checksum.verify(read_trailer(trailer), covered) {
        warn!(
            schema = M::NAME,
            protocol = P::NAME,
            frame_len = frame.len(),
            error = %err,
            "frame failed integrity check"
        );
        return Err(err);
    }

    let type_id = u16::from_le_bytes([covered[1], covered[2]]);
    if type_id != M::TYPE_ID {
        return Err(Error::invalid_frame("message type id mismatch"));
    }

    P::decode_body(&covered[HEADER_LEN..])
}

/// Decodes a frame of either built-in protocol, chosen by its first byte.
pub fn decode_any<M, C>(frame: &[u8], checksum: &C) -> Result<M>
where
    M: Message,
    C: Checksum,
{
    match frame.first() {
        None => Err(Error::invalid_frame("empty frame")),
        Some(&d) if d == Tlv::DISCRIMINATOR => decode_frame::<M, C, Tlv>(frame, checksum),
        Some(&d) if d == StaticLayout::DISCRIMINATOR => {
            decode_frame::<M, C, StaticLayout>(frame, checksum)
        }
        Some(&discriminator) => Err(Error::UnknownProtocol { discriminator }),
    }
}
