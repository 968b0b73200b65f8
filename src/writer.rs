//! The encode side of the facade.

use crate::buffer::Buffer;
use crate::checksum::Checksum;
use crate::error::Result;
use crate::framing::{encode_frame, Protocol};
use crate::message::{validate, Message};
use tracing::trace;

/// Validates `message` and writes it as one frame into `buffer`.
///
/// Nothing unvalidated ever reaches the wire: on any failure, validation or
/// encoding, the buffer is left empty and the error is returned.
pub fn serialize<M, C, P, const N: usize>(buffer: &mut Buffer<M, C, P, N>, message: &M) -> Result<()>
where
    M: Message,
    C: Checksum,
    P: Protocol,
{
    buffer.len = 0;
    validate(message)?;
    let len = encode_frame::<M, C, P>(message, &buffer.checksum, &mut buffer.bytes)?;
    buffer.len = len;
    trace!(
        schema = M::NAME,
        protocol = P::NAME,
        frame_len = len,
        "serialized frame"
    );
    Ok(())
}
