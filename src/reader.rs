//! The decode side of the facade.

use crate::buffer::Buffer;
use crate::checksum::Checksum;
use crate::error::Result;
use crate::framing::{decode_any, decode_frame, Protocol};
use crate::message::{validate, Message};
use tracing::trace;

/// Decodes the frame held by `buffer` with the buffer's own protocol.
///
/// Integrity is always checked. Under [`DecodePolicy::Validate`](crate::DecodePolicy)
/// (the default) the decoded message is validated before it is returned.
pub fn deserialize<M, C, P, const N: usize>(buffer: &Buffer<M, C, P, N>) -> Result<M>
where
    M: Message,
    C: Checksum,
    P: Protocol,
{
    let message = decode_frame::<M, C, P>(buffer.as_bytes(), &buffer.checksum)?;
    finish(buffer, message)
}

/// Decodes the frame held by `buffer` with whichever built-in protocol its
/// discriminator names, regardless of the buffer's own protocol parameter.
pub fn deserialize_any<M, C, P, const N: usize>(buffer: &Buffer<M, C, P, N>) -> Result<M>
where
    M: Message,
    C: Checksum,
    P: Protocol,
{
    let message = decode_any::<M, C>(buffer.as_bytes(), &buffer.checksum)?;
    finish(buffer, message)
}

fn finish<M, C, P, const N: usize>(buffer: &Buffer<M, C, P, N>, message: M) -> Result<M>
where
    M: Message,
    C: Checksum,
    P: Protocol,
{
    if buffer.policy.validates() {
        validate(&message)?;
    }
    trace!(
        schema = M::NAME,
        frame_len = buffer.len,
        policy = ?buffer.policy,
        "deserialized frame"
    );
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::{NoChecksum, XorParity};
    use crate::error::Error;
    use crate::field::ScalarField;
    use crate::layout::StaticLayout;
    use crate::message::no_cross_check;
    use crate::policy::DecodePolicy;
    use crate::tlv::Tlv;
    use crate::validation::Positive;
    use crate::writer::serialize;

    crate::message! {
        struct Level {
            type_id: 0x0D,
            rules: no_cross_check,
            fields {
                1 => depth: ScalarField<i8, Positive> = Positive,
            }
        }
    }

    // A negative depth on the wire, no trailer.
    const NEGATIVE: [u8; 7] = [0x01, 0x0D, 0x00, 1, 1, 0, 0xFD];

    #[test]
    fn decoded_data_is_validated_by_default() {
        let mut buffer = crate::get_buffer!(Level, NoChecksum, Tlv);
        buffer.load(&NEGATIVE).unwrap();
        assert_eq!(
            deserialize(&buffer).unwrap_err().validator(),
            Some("positive")
        );
    }

    #[test]
    fn trust_policy_skips_validation() {
        let mut buffer =
            crate::get_buffer!(Level, NoChecksum, Tlv).with_policy(DecodePolicy::Trust);
        buffer.load(&NEGATIVE).unwrap();
        let level = deserialize(&buffer).unwrap();
        assert_eq!(level.depth.get(), -3);
        assert!(validate(&level).is_err());
    }

    #[test]
    fn integrity_is_checked_under_every_policy() {
        let mut buffer =
            crate::get_buffer!(Level, XorParity, Tlv).with_policy(DecodePolicy::Trust);
        buffer.load(&[0x01, 0x0D, 0x00, 1, 1, 0, 0x05, 0x00]).unwrap();
        assert!(matches!(
            deserialize(&buffer),
            Err(Error::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn any_dispatches_on_discriminator() {
        let mut level = Level::default();
        level.depth.set(9).unwrap();

        let mut fixed = crate::get_buffer!(Level, NoChecksum, StaticLayout);
        serialize(&mut fixed, &level).unwrap();

        // A tagged buffer with room for the static frame still decodes it.
        let mut tagged = crate::get_buffer!(Level, NoChecksum, Tlv);
        tagged.load(fixed.as_bytes()).unwrap();
        assert!(deserialize(&tagged).unwrap_err().is_decode());
        assert_eq!(deserialize_any(&tagged).unwrap(), level);
    }
}
