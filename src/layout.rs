//! Static (fixed-offset) body encoding.
//!
//! The body is a set/unset bitmap followed by one slot per field in
//! declaration order. Every field always occupies its worst-case width, so
//! the body length of a message type never changes and any field can be read
//! at a known offset.

use crate::error::{Error, Result};
use crate::field::Field;
use crate::framing::{BodyLayout, Protocol};
use crate::message::{bitmap_len, Message};

/// The static protocol, discriminator `0x02`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticLayout;

impl Protocol for StaticLayout {
    const DISCRIMINATOR: u8 = 0x02;
    const NAME: &'static str = "static";
    const LAYOUT: BodyLayout = BodyLayout::Fixed;

    fn body_len<M: Message>(_message: &M) -> usize {
        M::FIXED_LEN
    }

    fn encode_body<M: Message>(message: &M, out: &mut [u8]) -> Result<usize> {
        encode_fields(message, out)
    }

    fn decode_body<M: Message>(body: &[u8]) -> Result<M> {
        let mut message = M::empty();
        decode_fields(body, &mut message)?;
        Ok(message)
    }
}

/// Writes the bitmap and every slot; unset slots are zero.
pub fn encode_fields<M: Message>(message: &M, out: &mut [u8]) -> Result<usize> {
    if out.len() < M::FIXED_LEN {
        return Err(Error::overflow(M::FIXED_LEN, out.len()));
    }
    let body = &mut out[..M::FIXED_LEN];
    body.fill(0);
    let (bitmap, slots) = body.split_at_mut(bitmap_len(M::FIELD_COUNT));

    let mut index = 0;
    let mut offset = 0;
    message.visit(&mut |field: &dyn Field| {
        let width = field.fixed_width();
        if field.is_set() {
            bitmap[index / 8] |= 1 << (index % 8);
            field.encode_fixed(&mut slots[offset..offset + width])?;
        }
        index += 1;
        offset += width;
        Ok(())
    })?;
    Ok(M::FIXED_LEN)
}

/// Stages every field whose bitmap bit is set.
pub fn decode_fields<M: Message>(body: &[u8], message: &mut M) -> Result<()> {
    if body.len() != M::FIXED_LEN {
        return Err(Error::invalid_frame("truncated static layout"));
    }
    let (bitmap, slots) = body.split_at(bitmap_len(M::FIELD_COUNT));
    if M::FIELD_COUNT % 8 != 0 {
        let spare = !0u8 << (M::FIELD_COUNT % 8);
        if bitmap[bitmap.len() - 1] & spare != 0 {
            return Err(Error::invalid_frame("bitmap marks a field beyond the schema"));
        }
    }

    let mut index = 0;
    let mut offset = 0;
    message.visit_mut(&mut |field: &mut dyn Field| {
        let width = field.fixed_width();
        if bitmap[index / 8] & (1 << (index % 8)) != 0 {
            field.decode_fixed(&slots[offset..offset + width])?;
        }
        index += 1;
        offset += width;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::MapField;
    use crate::field::{ScalarField, StringField};
    use crate::message::no_cross_check;
    use crate::validation::NoValidation;

    crate::message! {
        struct Gauge {
            type_id: 9,
            rules: no_cross_check,
            fields {
                3 => reading: ScalarField<u16, NoValidation> = NoValidation,
                1 => unit: StringField<3, NoValidation> = NoValidation,
                8 => limits: MapField<u8, i8, NoValidation, NoValidation, 2> = (NoValidation, NoValidation),
            }
        }
    }

    #[test]
    fn slots_sit_at_fixed_offsets() {
        // bitmap(1) + u16(2) + string(2 + 3) + map(2 + 2 * 2)
        assert_eq!(Gauge::FIXED_LEN, 1 + 2 + 5 + 6);

        let mut gauge = Gauge::default();
        gauge.reading.set(0x0304).unwrap();
        gauge.limits.add(1, -1).unwrap();
        let mut out = [0xEEu8; Gauge::FIXED_LEN];
        assert_eq!(encode_fields(&gauge, &mut out).unwrap(), Gauge::FIXED_LEN);
        assert_eq!(
            out,
            [
                0b101, // reading and limits set, unit unset
                0x04, 0x03, // reading
                0, 0, 0, 0, 0, // unit slot zeroed
                1, 0, 1, 0xFF, 0, 0, // one entry, spare entry zeroed
            ]
        );
    }

    #[test]
    fn decode_restores_only_flagged_fields() {
        let mut gauge = Gauge::default();
        gauge.unit.set("kPa").unwrap();
        let mut out = [0u8; Gauge::FIXED_LEN];
        encode_fields(&gauge, &mut out).unwrap();

        let mut decoded = Gauge::empty();
        decode_fields(&out, &mut decoded).unwrap();
        assert_eq!(decoded, gauge);
        assert!(!decoded.reading.is_set());
        assert_eq!(decoded.unit.get(), "kPa");
    }

    #[test]
    fn wrong_length_is_rejected() {
        let out = [0u8; Gauge::FIXED_LEN + 1];
        let mut gauge = Gauge::empty();
        assert!(matches!(
            decode_fields(&out, &mut gauge),
            Err(Error::InvalidFrame {
                reason: "truncated static layout"
            })
        ));
        assert!(decode_fields(&out[..Gauge::FIXED_LEN - 1], &mut gauge).is_err());
    }

    #[test]
    fn stray_bitmap_bits_are_rejected() {
        let mut out = [0u8; Gauge::FIXED_LEN];
        out[0] = 0b1000;
        let mut gauge = Gauge::empty();
        assert!(decode_fields(&out, &mut gauge).unwrap_err().is_decode());
    }

    #[test]
    fn short_output_is_overflow() {
        let gauge = Gauge::default();
        let mut out = [0u8; 4];
        assert!(matches!(
            encode_fields(&gauge, &mut out),
            Err(Error::BufferOverflow { .. })
        ));
    }
}
