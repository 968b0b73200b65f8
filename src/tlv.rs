//! Tagged (TLV) body encoding.
//!
//! Each set field becomes `[tag u8][len u16 LE][value]`; unset fields are
//! omitted. Frames are therefore only as long as the data they carry.

use crate::error::{Error, Result};
use crate::field::{Field, MAX_PREFIXED_LEN};
use crate::framing::{BodyLayout, Protocol};
use crate::message::Message;
use tracing::debug;

/// Tag byte plus little-endian length.
pub const FIELD_HEADER_LEN: usize = 3;

/// The tagged protocol, discriminator `0x01`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Tlv;

impl Protocol for Tlv {
    const DISCRIMINATOR: u8 = 0x01;
    const NAME: &'static str = "tlv";
    const LAYOUT: BodyLayout = BodyLayout::Tagged;

    fn body_len<M: Message>(message: &M) -> usize {
        body_len(message)
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

/// Encoded length of the set fields of `message`.
pub fn body_len<M: Message>(message: &M) -> usize {
    let mut total = 0;
    message
        .visit(&mut |field: &dyn Field| {
            if field.is_set() {
                total += FIELD_HEADER_LEN + field.compact_len();
            }
            Ok(())
        })
        .ok();
    total
}

/// Writes every set field, returning the number of bytes used.
pub fn encode_fields<M: Message>(message: &M, out: &mut [u8]) -> Result<usize> {
    let required = body_len(message);
    if out.len() < required {
        return Err(Error::overflow(required, out.len()));
    }
    let mut pos = 0;
    message.visit(&mut |field: &dyn Field| {
        if !field.is_set() {
            return Ok(());
        }
        let len = field.compact_len();
        if len > MAX_PREFIXED_LEN {
            return Err(Error::overflow(len, MAX_PREFIXED_LEN));
        }
        out[pos] = field.id();
        out[pos + 1..pos + FIELD_HEADER_LEN].copy_from_slice(&(len as u16).to_le_bytes());
        pos += FIELD_HEADER_LEN;
        field.encode_compact(&mut out[pos..pos + len])?;
        pos += len;
        Ok(())
    })?;
    Ok(pos)
}

/// Stages every recognised field of `body` into `message`.
///
/// Unknown tags are skipped. A tag seen twice keeps its last value.
pub fn decode_fields<M: Message>(body: &[u8], message: &mut M) -> Result<()> {
    let mut pos = 0;
    while pos < body.len() {
        if body.len() - pos < FIELD_HEADER_LEN {
            return Err(Error::invalid_frame("truncated field header"));
        }
        let tag = body[pos];
        let len = u16::from_le_bytes([body[pos + 1], body[pos + 2]]) as usize;
        pos += FIELD_HEADER_LEN;
        if body.len() - pos < len {
            return Err(Error::invalid_frame("field value overruns body"));
        }
        let value = &body[pos..pos + len];
        pos += len;

        match message.field_mut(tag) {
            Some(field) => field.decode_compact(value)?,
            None => debug!(schema = M::NAME, tag, len, "skipping unknown field tag"),
        }
    }
    Ok(())
}
