//! Defines the `Checksum` trait and the integrity schemes appended to frames.
//!
//! A scheme produces a value that is written little-endian after the frame
//! body using exactly `WIDTH` bytes. Wider results are truncated to that width
//! before being written and compared.

use crate::error::{Error, Result};
use std::marker::PhantomData;

/// Widest trailer a scheme may declare. Checksum values are carried as `u64`.
pub const MAX_WIDTH: usize = 8;

/// An integrity scheme covering the frame header and body.
pub trait Checksum {
    /// Trailer width in bytes, at most [`MAX_WIDTH`]. Framing a message with a
    /// wider scheme fails to compile.
    const WIDTH: usize;

    /// Calculates the checksum for the given bytes.
    fn calculate(&self, payload: &[u8]) -> u64;

    /// Verifies a received trailer value. Returns `Ok(())` if it matches.
    fn verify(&self, expected: u64, payload: &[u8]) -> Result<()> {
        let calculated = truncate(self.calculate(payload), Self::WIDTH);
        let expected = truncate(expected, Self::WIDTH);
        if calculated == expected {
            Ok(())
        } else {
            Err(Error::checksum_mismatch(expected, calculated))
        }
    }
}

/// The trailer width of `C`, checked against [`MAX_WIDTH`] when instantiated.
pub(crate) struct Trailer<C>(PhantomData<C>);

impl<C: Checksum> Trailer<C> {
    pub(crate) const WIDTH: usize = {
        assert!(C::WIDTH <= MAX_WIDTH, "checksum trailer wider than 8 bytes");
        C::WIDTH
    };
}

pub(crate) fn truncate(value: u64, width: usize) -> u64 {
    if width >= 8 {
        value
    } else {
        value & ((1u64 << (width * 8)) - 1)
    }
}

/// Writes `value` into `out` (exactly `width` bytes) little-endian.
pub(crate) fn write_trailer(value: u64, out: &mut [u8]) {
    let bytes = value.to_le_bytes();
    out.copy_from_slice(&bytes[..out.len()]);
}

pub(crate) fn read_trailer(bytes: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(raw)
}

/// CRC-16/CCITT-FALSE, the default integrity scheme.
#[derive(Debug, Default, Clone, Copy)]
pub struct Crc16;

impl Crc16 {
    pub fn new() -> Self {
        Self
    }
}

impl Checksum for Crc16 {
    const WIDTH: usize = 2;

    fn calculate(&self, payload: &[u8]) -> u64 {
        crc16::State::<crc16::CCITT_FALSE>::calculate(payload) as u64
    }
}

/// One-byte longitudinal parity: the XOR of every covered byte.
///
/// Cheap and catches any single corrupted byte, but not reordering.
#[derive(Debug, Default, Clone, Copy)]
pub struct XorParity;

impl Checksum for XorParity {
    const WIDTH: usize = 1;

    fn calculate(&self, payload: &[u8]) -> u64 {
        payload.iter().fold(0u8, |acc, b| acc ^ b) as u64
    }
}

/// A caller-supplied scheme with a `W`-byte trailer.
///
/// ```rust
/// use fixedwire::{Checksum, FnChecksum};
///
/// fn sum(bytes: &[u8]) -> u64 {
///     bytes.iter().map(|&b| b as u64).sum()
/// }
///
/// let scheme = FnChecksum::<2>::new(sum);
/// assert_eq!(scheme.calculate(&[1, 2, 3]), 6);
/// assert!(scheme.verify(0x1_0006, &[1, 2, 3]).is_ok()); // compared on 2 bytes
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnChecksum<const W: usize> {
    function: fn(&[u8]) -> u64,
}

impl<const W: usize> FnChecksum<W> {
    pub const fn new(function: fn(&[u8]) -> u64) -> Self {
        Self { function }
    }
}

impl<const W: usize> Checksum for FnChecksum<W> {
    const WIDTH: usize = W;

    fn calculate(&self, payload: &[u8]) -> u64 {
        (self.function)(payload)
    }
}

/// Provides an implementation of the XXH3 64-bit hash algorithm.
#[cfg(feature = "xxhash")]
#[derive(Debug, Default, Clone, Copy)]
pub struct XxHash64;

#[cfg(feature = "xxhash")]
impl XxHash64 {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "xxhash")]
impl Checksum for XxHash64 {
    const WIDTH: usize = 8;

    fn calculate(&self, payload: &[u8]) -> u64 {
        xxhash_rust::xxh3::xxh3_64(payload)
    }
}

/// CRC-32 (IEEE) via `crc32fast`.
#[cfg(feature = "crc32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct Crc32;

#[cfg(feature = "crc32")]
impl Crc32 {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "crc32")]
impl Checksum for Crc32 {
    const WIDTH: usize = 4;

    fn calculate(&self, payload: &[u8]) -> u64 {
        crc32fast::hash(payload) as u64
    }
}

/// No trailer at all. Frames are still length and type checked.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoChecksum;

impl NoChecksum {
    pub fn new() -> Self {
        Self
    }
}

impl Checksum for NoChecksum {
    const WIDTH: usize = 0;

    fn calculate(&self, _payload: &[u8]) -> u64 {
        0
    }

    fn verify(&self, _expected: u64, _payload: &[u8]) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailer_width_follows_the_scheme() {
        assert_eq!(Trailer::<NoChecksum>::WIDTH, 0);
        assert_eq!(Trailer::<XorParity>::WIDTH, 1);
        assert_eq!(Trailer::<Crc16>::WIDTH, 2);
        assert_eq!(Trailer::<FnChecksum<MAX_WIDTH>>::WIDTH, MAX_WIDTH);
    }

    #[test]
    fn crc16_matches_ccitt_false_check_value() {
        // Standard check input for CRC catalogues.
        assert_eq!(Crc16::new().calculate(b"123456789"), 0x29B1);
    }

    #[test]
    fn crc16_detects_single_bit_flip() {
        let crc = Crc16::new();
        let payload = *b"fixed width frame";
        let good = crc.calculate(&payload);
        let mut bad = payload;
        bad[4] ^= 0x10;
        assert!(crc.verify(good, &payload).is_ok());
        assert!(matches!(
            crc.verify(good, &bad),
            Err(Error::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn xor_parity_catches_any_single_byte_change() {
        let parity = XorParity;
        let payload = [0x10u8, 0x22, 0x33, 0x0F];
        let good = parity.calculate(&payload);
        assert_eq!(good, (0x10 ^ 0x22 ^ 0x33 ^ 0x0F) as u64);
        for i in 0..payload.len() {
            let mut bad = payload;
            bad[i] = bad[i].wrapping_add(1);
            assert!(parity.verify(good, &bad).is_err(), "byte {i} undetected");
        }
    }

    #[test]
    fn verify_compares_truncated_values() {
        let scheme = FnChecksum::<1>::new(|_| 0xABCD);
        assert!(scheme.verify(0xCD, b"x").is_ok());
        assert!(matches!(
            scheme.verify(0xCE, b"x"),
            Err(Error::ChecksumMismatch {
                expected: 0xCE,
                calculated: 0xCD
            })
        ));
    }

    #[test]
    fn trailer_helpers_are_little_endian() {
        let mut out = [0u8; 2];
        write_trailer(0x1234, &mut out);
        assert_eq!(out, [0x34, 0x12]);
        assert_eq!(read_trailer(&out), 0x1234);
        assert_eq!(read_trailer(&[]), 0);
        assert_eq!(truncate(u64::MAX, 8), u64::MAX);
        assert_eq!(truncate(0x1_FF, 1), 0xFF);
    }

    #[test]
    fn no_checksum_always_verifies() {
        let checksum = NoChecksum::new();
        assert_eq!(checksum.calculate(b"test data"), 0);
        assert!(checksum.verify(123, b"test data").is_ok());
    }

    #[cfg(feature = "xxhash")]
    #[test]
    fn xxhash64_is_deterministic() {
        let checksum = XxHash64::new();
        let a = checksum.calculate(b"consistent test data");
        assert_eq!(a, checksum.calculate(b"consistent test data"));
        assert!(checksum.verify(a.wrapping_add(1), b"consistent test data").is_err());
    }

    #[cfg(feature = "crc32")]
    #[test]
    fn crc32_check_value() {
        assert_eq!(Crc32::new().calculate(b"123456789"), 0xCBF4_3926);
    }
}
