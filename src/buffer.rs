//! Exactly sized frame storage.
//!
//! A `Buffer` owns a `[u8; N]` array where `N` is the worst-case frame length
//! of its message type under its protocol and checksum. Nothing in the
//! encode or decode path allocates.
//!
//! Stable Rust cannot yet use an associated constant as an array length in a
//! generic context, so the size is passed as a const argument computed by
//! [`capacity`] and checked at compile time. [`get_buffer!`](crate::get_buffer)
//! fills it in:
//!
//! ```rust
//! use fixedwire::*;
//!
//! message! {
//!     pub struct Ping {
//!         type_id: 1,
//!         rules: no_cross_check,
//!         fields {
//!             1 => pub seq: ScalarField<u32, Required> = Required,
//!         }
//!     }
//! }
//!
//! let buffer = get_buffer!(Ping);
//! // header + tag/len + u32 + CRC16
//! assert_eq!(buffer.capacity(), 3 + 3 + 4 + 2);
//! ```
//!
//! An undersized buffer does not compile:
//!
//! ```compile_fail
//! use fixedwire::*;
//!
//! message! {
//!     pub struct Ping {
//!         type_id: 1,
//!         rules: no_cross_check,
//!         fields {
//!             1 => pub seq: ScalarField<u32, Required> = Required,
//!         }
//!     }
//! }
//!
//! let buffer = Buffer::<Ping, Crc16, Tlv, 4>::new();
//! ```
//!
//! Neither does a checksum trailer wider than eight bytes:
//!
//! ```compile_fail
//! use fixedwire::*;
//!
//! message! {
//!     pub struct Ping {
//!         type_id: 1,
//!         rules: no_cross_check,
//!         fields {
//!             1 => pub seq: ScalarField<u32, Required> = Required,
//!         }
//!     }
//! }
//!
//! fn sum(bytes: &[u8]) -> u64 {
//!     bytes.iter().map(|&b| b as u64).sum()
//! }
//!
//! let buffer = Buffer::<Ping, FnChecksum<12>, Tlv, 64>::with_checksum(FnChecksum::new(sum));
//! ```

use crate::checksum::{Checksum, Trailer};
use crate::error::{Error, Result};
use crate::framing::{Protocol, HEADER_LEN};
use crate::message::Message;
use crate::policy::DecodePolicy;
use std::fmt;
use std::marker::PhantomData;

/// Worst-case frame length of `M` under protocol `P` with checksum `C`.
pub const fn capacity<M: Message, C: Checksum, P: Protocol>() -> usize {
    HEADER_LEN + P::LAYOUT.max_body_len::<M>() + Trailer::<C>::WIDTH
}

/// Frame storage bound to one message type, checksum and protocol.
pub struct Buffer<M, C, P, const N: usize> {
    pub(crate) bytes: [u8; N],
    pub(crate) len: usize,
    pub(crate) checksum: C,
    pub(crate) policy: DecodePolicy,
    _marker: PhantomData<fn() -> (M, P)>,
}

impl<M: Message, C: Checksum, P: Protocol, const N: usize> Buffer<M, C, P, N> {
    const FITS: () = assert!(
        N >= capacity::<M, C, P>(),
        "buffer is smaller than the worst-case frame"
    );

    /// Creates an empty buffer with the default checksum instance.
    pub fn new() -> Self
    where
        C: Default,
    {
        Self::with_checksum(C::default())
    }

    /// Creates an empty buffer around a configured checksum, e.g. a [`FnChecksum`](crate::FnChecksum).
    pub fn with_checksum(checksum: C) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::FITS;
        Self {
            bytes: [0; N],
            len: 0,
            checksum,
            policy: DecodePolicy::default(),
            _marker: PhantomData,
        }
    }

    /// Sets what `deserialize` does after decoding.
    pub fn with_policy(mut self, policy: DecodePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    /// The filled frame, empty until a successful `serialize` or `load`.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Copies a received frame in for decoding.
    pub fn load(&mut self, frame: &[u8]) -> Result<()> {
        if frame.len() > N {
            self.len = 0;
            return Err(Error::overflow(frame.len(), N));
        }
        self.bytes[..frame.len()].copy_from_slice(frame);
        self.len = frame.len();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<M: Message, C: Checksum + Default, P: Protocol, const N: usize> Default
    for Buffer<M, C, P, N>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Message, C, P: Protocol, const N: usize> fmt::Debug for Buffer<M, C, P, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("message", &M::NAME)
            .field("protocol", &P::NAME)
            .field("len", &self.len)
            .field("capacity", &N)
            .finish()
    }
}

/// Builds a [`Buffer`] sized for a message type.
///
/// `get_buffer!(M)` uses CRC16 and the tagged protocol;
/// `get_buffer!(M, C, P)` picks both explicitly.
#[macro_export]
macro_rules! get_buffer {
    ($msg:ty) => {
        $crate::get_buffer!($msg, $crate::Crc16, $crate::Tlv)
    };
    ($msg:ty, $checksum:ty, $protocol:ty) => {
        $crate::Buffer::<
            $msg,
            $checksum,
            $protocol,
            { $crate::capacity::<$msg, $checksum, $protocol>() },
        >::new()
    };
}
