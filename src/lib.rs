//! # fixedwire
//!
//! Statically sized message schemas with mandatory validation and swappable
//! wire encodings, for targets where the heap is off limits.
//!
//! ## Overview
//!
//! A message is a struct of typed field containers declared with [`message!`].
//! Every field names a validator chain, every container has a compile-time
//! bound, and every encoded frame fits a buffer whose size is known at compile
//! time. Nothing on the encode or decode path allocates.
//!
//! ## Key Features
//!
//! * **Validation first**: writes run the field's chain immediately, and
//!   [`serialize`] refuses to encode a message that fails [`validate`]
//! * **Two protocols**: tagged ([`Tlv`]) for compact frames, fixed offsets
//!   ([`StaticLayout`]) for constant-length frames
//! * **Integrity trailer**: CRC16 by default, or parity, CRC32, XXH3, a custom
//!   function, or none
//! * **Fixed storage**: [`get_buffer!`] sizes a [`Buffer`] for the worst case of
//!   a message type
//!
//! ## Quick Start
//!
//! ```rust
//! use fixedwire::*;
//!
//! message! {
//!     /// One sensor sample.
//!     pub struct Sample {
//!         type_id: 0x0101,
//!         rules: no_cross_check,
//!         fields {
//!             1 => pub value: ScalarField<i32, (Positive, Required)> = (Positive, Required),
//!             2 => pub history: ArrayField<i32, Positive, NoValidation, 3> = (Positive, NoValidation),
//!         }
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let mut sample = Sample::default();
//!     sample.value.set(42)?;
//!     sample.history.add(1)?;
//!     sample.history.add(2)?;
//!
//!     // Rejected at the write, before anything is staged.
//!     assert!(sample.value.set(-5).is_err());
//!     assert_eq!(sample.value.get(), 42);
//!
//!     let mut buffer = get_buffer!(Sample);
//!     serialize(&mut buffer, &sample)?;
//!
//!     let decoded: Sample = deserialize(&buffer)?;
//!     assert_eq!(decoded, sample);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! * **Fields** ([`ScalarField`], [`StringField`], [`ArrayField`], [`MapField`],
//!   [`MessageField`]): bounded storage plus a definedness flag
//! * **[`Validator`]**: pure predicates composed into tuple chains
//! * **[`Protocol`]**: body encodings selected by type parameter
//! * **[`Checksum`]**: integrity schemes appended after the body
//!
//! Errors are a single `Copy` enum, [`Error`]. Decode failures and
//! integrity failures are logged through `tracing`; enable a subscriber to see
//! them.

pub mod buffer;
pub mod checksum;
pub mod collection;
pub mod error;
pub mod field;
pub mod framing;
pub mod layout;
pub mod message;
pub mod policy;
pub mod reader;
pub mod tlv;
pub mod traits;
pub mod validation;
pub mod writer;

// Re-export the main public API for user convenience.
pub use buffer::{capacity, Buffer};
pub use checksum::{Checksum, Crc16, FnChecksum, NoChecksum, XorParity};
pub use collection::{ArrayField, MapField};
pub use error::{Error, Result, ValidationTarget};
pub use field::{
    ElementType, EnumField, Field, FieldDescriptor, FieldId, FieldKind, FieldType, ScalarField,
    StringField,
};
pub use framing::{decode_any, decode_frame, encode_frame, BodyLayout, Protocol, HEADER_LEN};
pub use layout::StaticLayout;
pub use message::{no_cross_check, validate, Message, MessageField};
pub use policy::DecodePolicy;
pub use reader::{deserialize, deserialize_any};
pub use tlv::Tlv;
pub use traits::Scalar;
pub use validation::{
    ExactCount, InRange, Length, NoValidation, NonEmpty, OnKey, OnValue, OneOf, Positive,
    Predicate, Rejection, Required, Validator,
};
pub use writer::serialize;

#[cfg(feature = "xxhash")]
pub use checksum::XxHash64;

#[cfg(feature = "crc32")]
pub use checksum::Crc32;
