//! Message schemas: a fixed, uniquely tagged set of fields plus one
//! cross-field rules function.
//!
//! Messages are plain structs declared with [`message!`](crate::message). The
//! macro generates the [`Message`] impl, the static field descriptor table and
//! a compile-time check that field ids are unique:
//!
//! ```compile_fail
//! use fixedwire::{message, no_cross_check, NoValidation, ScalarField};
//!
//! message! {
//!     pub struct Clash {
//!         type_id: 1,
//!         rules: no_cross_check,
//!         fields {
//!             1 => pub a: ScalarField<u8, NoValidation> = NoValidation,
//!             1 => pub b: ScalarField<u8, NoValidation> = NoValidation,
//!         }
//!     }
//! }
//! ```
//!
//! Lengths and counts travel in `u16` prefixes, so a field that could exceed
//! 65535 bytes or entries is rejected the same way:
//!
//! ```compile_fail
//! use fixedwire::{message, no_cross_check, NoValidation, StringField};
//!
//! message! {
//!     pub struct Blob {
//!         type_id: 1,
//!         rules: no_cross_check,
//!         fields {
//!             1 => pub text: StringField<70000, NoValidation> = NoValidation,
//!         }
//!     }
//! }
//! ```

use crate::error::Result;
use crate::field::{
    ElementType, Field, FieldDescriptor, FieldId, FieldKind, FieldType, MAX_PREFIXED_LEN,
};
use crate::validation::{Rejection, Validator};
use crate::{layout, tlv};
use std::fmt;

/// The capability contract every schema type satisfies.
///
/// Implementations are generated by [`message!`](crate::message); writing one
/// by hand is possible but the field ids then have to be kept unique manually.
pub trait Message: Sized {
    const NAME: &'static str;

    /// Written in the envelope header and checked on decode.
    const TYPE_ID: u16;

    /// Field metadata in declaration order.
    const DESCRIPTORS: &'static [FieldDescriptor];

    const FIELD_COUNT: usize = Self::DESCRIPTORS.len();

    /// Static layout body length: set/unset bitmap plus every slot.
    const FIXED_LEN: usize = fixed_body_len(Self::DESCRIPTORS);

    /// Worst-case tagged body length: every field set at full size.
    const MAX_TAGGED_LEN: usize = tagged_body_len(Self::DESCRIPTORS);

    /// A fresh instance with every field unset.
    fn empty() -> Self;

    /// Visits fields in declaration order, stopping at the first error.
    fn visit(&self, visitor: &mut dyn FnMut(&dyn Field) -> Result<()>) -> Result<()>;

    fn visit_mut(&mut self, visitor: &mut dyn FnMut(&mut dyn Field) -> Result<()>) -> Result<()>;

    fn field(&self, id: FieldId) -> Option<&dyn Field>;

    fn field_mut(&mut self, id: FieldId) -> Option<&mut dyn Field>;

    /// The message-level rules, given a read-only view of the whole message.
    fn cross_check(&self) -> std::result::Result<(), Rejection>;
}

/// The explicit opt-out for message-level rules.
pub fn no_cross_check<M>(_message: &M) -> std::result::Result<(), Rejection> {
    Ok(())
}

/// Runs every field-level check in declaration order, then the message rules.
///
/// Returns the first failure only. A message that passes is "valid", the only
/// state `serialize` accepts.
pub fn validate<M: Message>(message: &M) -> Result<()> {
    message.visit(&mut |field: &dyn Field| field.validate())?;
    message.cross_check().map_err(Rejection::message_level)
}

/// True when no id appears twice. Evaluated at compile time by `message!`.
pub const fn ids_unique(descriptors: &[FieldDescriptor]) -> bool {
    let mut i = 0;
    while i < descriptors.len() {
        let mut j = i + 1;
        while j < descriptors.len() {
            if descriptors[i].id == descriptors[j].id {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

/// True when every field's length and count fit the `u16` prefixes both
/// protocols write. Evaluated at compile time by `message!`.
pub const fn lengths_fit(descriptors: &[FieldDescriptor]) -> bool {
    let mut i = 0;
    while i < descriptors.len() {
        let d = &descriptors[i];
        if d.max_len > MAX_PREFIXED_LEN || d.capacity > MAX_PREFIXED_LEN {
            return false;
        }
        i += 1;
    }
    true
}

pub const fn bitmap_len(field_count: usize) -> usize {
    (field_count + 7) / 8
}

pub const fn fixed_body_len(descriptors: &[FieldDescriptor]) -> usize {
    let mut total = bitmap_len(descriptors.len());
    let mut i = 0;
    while i < descriptors.len() {
        total += descriptors[i].fixed_width;
        i += 1;
    }
    total
}

pub const fn tagged_body_len(descriptors: &[FieldDescriptor]) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < descriptors.len() {
        total += tlv::FIELD_HEADER_LEN + descriptors[i].max_len;
        i += 1;
    }
    total
}

/// Declares a message schema.
///
/// Every field names its id, its container type and its validator chain(s).
/// Arrays and maps take `(element_chain, container_chain)`. `rules` names the
/// single cross-field validator, `no_cross_check` to opt out.
///
/// ```rust
/// use fixedwire::*;
///
/// fn ordered(m: &Window) -> Result<(), Rejection> {
///     if m.start.get() <= m.end.get() {
///         Ok(())
///     } else {
///         Err(Rejection::new("ordered", "start must not be after end"))
///     }
/// }
///
/// message! {
///     /// A closed time window.
///     pub struct Window {
///         type_id: 0x0010,
///         rules: ordered,
///         fields {
///             1 => pub start: ScalarField<u32, Required> = Required,
///             2 => pub end: ScalarField<u32, Required> = Required,
///             3 => pub tags: ArrayField<u8, Positive, NoValidation, 4> = (Positive, NoValidation),
///         }
///     }
/// }
///
/// let mut w = Window::default();
/// w.start.set(10).unwrap();
/// w.end.set(5).unwrap();
/// assert_eq!(validate(&w).unwrap_err().validator(), Some("ordered"));
/// assert_eq!(Window::FIELD_COUNT, 3);
/// ```
#[macro_export]
macro_rules! message {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            type_id: $type_id:expr,
            rules: $rules:expr,
            fields {
                $(
                    $(#[$fmeta:meta])*
                    $id:literal => $fvis:vis $field:ident : $ty:ty = $chains:expr
                ),* $(,)?
            }
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::Message for $name {
            const NAME: &'static str = stringify!($name);
            const TYPE_ID: u16 = $type_id;
            const DESCRIPTORS: &'static [$crate::FieldDescriptor] = &[
                $(
                    $crate::FieldDescriptor {
                        id: $id,
                        name: stringify!($field),
                        kind: <$ty as $crate::FieldType>::KIND,
                        element: <$ty as $crate::FieldType>::ELEMENT,
                        value: <$ty as $crate::FieldType>::VALUE,
                        capacity: <$ty as $crate::FieldType>::CAPACITY,
                        validators: stringify!($chains),
                        fixed_width: <$ty as $crate::FieldType>::FIXED_WIDTH,
                        max_len: <$ty as $crate::FieldType>::MAX_COMPACT_LEN,
                    },
                )*
            ];

            fn empty() -> Self {
                Self {
                    $($field: <$ty as $crate::FieldType>::declare($id, $chains),)*
                }
            }

            #[allow(unused_variables)]
            fn visit(
                &self,
                visitor: &mut dyn FnMut(&dyn $crate::Field) -> $crate::Result<()>,
            ) -> $crate::Result<()> {
                $(visitor(&self.$field)?;)*
                ::core::result::Result::Ok(())
            }

            #[allow(unused_variables)]
            fn visit_mut(
                &mut self,
                visitor: &mut dyn FnMut(&mut dyn $crate::Field) -> $crate::Result<()>,
            ) -> $crate::Result<()> {
                $(visitor(&mut self.$field)?;)*
                ::core::result::Result::Ok(())
            }

            fn field(&self, id: $crate::FieldId) -> ::core::option::Option<&dyn $crate::Field> {
                match id {
                    $($id => ::core::option::Option::Some(&self.$field),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_mut(
                &mut self,
                id: $crate::FieldId,
            ) -> ::core::option::Option<&mut dyn $crate::Field> {
                match id {
                    $($id => ::core::option::Option::Some(&mut self.$field),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn cross_check(&self) -> ::core::result::Result<(), $crate::Rejection> {
                ($rules)(self)
            }
        }

        impl ::core::default::Default for $name {
            fn default() -> Self {
                <Self as $crate::Message>::empty()
            }
        }

        const _: () = assert!(
            $crate::message::ids_unique(<$name as $crate::Message>::DESCRIPTORS),
            "duplicate field id in message schema"
        );

        const _: () = assert!(
            $crate::message::lengths_fit(<$name as $crate::Message>::DESCRIPTORS),
            "field too large for a u16 length prefix"
        );
    };
}

//--- Submessages ---

/// A nested message stored inline.
///
/// The field's own chain sees the whole submessage; on message validation the
/// submessage's fields and rules are checked as well. Nested messages are
/// encoded with the same protocol as their parent.
#[derive(Clone)]
pub struct MessageField<M, V> {
    id: FieldId,
    staged: M,
    defined: bool,
    chain: V,
}

impl<M: Message, V: Validator<M>> MessageField<M, V> {
    pub fn new(id: FieldId, chain: V) -> Self {
        Self {
            id,
            staged: M::empty(),
            defined: false,
            chain,
        }
    }

    /// Checks `value` against this field's chain and stages it.
    ///
    /// The submessage's own field rules are not run here; they are container
    /// level and wait for message validation.
    pub fn set(&mut self, value: M) -> Result<()> {
        self.chain.validate(&value).map_err(|r| r.at(self.id))?;
        self.staged = value;
        self.defined = true;
        Ok(())
    }

    #[inline]
    pub fn get(&self) -> &M {
        &self.staged
    }

    /// Mutable access for building the submessage in place; marks the field set.
    pub fn get_mut(&mut self) -> &mut M {
        self.defined = true;
        &mut self.staged
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.defined
    }

    pub fn clear(&mut self) {
        self.staged = M::empty();
        self.defined = false;
    }
}

impl<M: Message, V: Validator<M>> Field for MessageField<M, V> {
    fn id(&self) -> FieldId {
        self.id
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Message
    }

    fn is_set(&self) -> bool {
        self.defined
    }

    fn clear(&mut self) {
        MessageField::clear(self)
    }

    fn validate(&self) -> Result<()> {
        if !self.defined {
            return self.chain.validate_unset().map_err(|r| r.at(self.id));
        }
        self.chain
            .validate(&self.staged)
            .map_err(|r| r.at(self.id))?;
        validate(&self.staged)
    }

    fn compact_len(&self) -> usize {
        tlv::body_len(&self.staged)
    }

    fn encode_compact(&self, out: &mut [u8]) -> Result<()> {
        tlv::encode_fields(&self.staged, out).map(|_| ())
    }

    fn decode_compact(&mut self, bytes: &[u8]) -> Result<()> {
        let mut nested = M::empty();
        tlv::decode_fields(bytes, &mut nested)?;
        self.staged = nested;
        self.defined = true;
        Ok(())
    }

    fn fixed_width(&self) -> usize {
        M::FIXED_LEN
    }

    fn encode_fixed(&self, slot: &mut [u8]) -> Result<()> {
        layout::encode_fields(&self.staged, slot).map(|_| ())
    }

    fn decode_fixed(&mut self, slot: &[u8]) -> Result<()> {
        let mut nested = M::empty();
        layout::decode_fields(slot, &mut nested)?;
        self.staged = nested;
        self.defined = true;
        Ok(())
    }
}

impl<M: Message, V: Validator<M>> FieldType for MessageField<M, V> {
    type Chains = V;

    const KIND: FieldKind = FieldKind::Message;
    const ELEMENT: Option<ElementType> = Some(ElementType {
        kind: FieldKind::Message,
        name: M::NAME,
    });
    const CAPACITY: usize = 1;
    const FIXED_WIDTH: usize = M::FIXED_LEN;
    const MAX_COMPACT_LEN: usize = M::MAX_TAGGED_LEN;

    fn declare(id: FieldId, chain: V) -> Self {
        Self::new(id, chain)
    }
}

impl<M: PartialEq, V> PartialEq for MessageField<M, V> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.defined == other.defined
            && (!self.defined || self.staged == other.staged)
    }
}

impl<M: fmt::Debug, V> fmt::Debug for MessageField<M, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageField")
            .field("id", &self.id)
            .field("value", &self.staged)
            .field("is_set", &self.defined)
            .finish()
    }
}
