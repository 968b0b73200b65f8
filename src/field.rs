//! Field containers: bounded, typed storage for one datum plus definedness.
//!
//! Writes go through the field's validator chain immediately; reads never
//! re-validate. Container-level rules (non-empty, exact count, ...) are only
//! evaluated when the owning message is validated.

use crate::error::{Error, Result};
use crate::traits::Scalar;
use crate::validation::Validator;
use std::fmt;

/// Per-message tag of a field.
pub type FieldId = u8;

/// Shape of a field, as recorded in its descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    Enum,
    String,
    Array,
    Map,
    Message,
}

/// A stored value type: its kind and its Rust name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementType {
    pub kind: FieldKind,
    pub name: &'static str,
}

impl ElementType {
    pub const fn of<T: Scalar>() -> Self {
        Self {
            kind: T::KIND,
            name: T::NAME,
        }
    }
}

/// Immutable schema metadata for one field, shared by every instance.
///
/// Everything a schema compiler or binding generator needs to reproduce the
/// declaration: shape, stored types, bound and the validator chain(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub id: FieldId,
    pub name: &'static str,
    pub kind: FieldKind,
    /// The scalar itself, the array element, the map key or the submessage.
    /// `None` for strings.
    pub element: Option<ElementType>,
    /// The map value; `None` for every other kind.
    pub value: Option<ElementType>,
    /// Bytes for strings, entries for arrays and maps, 1 otherwise.
    pub capacity: usize,
    /// The declared validator chain(s), as written.
    pub validators: &'static str,
    /// Slot width in the static layout.
    pub fixed_width: usize,
    /// Largest possible value length in the tagged encoding.
    pub max_len: usize,
}

/// Runtime capabilities every field container provides to validators and codecs.
///
/// The trait is object safe so that messages can walk their heterogeneous
/// fields without allocating.
pub trait Field {
    fn id(&self) -> FieldId;
    fn kind(&self) -> FieldKind;
    fn is_set(&self) -> bool;

    /// Returns the field to its unset state with default storage.
    fn clear(&mut self);

    /// Message-time validation: the element chain for set values, the
    /// container chain for collections, `validate_unset` for unset fields.
    fn validate(&self) -> Result<()>;

    /// Length of the variable-width ("compact") encoding of the staged value.
    fn compact_len(&self) -> usize;

    /// Writes the compact encoding; `out` is exactly `compact_len()` bytes.
    fn encode_compact(&self, out: &mut [u8]) -> Result<()>;

    /// Stages a value from its compact encoding without running validators.
    fn decode_compact(&mut self, bytes: &[u8]) -> Result<()>;

    /// Width of the fixed slot this field occupies in the static layout.
    fn fixed_width(&self) -> usize;

    /// Writes the fixed slot; `slot` is exactly `fixed_width()` bytes and zeroed.
    fn encode_fixed(&self, slot: &mut [u8]) -> Result<()>;

    /// Stages a value from its fixed slot without running validators.
    fn decode_fixed(&mut self, slot: &[u8]) -> Result<()>;
}

/// Schema-time constructor and sizing for a field container.
///
/// Used by [`message!`](crate::message); every declaration must hand over its
/// validator chain(s), there is no default.
pub trait FieldType: Field + Sized {
    /// Validator chain(s) the declaration supplies: a single chain for scalars,
    /// strings and submessages, `(element, container)` for arrays and maps.
    type Chains;

    const KIND: FieldKind;
    const ELEMENT: Option<ElementType>;
    const VALUE: Option<ElementType> = None;
    const CAPACITY: usize;
    const FIXED_WIDTH: usize;
    const MAX_COMPACT_LEN: usize;

    fn declare(id: FieldId, chains: Self::Chains) -> Self;
}

// Count prefix used by variable-length values in the static layout.
pub(crate) const COUNT_PREFIX: usize = 2;

/// Largest length or count a `u16` prefix can carry.
pub const MAX_PREFIXED_LEN: usize = u16::MAX as usize;

pub(crate) fn write_count(slot: &mut [u8], count: usize) {
    slot[..COUNT_PREFIX].copy_from_slice(&(count as u16).to_le_bytes());
}

pub(crate) fn read_count(slot: &[u8]) -> usize {
    u16::from_le_bytes([slot[0], slot[1]]) as usize
}

//--- Scalars and enums ---

/// A single scalar or enum value.
#[derive(Clone)]
pub struct ScalarField<T, V> {
    id: FieldId,
    staged: T,
    defined: bool,
    chain: V,
}

/// Enum fields are scalars whose `Scalar` impl comes from [`wire_enum!`](crate::wire_enum).
pub type EnumField<E, V> = ScalarField<E, V>;

impl<T: Scalar, V: Validator<T>> ScalarField<T, V> {
    pub fn new(id: FieldId, chain: V) -> Self {
        Self {
            id,
            staged: T::default(),
            defined: false,
            chain,
        }
    }

    /// Validates and stages `value`. On rejection the previous value is kept.
    pub fn set(&mut self, value: T) -> Result<()> {
        self.chain.validate(&value).map_err(|r| r.at(self.id))?;
        self.staged = value;
        self.defined = true;
        Ok(())
    }

    /// The staged value, the type's default when unset.
    #[inline]
    pub fn get(&self) -> T {
        self.staged
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.defined
    }

    pub fn clear(&mut self) {
        self.staged = T::default();
        self.defined = false;
    }

    fn stage_raw(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() != T::WIDTH {
            return Err(Error::invalid_frame("scalar width mismatch"));
        }
        self.staged = T::read_le(bytes).ok_or(Error::invalid_frame("invalid scalar encoding"))?;
        self.defined = true;
        Ok(())
    }
}

impl<T: Scalar, V: Validator<T>> Field for ScalarField<T, V> {
    fn id(&self) -> FieldId {
        self.id
    }

    fn kind(&self) -> FieldKind {
        T::KIND
    }

    fn is_set(&self) -> bool {
        self.defined
    }

    fn clear(&mut self) {
        ScalarField::clear(self)
    }

    fn validate(&self) -> Result<()> {
        let outcome = if self.defined {
            self.chain.validate(&self.staged)
        } else {
            self.chain.validate_unset()
        };
        outcome.map_err(|r| r.at(self.id))
    }

    fn compact_len(&self) -> usize {
        T::WIDTH
    }

    fn encode_compact(&self, out: &mut [u8]) -> Result<()> {
        self.staged.write_le(out);
        Ok(())
    }

    fn decode_compact(&mut self, bytes: &[u8]) -> Result<()> {
        self.stage_raw(bytes)
    }

    fn fixed_width(&self) -> usize {
        T::WIDTH
    }

    fn encode_fixed(&self, slot: &mut [u8]) -> Result<()> {
        self.staged.write_le(slot);
        Ok(())
    }

    fn decode_fixed(&mut self, slot: &[u8]) -> Result<()> {
        self.stage_raw(slot)
    }
}

impl<T: Scalar, V: Validator<T>> FieldType for ScalarField<T, V> {
    type Chains = V;

    const KIND: FieldKind = T::KIND;
    const ELEMENT: Option<ElementType> = Some(ElementType::of::<T>());
    const CAPACITY: usize = 1;
    const FIXED_WIDTH: usize = T::WIDTH;
    const MAX_COMPACT_LEN: usize = T::WIDTH;

    fn declare(id: FieldId, chain: V) -> Self {
        Self::new(id, chain)
    }
}

impl<T: Scalar, V> PartialEq for ScalarField<T, V> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.defined == other.defined
            && (!self.defined || self.staged == other.staged)
    }
}

impl<T: Scalar, V> fmt::Debug for ScalarField<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarField")
            .field("id", &self.id)
            .field("value", &self.staged)
            .field("is_set", &self.defined)
            .finish()
    }
}

//--- Strings ---

/// UTF-8 text of at most `N` bytes, stored inline.
#[derive(Clone)]
pub struct StringField<const N: usize, V> {
    id: FieldId,
    bytes: [u8; N],
    len: usize,
    defined: bool,
    chain: V,
}

impl<const N: usize, V: Validator<str>> StringField<N, V> {
    pub fn new(id: FieldId, chain: V) -> Self {
        Self {
            id,
            bytes: [0; N],
            len: 0,
            defined: false,
            chain,
        }
    }

    /// Validates and stages `value`. Longer than `N` bytes is `CapacityExceeded`.
    pub fn set(&mut self, value: &str) -> Result<()> {
        if value.len() > N {
            return Err(Error::capacity_exceeded(self.id, N));
        }
        self.chain.validate(value).map_err(|r| r.at(self.id))?;
        self.bytes[..value.len()].copy_from_slice(value.as_bytes());
        self.bytes[value.len()..].fill(0);
        self.len = value.len();
        self.defined = true;
        Ok(())
    }

    pub fn get(&self) -> &str {
        // Only validated UTF-8 ever reaches the storage.
        std::str::from_utf8(&self.bytes[..self.len]).unwrap_or_default()
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.defined
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        self.bytes = [0; N];
        self.len = 0;
        self.defined = false;
    }

    fn stage_raw(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > N {
            return Err(Error::invalid_frame("string exceeds declared capacity"));
        }
        if std::str::from_utf8(bytes).is_err() {
            return Err(Error::invalid_frame("string is not valid UTF-8"));
        }
        self.bytes[..bytes.len()].copy_from_slice(bytes);
        self.bytes[bytes.len()..].fill(0);
        self.len = bytes.len();
        self.defined = true;
        Ok(())
    }
}

impl<const N: usize, V: Validator<str>> Field for StringField<N, V> {
    fn id(&self) -> FieldId {
        self.id
    }

    fn kind(&self) -> FieldKind {
        FieldKind::String
    }

    fn is_set(&self) -> bool {
        self.defined
    }

    fn clear(&mut self) {
        StringField::clear(self)
    }

    fn validate(&self) -> Result<()> {
        let outcome = if self.defined {
            self.chain.validate(self.get())
        } else {
            self.chain.validate_unset()
        };
        outcome.map_err(|r| r.at(self.id))
    }

    fn compact_len(&self) -> usize {
        self.len
    }

    fn encode_compact(&self, out: &mut [u8]) -> Result<()> {
        out.copy_from_slice(&self.bytes[..self.len]);
        Ok(())
    }

    fn decode_compact(&mut self, bytes: &[u8]) -> Result<()> {
        self.stage_raw(bytes)
    }

    fn fixed_width(&self) -> usize {
        COUNT_PREFIX + N
    }

    fn encode_fixed(&self, slot: &mut [u8]) -> Result<()> {
        write_count(slot, self.len);
        slot[COUNT_PREFIX..COUNT_PREFIX + self.len].copy_from_slice(&self.bytes[..self.len]);
        Ok(())
    }

    fn decode_fixed(&mut self, slot: &[u8]) -> Result<()> {
        let len = read_count(slot);
        if len > N {
            return Err(Error::invalid_frame("string length exceeds slot"));
        }
        self.stage_raw(&slot[COUNT_PREFIX..COUNT_PREFIX + len])
    }
}

impl<const N: usize, V: Validator<str>> FieldType for StringField<N, V> {
    type Chains = V;

    const KIND: FieldKind = FieldKind::String;
    const ELEMENT: Option<ElementType> = None;
    const CAPACITY: usize = N;
    const FIXED_WIDTH: usize = COUNT_PREFIX + N;
    const MAX_COMPACT_LEN: usize = N;

    fn declare(id: FieldId, chain: V) -> Self {
        Self::new(id, chain)
    }
}

impl<const N: usize, V> PartialEq for StringField<N, V> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.defined == other.defined
            && (!self.defined || self.bytes[..self.len] == other.bytes[..other.len])
    }
}

impl<const N: usize, V> fmt::Debug for StringField<N, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = std::str::from_utf8(&self.bytes[..self.len]).unwrap_or_default();
        f.debug_struct("StringField")
            .field("id", &self.id)
            .field("value", &text)
            .field("is_set", &self.defined)
            .finish()
    }
}
