//! Bounded array and map containers.
//!
//! Elements are checked eagerly against the element chain on `set`/`add`.
//! The container chain ("not empty", "exactly N", ...) only runs when the owning
//! message is validated, so a collection may pass through invalid intermediate
//! states while it is being filled.

use crate::error::{Error, Result};
use crate::field::{
    read_count, write_count, ElementType, Field, FieldId, FieldKind, FieldType, COUNT_PREFIX,
};
use crate::traits::Scalar;
use crate::validation::{NoValidation, Validator};
use std::fmt;

//--- Arrays ---

/// Up to `N` scalar elements stored inline.
#[derive(Clone)]
pub struct ArrayField<T, E, C, const N: usize> {
    id: FieldId,
    elements: [T; N],
    count: usize,
    defined: bool,
    element_chain: E,
    container_chain: C,
}

impl<T, E, C, const N: usize> ArrayField<T, E, C, N>
where
    T: Scalar,
    E: Validator<T>,
    C: Validator<[T]>,
{
    pub fn new(id: FieldId, element_chain: E, container_chain: C) -> Self {
        Self {
            id,
            elements: [T::default(); N],
            count: 0,
            defined: false,
            element_chain,
            container_chain,
        }
    }

    /// Appends one element after checking it against the element chain only.
    ///
    /// A full array yields `CapacityExceeded` regardless of the value.
    pub fn add(&mut self, value: T) -> Result<()> {
        if self.count == N {
            return Err(Error::capacity_exceeded(self.id, N));
        }
        self.element_chain
            .validate(&value)
            .map_err(|r| r.at(self.id))?;
        self.elements[self.count] = value;
        self.count += 1;
        self.defined = true;
        Ok(())
    }

    /// Replaces the contents. Every element is checked before anything is written.
    pub fn set(&mut self, values: &[T]) -> Result<()> {
        if values.len() > N {
            return Err(Error::capacity_exceeded(self.id, N));
        }
        for value in values {
            self.element_chain
                .validate(value)
                .map_err(|r| r.at(self.id))?;
        }
        self.fill(values);
        Ok(())
    }

    /// The staged elements.
    #[inline]
    pub fn get(&self) -> &[T] {
        &self.elements[..self.count]
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.defined
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        self.elements = [T::default(); N];
        self.count = 0;
        self.defined = false;
    }

    fn fill(&mut self, values: &[T]) {
        self.elements[..values.len()].copy_from_slice(values);
        self.elements[values.len()..].fill(T::default());
        self.count = values.len();
        self.defined = true;
    }

    fn stage_raw(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() % T::WIDTH != 0 {
            return Err(Error::invalid_frame("array length is not a multiple of element width"));
        }
        let count = bytes.len() / T::WIDTH;
        if count > N {
            return Err(Error::invalid_frame("array exceeds declared capacity"));
        }
        let mut staged = [T::default(); N];
        for (slot, chunk) in staged.iter_mut().zip(bytes.chunks_exact(T::WIDTH)) {
            *slot = T::read_le(chunk).ok_or(Error::invalid_frame("invalid array element"))?;
        }
        self.fill(&staged[..count]);
        Ok(())
    }
}

impl<T, E, C, const N: usize> Field for ArrayField<T, E, C, N>
where
    T: Scalar,
    E: Validator<T>,
    C: Validator<[T]>,
{
    fn id(&self) -> FieldId {
        self.id
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Array
    }

    fn is_set(&self) -> bool {
        self.defined
    }

    fn clear(&mut self) {
        ArrayField::clear(self)
    }

    fn validate(&self) -> Result<()> {
        if !self.defined {
            return self
                .container_chain
                .validate_unset()
                .map_err(|r| r.at(self.id));
        }
        for value in self.get() {
            self.element_chain
                .validate(value)
                .map_err(|r| r.at(self.id))?;
        }
        self.container_chain
            .validate(self.get())
            .map_err(|r| r.at(self.id))
    }

    fn compact_len(&self) -> usize {
        self.count * T::WIDTH
    }

    fn encode_compact(&self, out: &mut [u8]) -> Result<()> {
        for (value, chunk) in self.get().iter().zip(out.chunks_exact_mut(T::WIDTH)) {
            value.write_le(chunk);
        }
        Ok(())
    }

    fn decode_compact(&mut self, bytes: &[u8]) -> Result<()> {
        self.stage_raw(bytes)
    }

    fn fixed_width(&self) -> usize {
        COUNT_PREFIX + N * T::WIDTH
    }

    fn encode_fixed(&self, slot: &mut [u8]) -> Result<()> {
        write_count(slot, self.count);
        let end = COUNT_PREFIX + self.compact_len();
        self.encode_compact(&mut slot[COUNT_PREFIX..end])
    }

    fn decode_fixed(&mut self, slot: &[u8]) -> Result<()> {
        let count = read_count(slot);
        if count > N {
            return Err(Error::invalid_frame("array count exceeds slot"));
        }
        self.stage_raw(&slot[COUNT_PREFIX..COUNT_PREFIX + count * T::WIDTH])
    }
}

impl<T, E, C, const N: usize> FieldType for ArrayField<T, E, C, N>
where
    T: Scalar,
    E: Validator<T>,
    C: Validator<[T]>,
{
    type Chains = (E, C);

    const KIND: FieldKind = FieldKind::Array;
    const ELEMENT: Option<ElementType> = Some(ElementType::of::<T>());
    const CAPACITY: usize = N;
    const FIXED_WIDTH: usize = COUNT_PREFIX + N * T::WIDTH;
    const MAX_COMPACT_LEN: usize = N * T::WIDTH;

    fn declare(id: FieldId, (element_chain, container_chain): (E, C)) -> Self {
        Self::new(id, element_chain, container_chain)
    }
}

impl<T: Scalar, E, C, const N: usize> PartialEq for ArrayField<T, E, C, N> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.defined == other.defined
            && self.elements[..self.count] == other.elements[..other.count]
    }
}

impl<T: Scalar, E, C, const N: usize> fmt::Debug for ArrayField<T, E, C, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayField")
            .field("id", &self.id)
            .field("elements", &&self.elements[..self.count])
            .field("is_set", &self.defined)
            .finish()
    }
}

//--- Maps ---

/// Up to `N` entries with unique scalar keys, kept in insertion order.
#[derive(Clone)]
pub struct MapField<K, V, E, C, const N: usize> {
    id: FieldId,
    entries: [(K, V); N],
    count: usize,
    defined: bool,
    entry_chain: E,
    container_chain: C,
}

impl<K, V, E, C, const N: usize> MapField<K, V, E, C, N>
where
    K: Scalar,
    V: Scalar,
    E: Validator<(K, V)>,
    C: Validator<[(K, V)]>,
{
    pub fn new(id: FieldId, entry_chain: E, container_chain: C) -> Self {
        Self {
            id,
            entries: [(K::default(), V::default()); N],
            count: 0,
            defined: false,
            entry_chain,
            container_chain,
        }
    }

    /// Inserts or replaces one entry after checking it against the entry chain.
    ///
    /// Replacing an existing key never fails on capacity; a new key on a full
    /// map yields `CapacityExceeded`.
    pub fn add(&mut self, key: K, value: V) -> Result<()> {
        let position = self.position(&key);
        if position.is_none() && self.count == N {
            return Err(Error::capacity_exceeded(self.id, N));
        }
        let entry = (key, value);
        self.entry_chain
            .validate(&entry)
            .map_err(|r| r.at(self.id))?;
        match position {
            Some(index) => self.entries[index] = entry,
            None => {
                self.entries[self.count] = entry;
                self.count += 1;
            }
        }
        self.defined = true;
        Ok(())
    }

    /// Replaces the contents; later duplicates of a key overwrite earlier ones.
    pub fn set(&mut self, entries: &[(K, V)]) -> Result<()> {
        // Entries are checked against this field's chain below; the scratch map
        // only de-duplicates keys.
        let mut staged =
            MapField::<K, V, NoValidation, NoValidation, N>::new(self.id, NoValidation, NoValidation);
        for entry in entries {
            self.entry_chain
                .validate(entry)
                .map_err(|r| r.at(self.id))?;
            staged.add(entry.0, entry.1)?;
        }
        self.entries = staged.entries;
        self.count = staged.count;
        self.defined = true;
        Ok(())
    }

    /// The staged entries in insertion order.
    #[inline]
    pub fn get(&self) -> &[(K, V)] {
        &self.entries[..self.count]
    }

    /// Looks up the value staged for `key`.
    pub fn lookup(&self, key: &K) -> Option<V> {
        self.position(key).map(|index| self.entries[index].1)
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.defined
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn clear(&mut self) {
        self.entries = [(K::default(), V::default()); N];
        self.count = 0;
        self.defined = false;
    }

    fn position(&self, key: &K) -> Option<usize> {
        self.get().iter().position(|(k, _)| k == key)
    }

    fn stage_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let width = K::WIDTH + V::WIDTH;
        if bytes.len() % width != 0 {
            return Err(Error::invalid_frame("map length is not a multiple of entry width"));
        }
        let count = bytes.len() / width;
        if count > N {
            return Err(Error::invalid_frame("map exceeds declared capacity"));
        }
        let mut staged = [(K::default(), V::default()); N];
        for (index, chunk) in bytes.chunks_exact(width).enumerate() {
            let key = K::read_le(&chunk[..K::WIDTH]).ok_or(Error::invalid_frame("invalid map key"))?;
            let value =
                V::read_le(&chunk[K::WIDTH..]).ok_or(Error::invalid_frame("invalid map value"))?;
            if staged[..index].iter().any(|(k, _)| *k == key) {
                return Err(Error::invalid_frame("duplicate map key"));
            }
            staged[index] = (key, value);
        }
        self.entries = staged;
        self.count = count;
        self.defined = true;
        Ok(())
    }
}

impl<K, V, E, C, const N: usize> Field for MapField<K, V, E, C, N>
where
    K: Scalar,
    V: Scalar,
    E: Validator<(K, V)>,
    C: Validator<[(K, V)]>,
{
    fn id(&self) -> FieldId {
        self.id
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Map
    }

    fn is_set(&self) -> bool {
        self.defined
    }

    fn clear(&mut self) {
        MapField::clear(self)
    }

    fn validate(&self) -> Result<()> {
        if !self.defined {
            return self
                .container_chain
                .validate_unset()
                .map_err(|r| r.at(self.id));
        }
        for entry in self.get() {
            self.entry_chain
                .validate(entry)
                .map_err(|r| r.at(self.id))?;
        }
        self.container_chain
            .validate(self.get())
            .map_err(|r| r.at(self.id))
    }

    fn compact_len(&self) -> usize {
        self.count * (K::WIDTH + V::WIDTH)
    }

    fn encode_compact(&self, out: &mut [u8]) -> Result<()> {
        let width = K::WIDTH + V::WIDTH;
        for ((key, value), chunk) in self.get().iter().zip(out.chunks_exact_mut(width)) {
            let (key_bytes, value_bytes) = chunk.split_at_mut(K::WIDTH);
            key.write_le(key_bytes);
            value.write_le(value_bytes);
        }
        Ok(())
    }

    fn decode_compact(&mut self, bytes: &[u8]) -> Result<()> {
        self.stage_raw(bytes)
    }

    fn fixed_width(&self) -> usize {
        COUNT_PREFIX + N * (K::WIDTH + V::WIDTH)
    }

    fn encode_fixed(&self, slot: &mut [u8]) -> Result<()> {
        write_count(slot, self.count);
        let end = COUNT_PREFIX + self.compact_len();
        self.encode_compact(&mut slot[COUNT_PREFIX..end])
    }

    fn decode_fixed(&mut self, slot: &[u8]) -> Result<()> {
        let count = read_count(slot);
        if count > N {
            return Err(Error::invalid_frame("map count exceeds slot"));
        }
        let end = COUNT_PREFIX + count * (K::WIDTH + V::WIDTH);
        self.stage_raw(&slot[COUNT_PREFIX..end])
    }
}

impl<K, V, E, C, const N: usize> FieldType for MapField<K, V, E, C, N>
where
    K: Scalar,
    V: Scalar,
    E: Validator<(K, V)>,
    C: Validator<[(K, V)]>,
{
    type Chains = (E, C);

    const KIND: FieldKind = FieldKind::Map;
    const ELEMENT: Option<ElementType> = Some(ElementType::of::<K>());
    const VALUE: Option<ElementType> = Some(ElementType::of::<V>());
    const CAPACITY: usize = N;
    const FIXED_WIDTH: usize = COUNT_PREFIX + N * (K::WIDTH + V::WIDTH);
    const MAX_COMPACT_LEN: usize = N * (K::WIDTH + V::WIDTH);

    fn declare(id: FieldId, (entry_chain, container_chain): (E, C)) -> Self {
        Self::new(id, entry_chain, container_chain)
    }
}

impl<K: Scalar, V: Scalar, E, C, const N: usize> PartialEq for MapField<K, V, E, C, N> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.defined == other.defined
            && self.entries[..self.count] == other.entries[..other.count]
    }
}

impl<K: Scalar, V: Scalar, E, C, const N: usize> fmt::Debug for MapField<K, V, E, C, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapField")
            .field("id", &self.id)
            .field("entries", &&self.entries[..self.count])
            .field("is_set", &self.defined)
            .finish()
    }
}
