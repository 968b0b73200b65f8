//! Validation strategies for staged field values.
//!
//! Every field declares a validator chain; there is no implicit "no constraint"
//! default. A chain is a tuple of validators evaluated left to right that stops
//! at the first rejection. [`NoValidation`] is the explicit opt-out.
//!
//! Validators are pure: they see one staged value (never its siblings), do not
//! recurse and do not allocate. Cross-field checks belong to the message-level
//! rules function declared with [`message!`](crate::message).

use crate::error::{Error, ValidationTarget};
use crate::field::FieldId;
use std::fmt;

/// Why a validator refused a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub validator: &'static str,
    pub reason: &'static str,
}

impl Rejection {
    pub const fn new(validator: &'static str, reason: &'static str) -> Self {
        Self { validator, reason }
    }

    /// Attributes the rejection to a field.
    pub fn at(self, field: FieldId) -> Error {
        self.into_error(ValidationTarget::Field(field))
    }

    /// Attributes the rejection to the message-level rules.
    pub fn message_level(self) -> Error {
        self.into_error(ValidationTarget::Message)
    }

    fn into_error(self, target: ValidationTarget) -> Error {
        Error::ValidationFailed {
            target,
            validator: self.validator,
            reason: self.reason,
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.validator, self.reason)
    }
}

/// A pure predicate over a staged value.
pub trait Validator<T: ?Sized> {
    /// Checks a value that is about to be (or already is) staged.
    fn validate(&self, value: &T) -> Result<(), Rejection>;

    /// Called during message validation when the field holds no value.
    fn validate_unset(&self) -> Result<(), Rejection> {
        Ok(())
    }

    /// Returns the name of this validator for diagnostics.
    fn name(&self) -> &'static str;
}

/// The explicit "do not check" validator.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoValidation;

impl<T: ?Sized> Validator<T> for NoValidation {
    #[inline(always)]
    fn validate(&self, _value: &T) -> Result<(), Rejection> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// The field must be set by the time its message is validated.
#[derive(Debug, Default, Clone, Copy)]
pub struct Required;

impl<T: ?Sized> Validator<T> for Required {
    #[inline(always)]
    fn validate(&self, _value: &T) -> Result<(), Rejection> {
        Ok(())
    }

    fn validate_unset(&self) -> Result<(), Rejection> {
        Err(Rejection::new("required", "field is required but not set"))
    }

    fn name(&self) -> &'static str {
        "required"
    }
}

/// Strictly greater than the type's zero value.
#[derive(Debug, Default, Clone, Copy)]
pub struct Positive;

impl<T: PartialOrd + Default> Validator<T> for Positive {
    #[inline]
    fn validate(&self, value: &T) -> Result<(), Rejection> {
        if *value > T::default() {
            Ok(())
        } else {
            Err(Rejection::new("positive", "value must be greater than zero"))
        }
    }

    fn name(&self) -> &'static str {
        "positive"
    }
}

/// Inclusive bounds check.
#[derive(Debug, Clone, Copy)]
pub struct InRange<T> {
    min: T,
    max: T,
}

impl<T: PartialOrd> InRange<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: PartialOrd> Validator<T> for InRange<T> {
    #[inline]
    fn validate(&self, value: &T) -> Result<(), Rejection> {
        if *value < self.min {
            return Err(Rejection::new("range", "value is below the minimum"));
        }
        if *value > self.max {
            return Err(Rejection::new("range", "value is above the maximum"));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "range"
    }
}

/// Membership in a fixed set of allowed values.
#[derive(Debug, Clone, Copy)]
pub struct OneOf<T: 'static>(pub &'static [T]);

impl<T: PartialEq + 'static> Validator<T> for OneOf<T> {
    fn validate(&self, value: &T) -> Result<(), Rejection> {
        if self.0.contains(value) {
            Ok(())
        } else {
            Err(Rejection::new("one_of", "value is not an allowed member"))
        }
    }

    fn name(&self) -> &'static str {
        "one_of"
    }
}

/// A string with at least one byte or a collection with at least one element.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonEmpty;

impl Validator<str> for NonEmpty {
    fn validate(&self, value: &str) -> Result<(), Rejection> {
        if value.is_empty() {
            Err(Rejection::new("non_empty", "string must not be empty"))
        } else {
            Ok(())
        }
    }

    fn name(&self) -> &'static str {
        "non_empty"
    }
}

impl<T> Validator<[T]> for NonEmpty {
    fn validate(&self, value: &[T]) -> Result<(), Rejection> {
        if value.is_empty() {
            Err(Rejection::new("non_empty", "collection must not be empty"))
        } else {
            Ok(())
        }
    }

    fn name(&self) -> &'static str {
        "non_empty"
    }
}

/// Inclusive bounds on string byte length or collection element count.
#[derive(Debug, Clone, Copy)]
pub struct Length {
    min: usize,
    max: usize,
}

impl Length {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    fn check(&self, len: usize) -> Result<(), Rejection> {
        if len < self.min {
            return Err(Rejection::new("length", "shorter than the minimum length"));
        }
        if len > self.max {
            return Err(Rejection::new("length", "longer than the maximum length"));
        }
        Ok(())
    }
}

impl Validator<str> for Length {
    fn validate(&self, value: &str) -> Result<(), Rejection> {
        self.check(value.len())
    }

    fn name(&self) -> &'static str {
        "length"
    }
}

impl<T> Validator<[T]> for Length {
    fn validate(&self, value: &[T]) -> Result<(), Rejection> {
        self.check(value.len())
    }

    fn name(&self) -> &'static str {
        "length"
    }
}

/// A collection holding exactly `n` elements.
#[derive(Debug, Clone, Copy)]
pub struct ExactCount(pub usize);

impl<T> Validator<[T]> for ExactCount {
    fn validate(&self, value: &[T]) -> Result<(), Rejection> {
        if value.len() == self.0 {
            Ok(())
        } else {
            Err(Rejection::new("exact_count", "element count differs from the declared count"))
        }
    }

    fn name(&self) -> &'static str {
        "exact_count"
    }
}

/// A user-defined check backed by a plain function pointer.
///
/// Function pointers cannot capture state, which keeps custom validators pure.
///
/// ```rust
/// use fixedwire::{Predicate, Validator};
///
/// let even = Predicate::new("even", |v: &i32| v % 2 == 0, "value must be even");
/// assert!(even.validate(&4).is_ok());
/// assert_eq!(even.validate(&3).unwrap_err().validator, "even");
/// ```
pub struct Predicate<T: ?Sized> {
    name: &'static str,
    test: fn(&T) -> bool,
    reason: &'static str,
}

impl<T: ?Sized> Predicate<T> {
    pub const fn new(name: &'static str, test: fn(&T) -> bool, reason: &'static str) -> Self {
        Self { name, test, reason }
    }
}

impl<T: ?Sized> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Predicate<T> {}

impl<T: ?Sized> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").field("name", &self.name).finish()
    }
}

impl<T: ?Sized> Validator<T> for Predicate<T> {
    fn validate(&self, value: &T) -> Result<(), Rejection> {
        if (self.test)(value) {
            Ok(())
        } else {
            Err(Rejection::new(self.name, self.reason))
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Applies a key validator to map entries.
#[derive(Debug, Clone, Copy)]
pub struct OnKey<V>(pub V);

/// Applies a value validator to map entries.
#[derive(Debug, Clone, Copy)]
pub struct OnValue<V>(pub V);

impl<K, T, V: Validator<K>> Validator<(K, T)> for OnKey<V> {
    fn validate(&self, entry: &(K, T)) -> Result<(), Rejection> {
        self.0.validate(&entry.0)
    }

    fn name(&self) -> &'static str {
        self.0.name()
    }
}

impl<K, T, V: Validator<T>> Validator<(K, T)> for OnValue<V> {
    fn validate(&self, entry: &(K, T)) -> Result<(), Rejection> {
        self.0.validate(&entry.1)
    }

    fn name(&self) -> &'static str {
        self.0.name()
    }
}

macro_rules! impl_chain {
    ($($v:ident),+) => {
        impl<T: ?Sized, $($v: Validator<T>),+> Validator<T> for ($($v,)+) {
            #[inline]
            #[allow(non_snake_case)]
            fn validate(&self, value: &T) -> Result<(), Rejection> {
                let ($($v,)+) = self;
                $($v.validate(value)?;)+
                Ok(())
            }

            #[allow(non_snake_case)]
            fn validate_unset(&self) -> Result<(), Rejection> {
                let ($($v,)+) = self;
                $($v.validate_unset()?;)+
                Ok(())
            }

            fn name(&self) -> &'static str {
                "chain"
            }
        }
    };
}

impl_chain!(A);
impl_chain!(A, B);
impl_chain!(A, B, C);
impl_chain!(A, B, C, D);
impl_chain!(A, B, C, D, E);
impl_chain!(A, B, C, D, E, F);
impl_chain!(A, B, C, D, E, F, G);
impl_chain!(A, B, C, D, E, F, G, H);
