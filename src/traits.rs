//! Core traits for the fixed-width value catalog.

use crate::field::FieldKind;

/// A fixed-width value that can live in a field slot.
///
/// Implemented for the primitive integers, floats and `bool`, and by
/// [`wire_enum!`](crate::wire_enum) for schema enums. Values are written
/// little-endian and always occupy exactly `WIDTH` bytes on the wire.
pub trait Scalar: Copy + Default + PartialEq + std::fmt::Debug + 'static {
    /// Encoded size in bytes.
    const WIDTH: usize;

    /// Type name reported in field descriptors.
    const NAME: &'static str;

    /// Reported in field descriptors.
    const KIND: FieldKind = FieldKind::Scalar;

    /// Writes the value into `out`, which is exactly `WIDTH` bytes long.
    fn write_le(self, out: &mut [u8]);

    /// Reads a value from exactly `WIDTH` bytes.
    ///
    /// Returns `None` for byte patterns that do not map to a value
    /// (e.g. a `bool` byte other than 0 or 1, or an unknown enum discriminant).
    fn read_le(bytes: &[u8]) -> Option<Self>;
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();
                const NAME: &'static str = stringify!($ty);

                #[inline]
                fn write_le(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_le(bytes: &[u8]) -> Option<Self> {
                    bytes.try_into().ok().map(<$ty>::from_le_bytes)
                }
            }
        )*
    };
}

impl_scalar!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Scalar for bool {
    const WIDTH: usize = 1;
    const NAME: &'static str = "bool";

    #[inline]
    fn write_le(self, out: &mut [u8]) {
        out[0] = self as u8;
    }

    #[inline]
    fn read_le(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0] => Some(false),
            [1] => Some(true),
            _ => None,
        }
    }
}

/// Declares a schema enum encoded as a `u16` discriminant.
///
/// The first variant is the default (the staged value of an unset field).
///
/// ```rust
/// fixedwire::wire_enum! {
///     pub enum Mode {
///         Idle = 0,
///         Armed = 1,
///         Firing = 7,
///     }
/// }
///
/// use fixedwire::Scalar;
/// let mut out = [0u8; 2];
/// Mode::Firing.write_le(&mut out);
/// assert_eq!(out, [7, 0]);
/// assert_eq!(Mode::read_le(&[1, 0]), Some(Mode::Armed));
/// assert_eq!(Mode::read_le(&[2, 0]), None);
/// ```
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $first:ident = $first_raw:literal
            $(, $variant:ident = $raw:literal)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        #[repr(u16)]
        $vis enum $name {
            #[default]
            $first = $first_raw,
            $($variant = $raw,)*
        }

        impl $crate::Scalar for $name {
            const WIDTH: usize = 2;
            const NAME: &'static str = stringify!($name);
            const KIND: $crate::FieldKind = $crate::FieldKind::Enum;

            fn write_le(self, out: &mut [u8]) {
                out.copy_from_slice(&(self as u16).to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> ::core::option::Option<Self> {
                let raw = u16::from_le_bytes(bytes.try_into().ok()?);
                match raw {
                    r if r == $first_raw => ::core::option::Option::Some(Self::$first),
                    $(r if r == $raw => ::core::option::Option::Some(Self::$variant),)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    };
}
