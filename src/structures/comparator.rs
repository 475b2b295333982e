//! Comparators for B+ tree key ordering.
//!
//! Keys live in node pages as fixed-width byte arrays serialized in the
//! platform's native byte order, so comparators must detect the platform
//! and reconstruct values before comparing.
//!
//! We provide the following comparators:
//!
//! - [`NumericComparator`]: unsigned numerics in **native** byte order
//! - [`SignedNumericComparator`]: signed numerics in native byte order
//! - [`FixedSizeBytesComparator`]: lexicographic comparison (byte-by-byte)

use std::{cmp::Ordering, io, mem};

/// Detects if the platform is little-endian at compile time.
#[cfg(target_endian = "little")]
const IS_LITTLE_ENDIAN: bool = true;

#[cfg(target_endian = "big")]
const IS_LITTLE_ENDIAN: bool = false;

pub trait Comparator {
    /// Compares two keys.
    fn compare(&self, lhs: &[u8], rhs: &[u8]) -> io::Result<Ordering>;

    /// Returns the number of significant bytes in a key.
    fn key_size(&self) -> usize;
}

/// Comparator for unsigned numeric types stored in platform-native byte
/// order.
///
/// Reconstructs the value from bytes before comparison, so the result does
/// not depend on the platform's endianness.
#[derive(Debug, Clone, Copy)]
pub struct NumericComparator(usize);

impl NumericComparator {
    pub fn with_type<T>() -> Self {
        Self(mem::size_of::<T>().min(8))
    }

    pub fn for_size(size: usize) -> Self {
        Self(size.min(8))
    }

    /// Reads bytes as u64 using platform-native byte order.
    #[inline]
    fn read_native_u64(&self, bytes: &[u8]) -> u64 {
        let size = self.0.min(bytes.len());
        let mut value: u64 = 0;

        if IS_LITTLE_ENDIAN {
            for (i, byte) in bytes[..size].iter().enumerate() {
                value |= (*byte as u64) << (8 * i);
            }
        } else {
            for (i, byte) in bytes[..size].iter().enumerate() {
                value |= (*byte as u64) << (8 * (size - 1 - i));
            }
        }

        value
    }
}

impl Comparator for NumericComparator {
    fn compare(&self, lhs: &[u8], rhs: &[u8]) -> io::Result<Ordering> {
        let a = self.read_native_u64(lhs);
        let b = self.read_native_u64(rhs);
        Ok(a.cmp(&b))
    }

    fn key_size(&self) -> usize {
        self.0
    }
}

/// Comparator for signed numeric types stored in platform-native byte order.
#[derive(Debug, Clone, Copy)]
pub struct SignedNumericComparator(usize);

impl SignedNumericComparator {
    pub fn with_type<T>() -> Self {
        Self(mem::size_of::<T>().min(8))
    }

    pub fn for_size(size: usize) -> Self {
        Self(size.min(8))
    }

    /// Reads bytes as i64 using platform-native byte order.
    #[inline]
    fn read_native_i64(&self, bytes: &[u8]) -> i64 {
        let size = self.0.min(bytes.len());
        let mut value: u64 = 0;

        if IS_LITTLE_ENDIAN {
            for (i, byte) in bytes[..size].iter().enumerate() {
                value |= (*byte as u64) << (8 * i);
            }
        } else {
            for (i, byte) in bytes[..size].iter().enumerate() {
                value |= (*byte as u64) << (8 * (size - 1 - i));
            }
        }

        let bits = size * 8;
        if bits == 0 {
            return 0;
        }
        if bits >= 64 {
            return value as i64;
        }

        // Extend sign bits for smaller types
        let sign_bit = 1u64 << (bits - 1);
        if value & sign_bit != 0 {
            let mask = !((1u64 << bits) - 1);
            (value | mask) as i64
        } else {
            value as i64
        }
    }
}

impl Comparator for SignedNumericComparator {
    fn compare(&self, lhs: &[u8], rhs: &[u8]) -> io::Result<Ordering> {
        let a = self.read_native_i64(lhs);
        let b = self.read_native_i64(rhs);
        Ok(a.cmp(&b))
    }

    fn key_size(&self) -> usize {
        self.0
    }
}

/// Comparator for fixed-size byte arrays using lexicographic ordering.
///
/// Compares bytes from left to right (big-endian style), which is what you
/// want for UUIDs, fixed-length strings and anything already serialized in
/// big-endian order.
#[derive(Debug, Clone, Copy)]
pub struct FixedSizeBytesComparator(usize);

impl FixedSizeBytesComparator {
    pub fn with_type<T>() -> Self {
        Self(mem::size_of::<T>())
    }

    pub fn for_size(size: usize) -> Self {
        Self(size)
    }
}

impl Comparator for FixedSizeBytesComparator {
    fn compare(&self, lhs: &[u8], rhs: &[u8]) -> io::Result<Ordering> {
        if lhs.len() < self.0 || rhs.len() < self.0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Keys must carry at least {} bytes", self.0),
            ));
        }
        Ok(lhs[..self.0].cmp(&rhs[..self.0]))
    }

    fn key_size(&self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod comparators_tests {
    use super::*;
    use std::io;

    #[test]
    fn test_platform_endianness_detection() {
        let runtime_le = cfg!(target_endian = "little");
        assert_eq!(IS_LITTLE_ENDIAN, runtime_le);
    }

    #[test]
    fn test_numeric_comparator_native_order() -> io::Result<()> {
        let comparator = NumericComparator::with_type::<u64>();

        let a = 100u64.to_ne_bytes();
        let b = 50u64.to_ne_bytes();

        assert_eq!(comparator.compare(&a, &b)?, Ordering::Greater);
        assert_eq!(comparator.compare(&b, &a)?, Ordering::Less);
        assert_eq!(comparator.compare(&a, &a)?, Ordering::Equal);

        Ok(())
    }

    #[test]
    fn test_numeric_comparator_narrow_type() -> io::Result<()> {
        let comparator = NumericComparator::with_type::<u16>();

        let a = 300u16.to_ne_bytes();
        let b = 299u16.to_ne_bytes();

        assert_eq!(comparator.compare(&a, &b)?, Ordering::Greater);
        Ok(())
    }

    #[test]
    fn test_signed_numeric_comparator() -> io::Result<()> {
        let comparator = SignedNumericComparator::with_type::<i64>();

        let a = (-10i64).to_ne_bytes();
        let b = 10i64.to_ne_bytes();
        let c = (-20i64).to_ne_bytes();

        // -10 < 10
        assert_eq!(comparator.compare(&a, &b)?, Ordering::Less);
        // -10 > -20
        assert_eq!(comparator.compare(&a, &c)?, Ordering::Greater);

        Ok(())
    }

    #[test]
    fn test_signed_numeric_comparator_sign_extension() -> io::Result<()> {
        let comparator = SignedNumericComparator::with_type::<i16>();

        let a = (-1i16).to_ne_bytes();
        let b = 1i16.to_ne_bytes();

        assert_eq!(comparator.compare(&a, &b)?, Ordering::Less);
        Ok(())
    }

    #[test]
    fn test_fixed_size_bytes_comparator() -> io::Result<()> {
        let comparator = FixedSizeBytesComparator::for_size(4);

        // Lexicographic: [0, 1, 0, 0] < [1, 0, 0, 0]
        let a = &[0u8, 1, 0, 0];
        let b = &[1u8, 0, 0, 0];

        assert_eq!(comparator.compare(a, b)?, Ordering::Less);

        Ok(())
    }

    #[test]
    fn test_fixed_size_bytes_comparator_short_key() {
        let comparator = FixedSizeBytesComparator::for_size(4);
        assert!(comparator.compare(&[0u8, 1], &[1u8, 0, 0, 0]).is_err());
    }
}
