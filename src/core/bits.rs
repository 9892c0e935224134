//! Fixed-width bit strings and the conversions every other module builds on.
//!
//! Bit strings are least-significant-bit first: index `0` carries weight `1`,
//! index `i` carries weight `2^i`. The text form prints the most significant
//! bit first, so `"011"` is the three-bit string holding `3`.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Largest width that can be read back as an unsigned integer.
pub const MAX_UINT_WIDTH: usize = u64::BITS as usize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct BitString(Vec<bool>);

impl BitString {
    pub fn new(bits: Vec<bool>) -> Self {
        Self(bits)
    }

    /// All-zero string of `width` bits.
    pub fn zeros(width: usize) -> Self {
        Self(vec![false; width])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<bool> {
        self.0.get(index).copied()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }

    pub fn count_ones(&self) -> usize {
        self.0.iter().filter(|b| **b).count()
    }
}

impl From<Vec<bool>> for BitString {
    fn from(bits: Vec<bool>) -> Self {
        Self(bits)
    }
}

impl From<BitString> for Vec<bool> {
    fn from(bits: BitString) -> Self {
        bits.0
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.0.iter().rev() {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for BitString {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        let mut bits = s
            .chars()
            .enumerate()
            .map(|(position, c)| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                found => Err(SimError::InvalidBitChar { position, found }),
            })
            .collect::<Result<Vec<_>>>()?;
        bits.reverse();
        Ok(Self(bits))
    }
}

/// Decodes a least-significant-bit-first string.
pub fn bits_to_uint(bits: &BitString) -> Result<u64> {
    if bits.len() > MAX_UINT_WIDTH {
        return Err(SimError::WidthTooLarge(bits.len()));
    }
    Ok(bits
        .0
        .iter()
        .rev()
        .fold(0u64, |n, bit| (n << 1) | u64::from(*bit)))
}

/// Encodes `n` on exactly `width` bits.
pub fn uint_to_bits(n: u64, width: usize) -> Result<BitString> {
    if width < MAX_UINT_WIDTH && (n >> width) != 0 {
        return Err(SimError::ValueDoesNotFit { value: n, width });
    }
    Ok(BitString(
        (0..width)
            .map(|i| i < MAX_UINT_WIDTH && (n >> i) & 1 == 1)
            .collect(),
    ))
}

/// Smallest `w` with `2^w >= n`. Both `0` and `1` need no bits.
pub fn bit_width(n: u64) -> usize {
    if n <= 1 {
        0
    } else {
        (u64::BITS - (n - 1).leading_zeros()) as usize
    }
}

pub fn is_power_of_two(n: u64) -> bool {
    n.is_power_of_two()
}

pub fn concat(parts: &[&BitString]) -> BitString {
    let mut out = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
    for part in parts {
        out.extend_from_slice(&part.0);
    }
    BitString(out)
}

pub fn slice(bits: &BitString, offset: usize, length: usize) -> Result<BitString> {
    let end = offset
        .checked_add(length)
        .filter(|end| *end <= bits.len())
        .ok_or(SimError::SliceOutOfRange {
            offset,
            length,
            len: bits.len(),
        })?;
    Ok(BitString(bits.0[offset..end].to_vec()))
}

pub fn random_bits<R: Rng + ?Sized>(width: usize, rng: &mut R) -> BitString {
    BitString((0..width).map(|_| rng.gen::<bool>()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn bs(s: &str) -> BitString {
        s.parse().unwrap()
    }

    #[test]
    fn bit_width_is_ceil_log2() {
        assert_eq!(bit_width(1), 0);
        assert_eq!(bit_width(2), 1);
        assert_eq!(bit_width(3), 2);
        assert_eq!(bit_width(4), 2);
        assert_eq!(bit_width(5), 3);
        assert_eq!(bit_width(100), 7);
        assert_eq!(bit_width(u64::MAX), 64);

        for n in 2..2000u64 {
            let w = bit_width(n) as u32;
            assert!(1u64 << (w - 1) < n && n <= 1u64 << w, "n = {n}");
        }
    }

    #[test]
    fn uint_round_trips_at_every_width() {
        for w in 0..10 {
            for n in 0..(1u64 << w) {
                let bits = uint_to_bits(n, w).unwrap();
                assert_eq!(bits.len(), w);
                assert_eq!(bits_to_uint(&bits).unwrap(), n);
            }
        }
        assert_eq!(
            bits_to_uint(&uint_to_bits(u64::MAX, 64).unwrap()).unwrap(),
            u64::MAX
        );
    }

    #[test]
    fn decoding_is_lsb_first() {
        let bits = BitString::new(vec![true, false, false]);
        assert_eq!(bits_to_uint(&bits).unwrap(), 1);
        assert_eq!(uint_to_bits(6, 3).unwrap().as_slice(), &[false, true, true]);
    }

    #[test]
    fn encoding_rejects_values_that_do_not_fit() {
        assert_eq!(
            uint_to_bits(4, 2),
            Err(SimError::ValueDoesNotFit { value: 4, width: 2 })
        );
        assert!(uint_to_bits(1, 0).is_err());
        assert_eq!(uint_to_bits(0, 0).unwrap().len(), 0);
    }

    #[test]
    fn decoding_rejects_wide_strings() {
        let bits = BitString::zeros(65);
        assert_eq!(bits_to_uint(&bits), Err(SimError::WidthTooLarge(65)));
    }

    #[test]
    fn power_of_two() {
        assert!(!is_power_of_two(0));
        assert!(is_power_of_two(1));
        assert!(is_power_of_two(2));
        assert!(!is_power_of_two(3));
        assert!(is_power_of_two(1024));
        assert!(!is_power_of_two(1000));
    }

    #[test]
    fn concat_and_slice() {
        let a = bs("01");
        let b = bs("1");
        let c = bs("");
        let joined = concat(&[&a, &b, &c]);
        // a = [1,0], b = [1]
        assert_eq!(joined.as_slice(), &[true, false, true]);
        assert_eq!(slice(&joined, 1, 2).unwrap().as_slice(), &[false, true]);
        assert_eq!(slice(&joined, 3, 0).unwrap().len(), 0);
        assert_eq!(
            slice(&joined, 2, 2),
            Err(SimError::SliceOutOfRange {
                offset: 2,
                length: 2,
                len: 3
            })
        );
        // Inputs untouched.
        assert_eq!(a, bs("01"));
    }

    #[test]
    fn text_form_is_msb_first() {
        let bits = bs("0011");
        assert_eq!(bits_to_uint(&bits).unwrap(), 3);
        assert_eq!(bits.to_string(), "0011");
        assert_eq!(
            "01x".parse::<BitString>(),
            Err(SimError::InvalidBitChar {
                position: 2,
                found: 'x'
            })
        );
    }

    #[test]
    fn random_bits_are_reproducible() {
        let a = random_bits(128, &mut ChaCha8Rng::seed_from_u64(7));
        let b = random_bits(128, &mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(a.len(), 128);
        assert_eq!(a, b);
        // 128 fair coin flips are neither all heads nor all tails.
        assert!(a.count_ones() > 0 && a.count_ones() < 128);
    }
}
