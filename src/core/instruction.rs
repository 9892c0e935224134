//! Table-driven micro-programs.
//!
//! An instruction tells the individual reading it whether to die, replicate
//! or carry on, how to move along each grid dimension, and how to rewrite
//! its cell and memory: the rewrite is a plain lookup table indexed by the
//! input bits read as an unsigned integer.
//!
//! The flat encoding used for random generation is, in order:
//! - continuation selector (`Continuation::SELECTOR_WIDTH` bits)
//! - one movement selector per dimension (`Movement::SELECTOR_WIDTH` bits each)
//! - `2^input_width` table entries of `output_width` bits each

use std::fmt;

use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bits::{self, BitString};
use crate::error::{Result, SimError};
use crate::state::Configuration;

/// What happens to the acting individual after it reads the instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Continuation {
    #[default]
    None,
    Death,
    Replication,
}

impl Continuation {
    pub const ALL: [Continuation; 3] = [Self::None, Self::Death, Self::Replication];
    pub const SELECTOR_WIDTH: usize = 2;

    /// Total decode: selectors past the last case fold to the first one.
    pub fn from_selector(selector: u64) -> Self {
        usize::try_from(selector)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or(Self::ALL[0])
    }

    pub fn ordinal(self) -> u64 {
        self as u64
    }

    fn symbol(self) -> char {
        match self {
            Self::None => '_',
            Self::Death => '-',
            Self::Replication => '+',
        }
    }
}

/// Displacement along one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Movement {
    #[default]
    Stay,
    Decrease,
    Increase,
}

impl Movement {
    pub const ALL: [Movement; 3] = [Self::Stay, Self::Decrease, Self::Increase];
    pub const SELECTOR_WIDTH: usize = 2;

    /// Total decode: selectors past the last case fold to the first one.
    pub fn from_selector(selector: u64) -> Self {
        usize::try_from(selector)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or(Self::ALL[0])
    }

    pub fn ordinal(self) -> u64 {
        self as u64
    }

    fn symbol(self) -> char {
        match self {
            Self::Stay => 'o',
            Self::Decrease => '-',
            Self::Increase => '+',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Instruction {
    continuation: Continuation,
    movements: Vec<Movement>,
    table: Vec<BitString>,
}

impl Instruction {
    /// Builds an instruction from an explicit table.
    ///
    /// The table length must be a power of two and every entry must have the
    /// same width; that width is the instruction's output width.
    pub fn new(
        continuation: Continuation,
        movements: Vec<Movement>,
        table: Vec<BitString>,
    ) -> Result<Self> {
        if !bits::is_power_of_two(table.len() as u64) {
            return Err(SimError::TableSizeNotPowerOfTwo(table.len()));
        }
        let mut widths: Vec<usize> = table.iter().map(BitString::len).collect();
        widths.sort_unstable();
        widths.dedup();
        if widths.len() != 1 {
            return Err(SimError::NonUniformTableEntries(widths));
        }
        Ok(Self {
            continuation,
            movements,
            table,
        })
    }

    /// Like [`Instruction::new`], additionally requiring the entries to be as
    /// wide as the index, so the table maps `n` bits to `n` bits.
    pub fn self_describing(
        continuation: Continuation,
        movements: Vec<Movement>,
        table: Vec<BitString>,
    ) -> Result<Self> {
        let instruction = Self::new(continuation, movements, table)?;
        if instruction.input_width() != instruction.output_width() {
            return Err(SimError::SelfDescribingWidthMismatch {
                index_width: instruction.input_width(),
                entry_width: instruction.output_width(),
            });
        }
        Ok(instruction)
    }

    /// Number of entries of a table indexed by `input_width` bits.
    fn table_len(input_width: usize) -> Result<usize> {
        u32::try_from(input_width)
            .ok()
            .and_then(|w| 1usize.checked_shl(w))
            .ok_or(SimError::WidthTooLarge(input_width))
    }

    /// Length of the flat encoding for the given shape.
    pub fn size(dims: usize, input_width: usize, output_width: usize) -> Result<usize> {
        let table_bits = Self::table_len(input_width)?
            .checked_mul(output_width)
            .ok_or(SimError::WidthTooLarge(input_width))?;
        Continuation::SELECTOR_WIDTH
            .checked_add(dims * Movement::SELECTOR_WIDTH)
            .and_then(|n| n.checked_add(table_bits))
            .ok_or(SimError::WidthTooLarge(input_width))
    }

    /// Slices a flat bit string into selectors and table entries.
    pub fn decode(
        dims: usize,
        input_width: usize,
        output_width: usize,
        encoded: &BitString,
    ) -> Result<Self> {
        let expected = Self::size(dims, input_width, output_width)?;
        if encoded.len() != expected {
            return Err(SimError::EncodingLengthMismatch {
                found: encoded.len(),
                expected,
            });
        }
        let mut offset = 0;
        let mut take = |width: usize| -> Result<BitString> {
            let chunk = bits::slice(encoded, offset, width)?;
            offset += width;
            Ok(chunk)
        };
        let continuation =
            Continuation::from_selector(bits::bits_to_uint(&take(Continuation::SELECTOR_WIDTH)?)?);
        let movements = (0..dims)
            .map(|_| {
                take(Movement::SELECTOR_WIDTH)
                    .and_then(|s| bits::bits_to_uint(&s))
                    .map(Movement::from_selector)
            })
            .collect::<Result<Vec<_>>>()?;
        let table = (0..Self::table_len(input_width)?)
            .map(|_| take(output_width))
            .collect::<Result<Vec<_>>>()?;
        Self::new(continuation, movements, table)
    }

    /// Inverse of [`Instruction::decode`].
    pub fn encode(&self) -> Result<BitString> {
        let continuation = bits::uint_to_bits(
            self.continuation.ordinal(),
            Continuation::SELECTOR_WIDTH,
        )?;
        let movements = self
            .movements
            .iter()
            .map(|m| bits::uint_to_bits(m.ordinal(), Movement::SELECTOR_WIDTH))
            .collect::<Result<Vec<_>>>()?;
        let mut parts: Vec<&BitString> = Vec::with_capacity(1 + movements.len() + self.table.len());
        parts.push(&continuation);
        parts.extend(movements.iter());
        parts.extend(self.table.iter());
        Ok(bits::concat(&parts))
    }

    pub fn random<R: Rng + ?Sized>(
        dims: usize,
        input_width: usize,
        output_width: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let size = Self::size(dims, input_width, output_width)?;
        Self::decode(
            dims,
            input_width,
            output_width,
            &bits::random_bits(size, rng),
        )
    }

    /// `count` random instructions shaped for the given configuration.
    pub fn random_set<R: Rng + ?Sized>(
        configuration: &Configuration,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Self>> {
        (0..count)
            .map(|_| {
                Self::random(
                    configuration.dims(),
                    configuration.instruction_input_width(),
                    configuration.instruction_output_width(),
                    rng,
                )
            })
            .collect()
    }

    /// Looks up the table entry selected by `input`.
    pub fn apply(&self, input: &BitString) -> Result<&BitString> {
        if input.len() != self.input_width() {
            return Err(SimError::InputWidthMismatch {
                found: input.len(),
                expected: self.input_width(),
            });
        }
        let index = bits::bits_to_uint(input)?;
        usize::try_from(index)
            .ok()
            .and_then(|i| self.table.get(i))
            .ok_or(SimError::WidthTooLarge(input.len()))
    }

    pub fn continuation(&self) -> Continuation {
        self.continuation
    }

    pub fn movements(&self) -> &[Movement] {
        &self.movements
    }

    pub fn table(&self) -> &[BitString] {
        &self.table
    }

    pub fn input_width(&self) -> usize {
        bits::bit_width(self.table.len() as u64)
    }

    pub fn output_width(&self) -> usize {
        self.table.first().map_or(0, BitString::len)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{};", self.continuation.symbol())?;
        for m in &self.movements {
            write!(f, "{}", m.symbol())?;
        }
        f.write_str(";")?;
        for (i, entry) in self.table.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{entry}")?;
        }
        f.write_str(">")
    }
}
