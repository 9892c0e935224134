use thiserror::Error;

use crate::location::Location;

/// Errors raised by the simulation core.
///
/// Nothing here is retried or recovered: every variant is a programmer or
/// configuration error surfaced at the point where it is detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    // Configuration errors.
    /// An instruction does not match the run's derived input/output widths.
    #[error("wrong io size for instruction {index}: {found_input}->{found_output} != {expected_input}->{expected_output}")]
    InstructionWidthMismatch {
        index: usize,
        found_input: usize,
        found_output: usize,
        expected_input: usize,
        expected_output: usize,
    },
    #[error("wrong number of table entries: {0} is not a power of 2")]
    TableSizeNotPowerOfTwo(usize),
    #[error("non uniform size of table entries: {0:?}")]
    NonUniformTableEntries(Vec<usize>),
    #[error("table entries are {entry_width} bits wide but the table is indexed by {index_width} bits")]
    SelfDescribingWidthMismatch {
        index_width: usize,
        entry_width: usize,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
    /// The instruction selector needs more bits than a cell holds.
    #[error("selecting among {instructions} instructions needs {selector_width} bits, cells hold {data_width}")]
    SelectorWiderThanCellData {
        instructions: usize,
        selector_width: usize,
        data_width: usize,
    },
    #[error("width {0} is too large")]
    WidthTooLarge(usize),

    // State validity errors.
    #[error("location {location} is not within {bound}")]
    OutOfBounds { location: Location, bound: Location },
    #[error("missing cell data for {} locations: {:?}", .0.len(), .0)]
    MissingCells(Vec<Location>),
    #[error("wrong individual memory size: {found} != {expected}")]
    MemoryWidthMismatch { found: usize, expected: usize },
    #[error("wrong cell data size at {location}: {found} != {expected}")]
    CellDataWidthMismatch {
        location: Location,
        found: usize,
        expected: usize,
    },
    #[error("wrong coords size: {found} != {expected}")]
    DimensionMismatch { found: usize, expected: usize },
    #[error("state was built for a different configuration")]
    ConfigurationMismatch,

    // Decode errors.
    #[error("wrong encoding size: {found} found, {expected} expected")]
    EncodingLengthMismatch { found: usize, expected: usize },
    #[error("value {value} does not fit in {width} bits")]
    ValueDoesNotFit { value: u64, width: usize },
    #[error("slice {offset}+{length} exceeds bit string of length {len}")]
    SliceOutOfRange {
        offset: usize,
        length: usize,
        len: usize,
    },
    #[error("wrong char in bit string at {position}: {found:?}")]
    InvalidBitChar { position: usize, found: char },
    #[error("wrong input size: {found} found, {expected} expected")]
    InputWidthMismatch { found: usize, expected: usize },

    // Observation errors.
    #[error("only 2D states can be viewed as a plane: {0} dimensions found")]
    UnsupportedDimensionality(usize),
}

pub type Result<T> = std::result::Result<T, SimError>;
