use hashbrown::HashMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bits;
use crate::error::{Result, SimError};
use crate::location::Location;
use crate::state::State;

/// A read-only 2D view of a state, for renderers.
///
/// Observers cannot mutate the state. Grids of any other dimensionality are
/// rejected rather than projected.
pub struct PlaneView<'a> {
    state: &'a State,
    occupancy: HashMap<Location, usize>,
}

impl<'a> PlaneView<'a> {
    pub fn new(state: &'a State) -> Result<Self> {
        let dims = state.configuration().dims();
        if dims != 2 {
            return Err(SimError::UnsupportedDimensionality(dims));
        }
        Ok(Self {
            state,
            occupancy: state.occupancy(),
        })
    }

    pub fn width(&self) -> usize {
        self.state.configuration().extent.coords()[0]
    }

    pub fn height(&self) -> usize {
        self.state.configuration().extent.coords()[1]
    }

    /// Number of distinct values a cell can hold.
    pub fn levels(&self) -> Result<u64> {
        let width = self.state.configuration().data_width;
        u32::try_from(width)
            .ok()
            .and_then(|w| 1u64.checked_shl(w))
            .ok_or(SimError::WidthTooLarge(width))
    }

    /// Cell data read as an unsigned integer.
    pub fn cell_value(&self, x: usize, y: usize) -> Result<u64> {
        let location = Location::of(&[x, y]);
        let data = self.state.cell(&location).ok_or(SimError::OutOfBounds {
            location: location.clone(),
            bound: self.state.configuration().extent.clone(),
        })?;
        bits::bits_to_uint(data)
    }

    /// How many individuals stand on the cell.
    pub fn occupants(&self, x: usize, y: usize) -> usize {
        self.occupancy
            .get(&Location::of(&[x, y]))
            .copied()
            .unwrap_or(0)
    }
}

/// Summary of a finished (or interrupted) run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunSummary {
    pub final_step: u64,
    pub max_population: usize,
    pub avg_population: f64,
    pub extinct: bool,
}

/// Accumulates population sizes over a run.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    population_sizes: Vec<usize>,
    last_step: u64,
    extinct: bool,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, state: &State) {
        self.population_sizes.push(state.population());
        self.last_step = state.step();
        self.extinct = state.is_extinct();
    }

    pub fn population_sizes(&self) -> &[usize] {
        &self.population_sizes
    }

    pub fn summary(&self) -> RunSummary {
        let max_population = self.population_sizes.iter().copied().max().unwrap_or(0);
        let avg_population = if self.population_sizes.is_empty() {
            0.0
        } else {
            self.population_sizes.iter().sum::<usize>() as f64 / self.population_sizes.len() as f64
        };
        RunSummary {
            final_step: self.last_step,
            max_population,
            avg_population,
            extinct: self.extinct,
        }
    }
}
