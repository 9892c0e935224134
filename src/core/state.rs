use std::sync::Arc;

use hashbrown::HashMap;
use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bits::{self, BitString};
use crate::error::{Result, SimError};
use crate::individual::Individual;
use crate::instruction::Instruction;
use crate::location::Location;

/// Run-wide parameters, fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Configuration {
    /// Grid extent: exclusive upper bound per dimension.
    pub extent: Location,
    /// Wrap around the grid edges instead of clamping.
    pub toroidal: bool,
    /// Bits of data stored in each cell.
    pub data_width: usize,
    /// Bits of private memory carried by each individual.
    pub memory_width: usize,
    pub max_population: usize,
}

impl Default for Configuration {
    /// A 64x64 bounded grid, 4 data bits, 3 memory bits, up to 100 individuals.
    fn default() -> Self {
        Self {
            extent: Location::of(&[64, 64]),
            toroidal: false,
            data_width: 4,
            memory_width: 3,
            max_population: 100,
        }
    }
}

impl Configuration {
    pub fn new(extent: Location) -> Self {
        Self {
            extent,
            ..Self::default()
        }
    }

    pub fn with_toroidal(mut self, toroidal: bool) -> Self {
        self.toroidal = toroidal;
        self
    }

    pub fn with_data_width(mut self, width: usize) -> Self {
        self.data_width = width;
        self
    }

    pub fn with_memory_width(mut self, width: usize) -> Self {
        self.memory_width = width;
        self
    }

    pub fn with_max_population(mut self, max_population: usize) -> Self {
        self.max_population = max_population;
        self
    }

    #[inline]
    pub fn dims(&self) -> usize {
        self.extent.dims()
    }

    /// Bits used to expose how many individuals share a cell.
    pub fn occupancy_width(&self) -> usize {
        bits::bit_width(self.max_population as u64)
    }

    pub fn instruction_input_width(&self) -> usize {
        self.data_width + self.occupancy_width() + self.memory_width
    }

    pub fn instruction_output_width(&self) -> usize {
        self.data_width + self.memory_width
    }

    pub fn validate(&self) -> Result<()> {
        if self.dims() == 0 {
            return Err(SimError::InvalidConfiguration("extent has no dimensions"));
        }
        if self.extent.coords().contains(&0) {
            return Err(SimError::InvalidConfiguration("extent has an empty dimension"));
        }
        if self.max_population == 0 {
            return Err(SimError::InvalidConfiguration("max_population must be >= 1"));
        }
        Instruction::size(
            self.dims(),
            self.instruction_input_width(),
            self.instruction_output_width(),
        )?;
        Ok(())
    }

    /// Checks that `state` is a legal state for this configuration.
    ///
    /// Every cell key must lie within the extent, every location within the
    /// extent must have data of `data_width` bits, and every individual must
    /// stand within the extent with `memory_width` bits of memory.
    pub fn check_state(&self, state: &State) -> Result<()> {
        for (location, data) in &state.data {
            if !location.is_within(&self.extent)? {
                return Err(SimError::OutOfBounds {
                    location: location.clone(),
                    bound: self.extent.clone(),
                });
            }
            if data.len() != self.data_width {
                return Err(SimError::CellDataWidthMismatch {
                    location: location.clone(),
                    found: data.len(),
                    expected: self.data_width,
                });
            }
        }
        let missing: Vec<Location> = self
            .extent
            .bounded_locations()
            .filter(|l| !state.data.contains_key(l))
            .collect();
        if !missing.is_empty() {
            return Err(SimError::MissingCells(missing));
        }
        for individual in &state.individuals {
            if !individual.location().is_within(&self.extent)? {
                return Err(SimError::OutOfBounds {
                    location: individual.location().clone(),
                    bound: self.extent.clone(),
                });
            }
            if individual.memory().len() != self.memory_width {
                return Err(SimError::MemoryWidthMismatch {
                    found: individual.memory().len(),
                    expected: self.memory_width,
                });
            }
        }
        debug!(
            step = state.step,
            cells = state.data.len(),
            population = state.individuals.len(),
            "state checked"
        );
        Ok(())
    }

    /// Builds step 0: every cell filled by `generator` (called with the data
    /// width), one seed individual at the center of the grid.
    pub fn initial_state<F>(&self, generator: F) -> Result<State>
    where
        F: FnMut(usize) -> BitString,
    {
        State::initial(Arc::new(self.clone()), generator)
    }

    pub fn random_initial_state<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<State> {
        self.initial_state(|width| bits::random_bits(width, rng))
    }
}

/// One snapshot of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub(crate) step: u64,
    pub(crate) data: HashMap<Location, BitString>,
    pub(crate) individuals: Vec<Individual>,
    pub(crate) configuration: Arc<Configuration>,
}

impl State {
    /// Assembles a state and validates it against its configuration.
    pub fn new(
        step: u64,
        data: HashMap<Location, BitString>,
        individuals: Vec<Individual>,
        configuration: Arc<Configuration>,
    ) -> Result<Self> {
        let state = Self {
            step,
            data,
            individuals,
            configuration,
        };
        state.validate()?;
        Ok(state)
    }

    /// Step 0 of a run; see [`Configuration::initial_state`].
    pub fn initial<F>(configuration: Arc<Configuration>, mut generator: F) -> Result<Self>
    where
        F: FnMut(usize) -> BitString,
    {
        configuration.validate()?;
        let data = configuration
            .extent
            .bounded_locations()
            .map(|l| (l, generator(configuration.data_width)))
            .collect();
        let seed = Individual::newborn(
            configuration.extent.center(),
            0,
            configuration.memory_width,
        );
        Self::new(0, data, vec![seed], configuration)
    }

    pub fn validate(&self) -> Result<()> {
        self.configuration.check_state(self)
    }

    #[inline]
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn data(&self) -> &HashMap<Location, BitString> {
        &self.data
    }

    pub fn cell(&self, location: &Location) -> Option<&BitString> {
        self.data.get(location)
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    #[inline]
    pub fn population(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_extinct(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Number of individuals standing on each occupied location.
    pub fn occupancy(&self) -> HashMap<Location, usize> {
        let mut counts = HashMap::new();
        for individual in &self.individuals {
            *counts.entry(individual.location().clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of distinct occupied locations.
    pub fn filled_locations(&self) -> usize {
        self.occupancy().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn small() -> Configuration {
        Configuration::new(Location::of(&[2, 2]))
            .with_data_width(2)
            .with_memory_width(1)
            .with_max_population(4)
    }

    #[test]
    fn derived_widths() {
        let cfg = Configuration::default();
        assert_eq!(cfg.occupancy_width(), 7);
        assert_eq!(cfg.instruction_input_width(), 4 + 7 + 3);
        assert_eq!(cfg.instruction_output_width(), 4 + 3);

        let cfg = small().with_max_population(1);
        assert_eq!(cfg.occupancy_width(), 0);
        assert_eq!(cfg.instruction_input_width(), 3);
    }

    #[test]
    fn invalid_configurations() {
        assert!(Configuration::new(Location::of(&[])).validate().is_err());
        assert!(Configuration::new(Location::of(&[3, 0])).validate().is_err());
        assert!(small().with_max_population(0).validate().is_err());
        assert_eq!(
            small().with_data_width(100).validate(),
            Err(SimError::WidthTooLarge(103))
        );
        assert!(Configuration::default().validate().is_ok());
    }

    #[test]
    fn initial_state_covers_grid_with_one_seed() {
        let state = small().initial_state(BitString::zeros).unwrap();
        assert_eq!(state.step(), 0);
        assert_eq!(state.data().len(), 4);
        assert_eq!(state.individuals().len(), 1);
        let seed = &state.individuals()[0];
        assert_eq!(seed.location(), &Location::of(&[1, 1]));
        assert_eq!(seed.birth(), 0);
        assert_eq!(seed.memory(), &BitString::zeros(1));
        assert_eq!(state.filled_locations(), 1);
    }

    #[test]
    fn random_initial_state_is_reproducible() {
        let cfg = Configuration::default();
        let a = cfg
            .random_initial_state(&mut ChaCha8Rng::seed_from_u64(5))
            .unwrap();
        let b = cfg
            .random_initial_state(&mut ChaCha8Rng::seed_from_u64(5))
            .unwrap();
        assert_eq!(a.data().len(), 64 * 64);
        assert_eq!(a, b);
    }

    #[test]
    fn generator_width_is_checked() {
        let err = small().initial_state(|_| BitString::zeros(3)).unwrap_err();
        assert!(matches!(err, SimError::CellDataWidthMismatch { found: 3, expected: 2, .. }));
    }

    #[test]
    fn external_state_missing_cells() {
        let cfg = Arc::new(small());
        let mut data = HashMap::new();
        data.insert(Location::of(&[0, 0]), BitString::zeros(2));
        let err = State::new(0, data, vec![], cfg).unwrap_err();
        match err {
            SimError::MissingCells(missing) => assert_eq!(missing.len(), 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn external_state_out_of_bounds_cell() {
        let cfg = Arc::new(small());
        let mut data: HashMap<_, _> = cfg
            .extent
            .bounded_locations()
            .map(|l| (l, BitString::zeros(2)))
            .collect();
        data.insert(Location::of(&[2, 0]), BitString::zeros(2));
        assert!(matches!(
            State::new(0, data, vec![], cfg),
            Err(SimError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn external_state_bad_individuals() {
        let cfg = Arc::new(small());
        let data: HashMap<_, _> = cfg
            .extent
            .bounded_locations()
            .map(|l| (l, BitString::zeros(2)))
            .collect();

        let outside = Individual::newborn(Location::of(&[0, 5]), 0, 1);
        assert!(matches!(
            State::new(0, data.clone(), vec![outside], cfg.clone()),
            Err(SimError::OutOfBounds { .. })
        ));

        let wrong_memory = Individual::newborn(Location::of(&[0, 1]), 0, 2);
        assert_eq!(
            State::new(0, data.clone(), vec![wrong_memory], cfg.clone()),
            Err(SimError::MemoryWidthMismatch {
                found: 2,
                expected: 1
            })
        );

        let wrong_dims = Individual::newborn(Location::of(&[0]), 0, 1);
        assert!(matches!(
            State::new(0, data, vec![wrong_dims], cfg),
            Err(SimError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn occupancy_counts_shared_cells() {
        let cfg = Arc::new(small());
        let data: HashMap<_, _> = cfg
            .extent
            .bounded_locations()
            .map(|l| (l, BitString::zeros(2)))
            .collect();
        let individuals = vec![
            Individual::newborn(Location::of(&[0, 0]), 0, 1),
            Individual::newborn(Location::of(&[0, 0]), 1, 1),
            Individual::newborn(Location::of(&[1, 0]), 1, 1),
        ];
        let state = State::new(3, data, individuals, cfg).unwrap();
        assert_eq!(state.population(), 3);
        assert_eq!(state.filled_locations(), 2);
        assert_eq!(state.occupancy()[&Location::of(&[0, 0])], 2);
    }
}
