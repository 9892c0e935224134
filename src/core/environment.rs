//! The stepping engine.
//!
//! One step is a single ordered pass over the population. Every individual
//! reads its cell as it was at the start of the step, picks an instruction
//! from the cell's leading bits, and either dies or (optionally replicating)
//! rewrites its cell and memory and then moves. Writes to a shared cell are
//! collected and reduced afterwards: the earliest-born writer wins, ties go
//! to whoever was processed first.

use std::sync::Arc;

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use tracing::{debug, trace};

use crate::bits::{self, BitString};
use crate::error::{Result, SimError};
use crate::individual::Individual;
use crate::instruction::{Continuation, Instruction};
use crate::location::Location;
use crate::state::{Configuration, State};

/// A run: its configuration and its fixed instruction set.
#[derive(Debug, Clone)]
pub struct Environment {
    configuration: Arc<Configuration>,
    instructions: Vec<Instruction>,
    selector_width: usize,
}

/// A candidate rewrite of one cell, recorded while scanning the population.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
    pub location: Location,
    /// Birth step of the writer.
    pub birth: u64,
    /// Position of the writer in the population scan.
    pub order: usize,
    pub data: BitString,
}

impl CellWrite {
    /// Whether this write beats `other` for the same cell.
    pub fn precedes(&self, other: &CellWrite) -> bool {
        (self.birth, self.order) < (other.birth, other.order)
    }
}

/// Reduces candidate writes to one winner per cell.
///
/// The result does not depend on the order of `writes`.
pub fn resolve_writes(writes: impl IntoIterator<Item = CellWrite>) -> HashMap<Location, BitString> {
    let mut winners: HashMap<Location, CellWrite> = HashMap::new();
    for write in writes {
        match winners.entry(write.location.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(write);
            }
            Entry::Occupied(mut slot) => {
                if write.precedes(slot.get()) {
                    slot.insert(write);
                }
            }
        }
    }
    winners
        .into_iter()
        .map(|(location, write)| (location, write.data))
        .collect()
}

/// Keeps the low `width` bits of `n`.
fn low_bits(n: u64, width: usize) -> Result<BitString> {
    let masked = if width >= bits::MAX_UINT_WIDTH {
        n
    } else {
        n & ((1u64 << width) - 1)
    };
    bits::uint_to_bits(masked, width)
}

impl Environment {
    /// Validates the configuration and every instruction against the widths
    /// it derives.
    pub fn new(configuration: Configuration, instructions: Vec<Instruction>) -> Result<Self> {
        configuration.validate()?;
        if instructions.is_empty() {
            return Err(SimError::InvalidConfiguration("instruction set is empty"));
        }
        let expected_input = configuration.instruction_input_width();
        let expected_output = configuration.instruction_output_width();
        for (index, instruction) in instructions.iter().enumerate() {
            if instruction.input_width() != expected_input
                || instruction.output_width() != expected_output
            {
                return Err(SimError::InstructionWidthMismatch {
                    index,
                    found_input: instruction.input_width(),
                    found_output: instruction.output_width(),
                    expected_input,
                    expected_output,
                });
            }
            if instruction.movements().len() != configuration.dims() {
                return Err(SimError::DimensionMismatch {
                    found: instruction.movements().len(),
                    expected: configuration.dims(),
                });
            }
        }
        let selector_width = bits::bit_width(instructions.len() as u64);
        if selector_width > configuration.data_width {
            return Err(SimError::SelectorWiderThanCellData {
                instructions: instructions.len(),
                selector_width,
                data_width: configuration.data_width,
            });
        }
        debug!(
            extent = %configuration.extent,
            toroidal = configuration.toroidal,
            instructions = instructions.len(),
            input_width = expected_input,
            output_width = expected_output,
            "environment ready"
        );
        Ok(Self {
            configuration: Arc::new(configuration),
            instructions,
            selector_width,
        })
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Step 0 of a run sharing this environment's configuration.
    pub fn initial_state<F>(&self, generator: F) -> Result<State>
    where
        F: FnMut(usize) -> BitString,
    {
        State::initial(self.configuration.clone(), generator)
    }

    /// Instruction selected by the leading bits of a cell.
    fn select(&self, cell: &BitString) -> Result<&Instruction> {
        let selector = bits::bits_to_uint(&bits::slice(cell, 0, self.selector_width)?)?;
        let index = selector % self.instructions.len() as u64;
        // index < instructions.len(), so the conversion is lossless.
        Ok(&self.instructions[index as usize])
    }

    /// Per-location occupancy, encoded once from the pre-step positions.
    fn occupancy_snapshot(&self, state: &State) -> Result<HashMap<Location, BitString>> {
        let width = self.configuration.occupancy_width();
        state
            .occupancy()
            .into_iter()
            .map(|(location, count)| Ok((location, low_bits(count as u64, width)?)))
            .collect()
    }

    /// Advances `state` by one step.
    pub fn step(&self, state: &State) -> Result<State> {
        if !Arc::ptr_eq(&state.configuration, &self.configuration)
            && *state.configuration != *self.configuration
        {
            return Err(SimError::ConfigurationMismatch);
        }
        let cfg = &*self.configuration;
        let occupancy = self.occupancy_snapshot(state)?;
        let unoccupied = BitString::zeros(cfg.occupancy_width());

        let mut individuals = state.individuals.clone();
        let original = individuals.len();
        let mut removed = vec![false; original];
        let mut removals = 0usize;
        let mut newborns: Vec<Individual> = Vec::new();
        let mut writes: Vec<CellWrite> = Vec::with_capacity(original);

        for (order, individual) in individuals.iter_mut().enumerate() {
            let location = individual.location().clone();
            let cell = state
                .data
                .get(&location)
                .ok_or_else(|| SimError::MissingCells(vec![location.clone()]))?;
            let instruction = self.select(cell)?;

            match instruction.continuation() {
                Continuation::Death => {
                    trace!(step = state.step, %individual, "death");
                    removed[order] = true;
                    removals += 1;
                    continue;
                }
                Continuation::Replication => {
                    if original - removals + newborns.len() < cfg.max_population {
                        trace!(step = state.step, %individual, "replication");
                        newborns.push(Individual::newborn(
                            location.clone(),
                            state.step,
                            cfg.memory_width,
                        ));
                    }
                }
                Continuation::None => {}
            }

            let occupants = occupancy.get(&location).unwrap_or(&unoccupied);
            let input = bits::concat(&[cell, occupants, individual.memory()]);
            let output = instruction.apply(&input)?;
            let data = bits::slice(output, 0, cfg.data_width)?;
            let memory = bits::slice(output, cfg.data_width, cfg.memory_width)?;

            writes.push(CellWrite {
                location: location.clone(),
                birth: individual.birth(),
                order,
                data,
            });
            individual.set_memory(memory);
            individual.set_location(location.moved(
                instruction.movements(),
                &cfg.extent,
                cfg.toroidal,
            )?);
        }

        let births = newborns.len();
        let candidates = writes.len();
        let mut data = state.data.clone();
        data.extend(resolve_writes(writes));

        let individuals: Vec<Individual> = individuals
            .into_iter()
            .zip(removed)
            .filter_map(|(individual, dead)| (!dead).then_some(individual))
            .chain(newborns)
            .collect();

        debug!(
            step = state.step + 1,
            population = individuals.len(),
            deaths = removals,
            births,
            writes = candidates,
            "step"
        );

        Ok(State {
            step: state.step + 1,
            data,
            individuals,
            configuration: self.configuration.clone(),
        })
    }
}
