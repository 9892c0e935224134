//! # smpsim
//!
//! A population of tiny self-modifying programs on a discrete grid.
//!
//! Each grid cell holds a few bits of data. Individuals standing on a cell
//! decode an instruction from the cell's leading bits and then die, replicate
//! or carry on, rewrite the cell and their own memory through the
//! instruction's lookup table, and move. One call to [`Environment::step`]
//! advances the whole population synchronously and deterministically.
//!
//! ## Quick Start
//!
//! ```
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use smpsim::prelude::*;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let cfg = Configuration::new(Location::of(&[32, 32])).with_max_population(50);
//! let instructions = Instruction::random_set(&cfg, 8, &mut rng).unwrap();
//! let env = Environment::new(cfg, instructions).unwrap();
//!
//! let mut state = env
//!     .initial_state(|width| random_bits(width, &mut rng))
//!     .unwrap();
//! while !state.is_extinct() && state.step() < 100 {
//!     state = env.step(&state).unwrap();
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): serialization of configurations, instructions,
//!   individuals and run summaries
//!
//! ## Modules
//!
//! - [`bits`]: bit strings and integer conversions
//! - [`location`]: grid coordinates and movement
//! - [`instruction`]: table-driven instructions and their flat encoding
//! - [`individual`]: the simulated agents
//! - [`state`]: run configuration and state snapshots
//! - [`environment`]: the stepping engine
//! - [`observer`]: read-only adapters for renderers and statistics

#[path = "core/error.rs"]
pub mod error;

#[path = "core/bits.rs"]
pub mod bits;

#[path = "core/location.rs"]
pub mod location;

#[path = "core/instruction.rs"]
pub mod instruction;

#[path = "core/individual.rs"]
pub mod individual;

#[path = "core/state.rs"]
pub mod state;

#[path = "core/environment.rs"]
pub mod environment;

pub mod observer;

pub use environment::Environment;
pub use error::{Result, SimError};

/// Prelude module for convenient imports.
///
/// ```
/// use smpsim::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bits::{random_bits, BitString};
    pub use crate::environment::Environment;
    pub use crate::error::SimError;
    pub use crate::individual::Individual;
    pub use crate::instruction::{Continuation, Instruction, Movement};
    pub use crate::location::Location;
    pub use crate::observer::{PlaneView, RunStats, RunSummary};
    pub use crate::state::{Configuration, State};
}
