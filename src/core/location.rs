use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::instruction::Movement;

/// A point of an n-dimensional grid.
///
/// The same type doubles as a grid extent: a bound `b` admits every location
/// `l` with `0 <= l[i] < b[i]` on each dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Location(Vec<usize>);

impl Location {
    pub fn new(coords: Vec<usize>) -> Self {
        Self(coords)
    }

    pub fn of(coords: &[usize]) -> Self {
        Self(coords.to_vec())
    }

    pub fn origin(dims: usize) -> Self {
        Self(vec![0; dims])
    }

    #[inline]
    pub fn dims(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn coords(&self) -> &[usize] {
        &self.0
    }

    fn check_dims(&self, other: &Location) -> Result<()> {
        if self.dims() != other.dims() {
            return Err(SimError::DimensionMismatch {
                found: self.dims(),
                expected: other.dims(),
            });
        }
        Ok(())
    }

    pub fn is_within(&self, bound: &Location) -> Result<bool> {
        self.check_dims(bound)?;
        Ok(self.0.iter().zip(&bound.0).all(|(c, b)| c < b))
    }

    /// Coordinate-wise half, i.e. the center of the grid this location bounds.
    pub fn center(&self) -> Location {
        Self(self.0.iter().map(|c| c / 2).collect())
    }

    /// Number of locations within this bound.
    pub fn cell_count(&self) -> usize {
        self.0.iter().product()
    }

    /// Every location within this bound, first dimension varying fastest.
    pub fn bounded_locations(&self) -> BoundedLocations {
        let first = Location::origin(self.dims());
        let empty = self.0.iter().any(|b| *b == 0);
        BoundedLocations {
            bound: self.clone(),
            next: (!empty).then_some(first),
        }
    }

    /// Applies one movement per dimension, then clamps into `bound` or wraps
    /// around it when `toroidal`.
    pub fn moved(&self, movements: &[Movement], bound: &Location, toroidal: bool) -> Result<Location> {
        self.check_dims(bound)?;
        if movements.len() != self.dims() {
            return Err(SimError::DimensionMismatch {
                found: movements.len(),
                expected: self.dims(),
            });
        }
        let coords = self
            .0
            .iter()
            .zip(&bound.0)
            .zip(movements)
            .map(|((&c, &b), m)| match m {
                Movement::Stay => fit(Some(c), b, toroidal),
                Movement::Decrease => fit(c.checked_sub(1), b, toroidal),
                Movement::Increase => fit(c.checked_add(1), b, toroidal),
            })
            .collect();
        Ok(Self(coords))
    }
}

/// `None` stands for a coordinate that went below zero.
fn fit(coord: Option<usize>, bound: usize, toroidal: bool) -> usize {
    let last = bound.saturating_sub(1);
    match coord {
        None => {
            if toroidal {
                last
            } else {
                0
            }
        }
        Some(c) if c >= bound => {
            if toroidal {
                0
            } else {
                last
            }
        }
        Some(c) => c,
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{c}")?;
        }
        f.write_str(")")
    }
}

/// Iterator returned by [`Location::bounded_locations`]; clone it to iterate again.
#[derive(Debug, Clone)]
pub struct BoundedLocations {
    bound: Location,
    next: Option<Location>,
}

impl Iterator for BoundedLocations {
    type Item = Location;

    fn next(&mut self) -> Option<Location> {
        let current = self.next.take()?;
        let mut coords = current.0.clone();
        for (c, b) in coords.iter_mut().zip(&self.bound.0) {
            *c += 1;
            if *c < *b {
                self.next = Some(Location(coords));
                return Some(current);
            }
            *c = 0;
        }
        Some(current)
    }
}
