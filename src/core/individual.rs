use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bits::BitString;
use crate::location::Location;

/// A program instance living on the grid.
///
/// `birth` is the step at which the individual appeared; it never changes and
/// only serves to break ties between concurrent writes to one cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Individual {
    birth: u64,
    location: Location,
    memory: BitString,
}

impl Individual {
    pub fn new(location: Location, birth: u64, memory: BitString) -> Self {
        Self {
            birth,
            location,
            memory,
        }
    }

    /// A newborn: zero memory of the given width.
    pub fn newborn(location: Location, birth: u64, memory_width: usize) -> Self {
        Self::new(location, birth, BitString::zeros(memory_width))
    }

    #[inline]
    pub fn birth(&self) -> u64 {
        self.birth
    }

    #[inline]
    pub fn location(&self) -> &Location {
        &self.location
    }

    #[inline]
    pub fn memory(&self) -> &BitString {
        &self.memory
    }

    pub fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    pub fn set_memory(&mut self, memory: BitString) {
        self.memory = memory;
    }
}

impl fmt::Display for Individual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{};{};{}}}", self.location, self.birth, self.memory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newborn_has_zero_memory() {
        let i = Individual::newborn(Location::of(&[1, 2]), 7, 3);
        assert_eq!(i.birth(), 7);
        assert_eq!(i.memory(), &BitString::zeros(3));
        assert_eq!(i.to_string(), "{(1;2);7;000}");
    }

    #[test]
    fn location_and_memory_are_mutable() {
        let mut i = Individual::newborn(Location::of(&[0]), 0, 2);
        i.set_location(Location::of(&[3]));
        i.set_memory("10".parse().unwrap());
        assert_eq!(i.location(), &Location::of(&[3]));
        assert_eq!(i.memory().to_string(), "10");
        assert_eq!(i.birth(), 0);
    }
}
