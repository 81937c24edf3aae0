//! Lane and classical bit identifiers.
//!
//! A qubit is one lane of the scheduled timeline: every idle period and
//! every inserted pulse lives on exactly one of them. Lanes are numbered
//! densely from zero, so per-lane tables are plain vectors indexed by
//! [`QubitId::index`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// A timeline lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QubitId(pub u32);

impl QubitId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A classical bit, written by measurements and read by conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClbitId(pub u32);

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl fmt::Display for ClbitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}
