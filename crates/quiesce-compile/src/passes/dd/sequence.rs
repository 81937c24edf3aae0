//! Pulse sequences for each decoupling family.

use std::fmt;

use serde::{Deserialize, Serialize};

use quiesce_ir::StandardGate;

use crate::error::{CompileError, CompileResult};

/// Highest supported concatenation depth for CDD-style families.
///
/// S(8) already holds 87 380 pulses.
pub const MAX_CONCATENATION_ORDER: u32 = 8;

/// A dynamical-decoupling family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DdFamily {
    /// Carr-Purcell-Meiboom-Gill: two Y pulses, quarter/half/quarter spacing.
    Cpmg,
    /// XY4: X Y X Y with a fixed step between pulses.
    Xy4,
    /// Concatenated DD built recursively from XY4.
    Cdd,
    /// Uhrig DD: `order` Y pulses on the sin² schedule.
    Udd,
    /// CDD nested across the lanes that share an entangling gate.
    Ncdd,
    /// UDD nested across the lanes that share an entangling gate.
    Nudd,
}

impl DdFamily {
    /// Short lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            DdFamily::Cpmg => "cpmg",
            DdFamily::Xy4 => "xy4",
            DdFamily::Cdd => "cdd",
            DdFamily::Udd => "udd",
            DdFamily::Ncdd => "ncdd",
            DdFamily::Nudd => "nudd",
        }
    }

    /// Whether the family couples the lanes of an entangling gate.
    pub fn is_nested(&self) -> bool {
        matches!(self, DdFamily::Ncdd | DdFamily::Nudd)
    }

    /// Whether gaps follow the Uhrig schedule instead of equal spacing.
    pub fn is_uhrig(&self) -> bool {
        matches!(self, DdFamily::Udd | DdFamily::Nudd)
    }

    /// Largest order the family accepts.
    pub fn max_order(&self) -> u32 {
        match self {
            DdFamily::Cdd | DdFamily::Ncdd => MAX_CONCATENATION_ORDER,
            _ => u32::MAX,
        }
    }
}

impl fmt::Display for DdFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build the canonical pulse list for `family` at `order`.
///
/// CPMG and XY4 have a fixed shape; `order` only has to be valid.
pub fn build(family: DdFamily, order: u32) -> CompileResult<Vec<StandardGate>> {
    if order < 1 || order > family.max_order() {
        return Err(CompileError::InvalidOrder {
            family: family.name(),
            order,
            min: 1,
            max: family.max_order(),
        });
    }

    let sequence = match family {
        DdFamily::Cpmg => vec![StandardGate::Y; 2],
        DdFamily::Xy4 => xy4().to_vec(),
        DdFamily::Cdd | DdFamily::Ncdd => concatenated(order),
        DdFamily::Udd | DdFamily::Nudd => vec![StandardGate::Y; order as usize],
    };
    Ok(sequence)
}

fn xy4() -> [StandardGate; 4] {
    [
        StandardGate::X,
        StandardGate::Y,
        StandardGate::X,
        StandardGate::Y,
    ]
}

/// S(1) = XYXY, S(k) = X·S(k-1)·Y·S(k-1)·X·S(k-1)·Y·S(k-1).
fn concatenated(order: u32) -> Vec<StandardGate> {
    let mut sequence = xy4().to_vec();
    for _ in 1..order {
        let mut next = Vec::with_capacity(4 * sequence.len() + 4);
        for outer in xy4() {
            next.push(outer);
            next.extend_from_slice(&sequence);
        }
        sequence = next;
    }
    sequence
}
