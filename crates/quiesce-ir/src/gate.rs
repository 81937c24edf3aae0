//! Gates as they appear on a scheduled timeline.
//!
//! Gates carry no angles. A scheduled timeline only needs to know which
//! operation occupies a lane and for how many lanes; rotation angles and
//! pulse shapes belong to the device's native library.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Built-in gates. Serialized by their lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StandardGate {
    /// Identity.
    #[serde(rename = "id")]
    I,
    /// Pauli-X, a decoupling pulse.
    X,
    /// Pauli-Y, a decoupling pulse.
    Y,
    /// Pauli-Z.
    Z,
    /// Hadamard.
    H,
    /// sqrt(Z).
    S,
    /// Inverse of S.
    Sdg,
    /// sqrt(X).
    SX,
    /// Virtual Z rotation (a frame change, zero length on most devices).
    Rz,
    /// Controlled-X.
    CX,
    /// Controlled-Y.
    CY,
    /// Controlled-Z.
    CZ,
    /// Echoed cross-resonance.
    ECR,
    /// SWAP.
    Swap,
}

impl StandardGate {
    /// Lowercase gate name, as used in calibration tables.
    pub fn name(&self) -> &'static str {
        match self {
            Self::I => "id",
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::H => "h",
            Self::S => "s",
            Self::Sdg => "sdg",
            Self::SX => "sx",
            Self::Rz => "rz",
            Self::CX => "cx",
            Self::CY => "cy",
            Self::CZ => "cz",
            Self::ECR => "ecr",
            Self::Swap => "swap",
        }
    }

    /// Number of lanes the gate occupies.
    pub fn num_qubits(&self) -> usize {
        if self.is_entangling() { 2 } else { 1 }
    }

    /// Whether the gate couples two lanes.
    pub fn is_entangling(&self) -> bool {
        matches!(self, Self::CX | Self::CY | Self::CZ | Self::ECR | Self::Swap)
    }
}

impl fmt::Display for StandardGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a [`Gate`] does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateKind {
    /// A built-in gate.
    Standard(StandardGate),
    /// A device- or user-defined operation that passes treat as a black box.
    Opaque {
        /// Operation name.
        name: String,
        /// Number of lanes it occupies.
        num_qubits: usize,
    },
}

/// Classical condition guarding a gate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassicalCondition {
    /// Classical register name.
    pub register: String,
    /// Value the register must hold for the gate to fire.
    pub value: u64,
}

impl ClassicalCondition {
    pub fn new(register: impl Into<String>, value: u64) -> Self {
        Self {
            register: register.into(),
            value,
        }
    }
}

/// A gate together with its label and classical guard.
///
/// Labels and conditions are carried through every rewrite untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gate {
    /// The operation.
    pub kind: GateKind,
    /// Optional label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Optional classical guard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ClassicalCondition>,
}

impl Gate {
    /// An opaque operation on `num_qubits` lanes.
    pub fn opaque(name: impl Into<String>, num_qubits: usize) -> Self {
        Self::from_kind(GateKind::Opaque {
            name: name.into(),
            num_qubits,
        })
    }

    fn from_kind(kind: GateKind) -> Self {
        Self {
            kind,
            label: None,
            condition: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: ClassicalCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// The built-in gate, if this is one.
    pub fn as_standard(&self) -> Option<StandardGate> {
        match self.kind {
            GateKind::Standard(g) => Some(g),
            GateKind::Opaque { .. } => None,
        }
    }

    pub fn name(&self) -> &str {
        match &self.kind {
            GateKind::Standard(g) => g.name(),
            GateKind::Opaque { name, .. } => name,
        }
    }

    pub fn num_qubits(&self) -> usize {
        match &self.kind {
            GateKind::Standard(g) => g.num_qubits(),
            GateKind::Opaque { num_qubits, .. } => *num_qubits,
        }
    }
}

impl From<StandardGate> for Gate {
    fn from(gate: StandardGate) -> Self {
        Self::from_kind(GateKind::Standard(gate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_follows_entanglement() {
        for gate in [StandardGate::X, StandardGate::Y, StandardGate::Rz] {
            assert_eq!(gate.num_qubits(), 1, "{gate}");
        }
        for gate in [StandardGate::CX, StandardGate::CZ, StandardGate::ECR] {
            assert!(gate.is_entangling());
            assert_eq!(gate.num_qubits(), 2, "{gate}");
        }
    }

    #[test]
    fn test_serde_uses_calibration_names() {
        let names: Vec<String> = [StandardGate::I, StandardGate::SX, StandardGate::ECR]
            .iter()
            .map(|g| serde_json::to_string(g).unwrap())
            .collect();
        assert_eq!(names, vec!["\"id\"", "\"sx\"", "\"ecr\""]);

        let cx: StandardGate = serde_json::from_str("\"cx\"").unwrap();
        assert_eq!(cx, StandardGate::CX);
    }

    #[test]
    fn test_opaque_gate_keeps_guard() {
        let gate = Gate::opaque("meas_fb", 1)
            .with_label("feedback")
            .with_condition(ClassicalCondition::new("c", 1));

        assert_eq!(gate.name(), "meas_fb");
        assert_eq!(gate.as_standard(), None);
        assert_eq!(gate.num_qubits(), 1);
        assert_eq!(gate.label.as_deref(), Some("feedback"));
        assert_eq!(gate.condition.map(|c| c.value), Some(1));
    }
}
