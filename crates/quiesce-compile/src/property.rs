//! Data shared between passes.
//!
//! The device [`Calibration`] has a dedicated slot because the decoupling
//! pass cannot run without it. Anything else, such as the
//! [`DdSummary`](crate::passes::dd::DdSummary) the decoupling pass leaves
//! behind, is stored by type.
//!
//! # Examples
//!
//! ```
//! use quiesce_compile::{Calibration, PropertySet};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct IdleBudget(u64);
//!
//! let mut props = PropertySet::new()
//!     .with_calibration(Calibration::uniform(2, 1e-9, [("x", 50e-9)]));
//! props.insert(IdleBudget(4000));
//!
//! assert!(props.calibration.is_some());
//! assert_eq!(props.get::<IdleBudget>(), Some(&IdleBudget(4000)));
//! ```

use std::any::{Any, TypeId};

use rustc_hash::FxHashMap;

use crate::calibration::Calibration;

type Slot = Box<dyn Any + Send + Sync>;

/// Properties shared between passes.
#[derive(Debug, Default)]
pub struct PropertySet {
    /// Gate lengths of the target device.
    pub calibration: Option<Calibration>,
    by_type: FxHashMap<TypeId, Slot>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = Some(calibration);
        self
    }

    /// Store `value`, returning the value of the same type it replaces.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.by_type
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(unbox)
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.by_type.get(&TypeId::of::<T>())?.downcast_ref()
    }

    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.by_type.get_mut(&TypeId::of::<T>())?.downcast_mut()
    }

    pub fn remove<T: Any>(&mut self) -> Option<T> {
        self.by_type.remove(&TypeId::of::<T>()).and_then(unbox)
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }
}

fn unbox<T: Any>(slot: Slot) -> Option<T> {
    slot.downcast().ok().map(|v| *v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Rewrites(usize);

    #[test]
    fn test_typed_slots() {
        let mut props = PropertySet::new();
        assert!(!props.contains::<Rewrites>());

        assert_eq!(props.insert(Rewrites(1)), None);
        assert_eq!(props.insert(Rewrites(2)), Some(Rewrites(1)));

        if let Some(r) = props.get_mut::<Rewrites>() {
            r.0 += 1;
        }
        assert_eq!(props.remove::<Rewrites>(), Some(Rewrites(3)));
        assert_eq!(props.get::<Rewrites>(), None);
    }

    #[test]
    fn test_with_calibration() {
        let props = PropertySet::new().with_calibration(Calibration::new(1e-9));
        assert_eq!(props.calibration.map(|c| c.dt_in_sec()), Some(1e-9));
    }
}
