//! Output branch declaration and filling.
//!
//! Branches are declared once per file (name, scalar type, length) and
//! filled exactly once per kept event. [`BranchStore::take_row`] checks that
//! every declared branch was filled and that variable-length branches match
//! their reference collection, then drains the values into a [`Row`].

use crate::error::{Error, Result};
use crate::event::Event;
use serde::Serialize;
use std::collections::BTreeMap;

/// Scalar type of an output branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchType {
    /// 32-bit signed integer ("I").
    Int,
    /// 32-bit float ("F").
    Float,
}

/// Declared length of an output branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchLen {
    /// One value per event.
    Scalar,
    /// Fixed number of values per event.
    Fixed(usize),
    /// One value per entry of the named collection.
    PerEntry(String),
}

/// A filled branch value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BranchValue {
    /// Integer scalar.
    Int(i32),
    /// Integer sequence.
    Ints(Vec<i32>),
    /// Float scalar.
    Float(f32),
    /// Float sequence.
    Floats(Vec<f32>),
}

impl BranchValue {
    /// Sequence length, `None` for scalars.
    fn seq_len(&self) -> Option<usize> {
        match self {
            BranchValue::Ints(v) => Some(v.len()),
            BranchValue::Floats(v) => Some(v.len()),
            _ => None,
        }
    }
}

/// One output row: branch name to filled value, in stable (sorted) order.
pub type Row = BTreeMap<String, BranchValue>;

#[derive(Debug)]
struct BranchDef {
    ty: BranchType,
    len: BranchLen,
}

/// Per-file output store shared by all modules of a pipeline.
#[derive(Debug, Default)]
pub struct BranchStore {
    defs: BTreeMap<String, BranchDef>,
    values: BTreeMap<String, BranchValue>,
}

impl BranchStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an output branch. Redeclaring a name is an error.
    pub fn branch(&mut self, name: &str, ty: BranchType, len: BranchLen) -> Result<()> {
        if self.defs.contains_key(name) {
            return Err(Error::Branch(format!("branch '{name}' declared twice")));
        }
        self.defs.insert(name.to_string(), BranchDef { ty, len });
        Ok(())
    }

    /// Fill an integer scalar branch.
    pub fn fill_int(&mut self, name: &str, value: i32) -> Result<()> {
        self.fill(name, BranchValue::Int(value))
    }

    /// Fill an integer sequence branch.
    pub fn fill_ints(&mut self, name: &str, values: Vec<i32>) -> Result<()> {
        self.fill(name, BranchValue::Ints(values))
    }

    /// Fill a float scalar branch.
    pub fn fill_float(&mut self, name: &str, value: f32) -> Result<()> {
        self.fill(name, BranchValue::Float(value))
    }

    /// Fill a float sequence branch.
    pub fn fill_floats(&mut self, name: &str, values: Vec<f32>) -> Result<()> {
        self.fill(name, BranchValue::Floats(values))
    }

    fn fill(&mut self, name: &str, value: BranchValue) -> Result<()> {
        let def = self
            .defs
            .get(name)
            .ok_or_else(|| Error::Branch(format!("branch '{name}' was not declared")))?;
        if self.values.contains_key(name) {
            return Err(Error::Branch(format!("branch '{name}' filled twice in one event")));
        }
        let shape_ok = match (&def.len, def.ty, &value) {
            (BranchLen::Scalar, BranchType::Int, BranchValue::Int(_)) => true,
            (BranchLen::Scalar, BranchType::Float, BranchValue::Float(_)) => true,
            (BranchLen::Fixed(n), BranchType::Int, BranchValue::Ints(v)) => v.len() == *n,
            (BranchLen::Fixed(n), BranchType::Float, BranchValue::Floats(v)) => v.len() == *n,
            (BranchLen::PerEntry(_), BranchType::Int, BranchValue::Ints(_)) => true,
            (BranchLen::PerEntry(_), BranchType::Float, BranchValue::Floats(_)) => true,
            _ => false,
        };
        if !shape_ok {
            return Err(Error::Branch(format!(
                "branch '{name}': value does not match the declared type or length"
            )));
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Validate and drain the current event's values.
    ///
    /// Every declared branch must have been filled; branches declared
    /// per-entry must match the length of their reference collection in
    /// `event`.
    pub fn take_row(&mut self, event: &Event) -> Result<Row> {
        for (name, def) in &self.defs {
            let value = self.values.get(name).ok_or_else(|| {
                Error::Branch(format!("branch '{name}' not filled for this event"))
            })?;
            if let BranchLen::PerEntry(coll) = &def.len {
                let expected = event.collection(coll).len();
                let got = value.seq_len().unwrap_or(0);
                if got != expected {
                    return Err(Error::Branch(format!(
                        "branch '{name}': {got} values for {expected} entries of '{coll}'"
                    )));
                }
            }
        }
        Ok(std::mem::take(&mut self.values))
    }

    /// Discard any values filled for the current event (rejected event).
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Particle;

    fn event_with_muons(n: usize) -> Event {
        Event::new().with_collection("Muon", vec![Particle::default(); n])
    }

    #[test]
    fn declare_fill_take() {
        let mut store = BranchStore::new();
        store.branch("genVtype", BranchType::Int, BranchLen::Scalar).unwrap();
        store.branch("GenNu", BranchType::Float, BranchLen::Fixed(3)).unwrap();
        store
            .branch("Muon_Trigger_SF", BranchType::Float, BranchLen::PerEntry("Muon".into()))
            .unwrap();

        store.fill_int("genVtype", -14).unwrap();
        store.fill_floats("GenNu", vec![40.0, 0.1, 1.0]).unwrap();
        store.fill_floats("Muon_Trigger_SF", vec![0.98, 1.01]).unwrap();

        let row = store.take_row(&event_with_muons(2)).unwrap();
        assert_eq!(row.len(), 3);
        assert_eq!(row["genVtype"], BranchValue::Int(-14));

        // the store is ready for the next event
        assert!(store.take_row(&event_with_muons(2)).is_err());
    }

    #[test]
    fn duplicate_declaration_rejected() {
        let mut store = BranchStore::new();
        store.branch("x", BranchType::Int, BranchLen::Scalar).unwrap();
        assert!(store.branch("x", BranchType::Float, BranchLen::Scalar).is_err());
    }

    #[test]
    fn fill_undeclared_rejected() {
        let mut store = BranchStore::new();
        assert!(store.fill_int("nope", 1).is_err());
    }

    #[test]
    fn fill_twice_rejected() {
        let mut store = BranchStore::new();
        store.branch("x", BranchType::Int, BranchLen::Scalar).unwrap();
        store.fill_int("x", 1).unwrap();
        assert!(store.fill_int("x", 2).is_err());
    }

    #[test]
    fn type_and_length_checked() {
        let mut store = BranchStore::new();
        store.branch("i", BranchType::Int, BranchLen::Scalar).unwrap();
        store.branch("v3", BranchType::Float, BranchLen::Fixed(3)).unwrap();
        assert!(store.fill_float("i", 1.0).is_err());
        assert!(store.fill_floats("v3", vec![0.0; 2]).is_err());
    }

    #[test]
    fn missing_fill_detected() {
        let mut store = BranchStore::new();
        store.branch("a", BranchType::Int, BranchLen::Scalar).unwrap();
        store.branch("b", BranchType::Int, BranchLen::Scalar).unwrap();
        store.fill_int("a", 1).unwrap();
        assert!(store.take_row(&Event::new()).is_err());
    }

    #[test]
    fn per_entry_length_checked_against_event() {
        let mut store = BranchStore::new();
        store
            .branch("Muon_Trigger_SF", BranchType::Float, BranchLen::PerEntry("Muon".into()))
            .unwrap();
        store.fill_floats("Muon_Trigger_SF", vec![1.0; 3]).unwrap();
        assert!(store.take_row(&event_with_muons(2)).is_err());
    }

    #[test]
    fn clear_drops_partial_event() {
        let mut store = BranchStore::new();
        store.branch("a", BranchType::Int, BranchLen::Scalar).unwrap();
        store.fill_int("a", 1).unwrap();
        store.clear();
        store.fill_int("a", 2).unwrap();
        let row = store.take_row(&Event::new()).unwrap();
        assert_eq!(row["a"], BranchValue::Int(2));
    }
}
