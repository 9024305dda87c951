//! Per-event particle collections.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One entry of a NanoAOD particle collection.
///
/// Reconstructed-lepton collections carry only kinematics; the generator
/// fields default so both record shapes deserialize into the same type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Transverse momentum (GeV).
    pub pt: f32,

    /// Pseudorapidity.
    #[serde(default)]
    pub eta: f32,

    /// Azimuthal angle.
    #[serde(default)]
    pub phi: f32,

    /// Signed PDG particle-type code (13 = mu-, -13 = mu+, 14 = nu_mu).
    #[serde(default, rename = "pdgId")]
    pub pdg_id: i32,

    /// Generator status code (1 = final state).
    #[serde(default)]
    pub status: i32,

    /// Generator status-flag bitmask, see [`crate::flags`].
    #[serde(default, rename = "statusFlags")]
    pub status_flags: u32,

    /// Index of the mother particle in the same collection; negative when
    /// there is no mother.
    #[serde(default = "no_mother", rename = "motherIdx")]
    pub mother_idx: i32,
}

fn no_mother() -> i32 {
    -1
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            pt: 0.0,
            eta: 0.0,
            phi: 0.0,
            pdg_id: 0,
            status: 0,
            status_flags: 0,
            mother_idx: -1,
        }
    }
}

impl Particle {
    /// Whether any of the `mask` bits are set in the status flags.
    pub fn has_flag(&self, mask: u32) -> bool {
        self.status_flags & mask != 0
    }
}

/// One event: named, ordered, read-only particle collections.
///
/// Collections a module asks for but the event does not carry resolve to an
/// empty slice; modules treat that the same as zero candidates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event {
    collections: HashMap<String, Vec<Particle>>,
}

impl Event {
    /// Create an empty event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named collection (builder style).
    pub fn with_collection(
        mut self,
        name: impl Into<String>,
        particles: Vec<Particle>,
    ) -> Self {
        self.collections.insert(name.into(), particles);
        self
    }

    /// The particles of a named collection, in input order.
    pub fn collection(&self, name: &str) -> &[Particle] {
        self.collections.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}
