//! Generator-level W/Z to muon decay classification.
//!
//! Scans the `GenPart` collection for prompt final-state muons and
//! neutrinos, classifies the event as W to mu nu, Z to mu mu or other, and
//! selects the decay muons/neutrino under the bare, pre-FSR and dressed
//! lepton definitions. The pre-FSR muon's position is resolved by walking
//! up the same-flavour radiation chain.

use np_core::branch::{BranchLen, BranchStore, BranchType};
use np_core::error::Result;
use np_core::event::{Event, Particle};
use np_core::flags::{FROM_HARD_PROCESS, IS_LAST_COPY_BEFORE_FSR, IS_PROMPT};
use np_core::module::Module;
use serde::{Deserialize, Serialize};

/// Event type written when the event is neither a W nor a Z candidate.
const VTYPE_OTHER: i32 = -1;

/// Lepton-definition conventions for the selected decay products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeptonDefinition {
    /// Final-state prompt muon, after radiation.
    #[serde(rename = "bare")]
    Bare,
    /// Hard-process muon before final-state radiation.
    #[serde(rename = "preFSR")]
    PreFsr,
    /// Lepton with nearby radiated photons recombined.
    #[serde(rename = "dress")]
    Dressed,
}

impl LeptonDefinition {
    /// All conventions, in output order.
    pub const ALL: [LeptonDefinition; 3] =
        [LeptonDefinition::Bare, LeptonDefinition::PreFsr, LeptonDefinition::Dressed];

    /// Label used in output branch names.
    pub fn label(self) -> &'static str {
        match self {
            LeptonDefinition::Bare => "bare",
            LeptonDefinition::PreFsr => "preFSR",
            LeptonDefinition::Dressed => "dress",
        }
    }
}

/// Configuration for [`GenSelectionModule`].
#[derive(Debug, Clone, Deserialize)]
pub struct GenSelectionConfig {
    /// Conventions to write branches for.
    #[serde(default = "all_definitions")]
    pub definitions: Vec<LeptonDefinition>,

    /// Drop events that are not W to mu nu or Z to mu mu candidates.
    #[serde(default)]
    pub filter_by_decay: bool,
}

fn all_definitions() -> Vec<LeptonDefinition> {
    LeptonDefinition::ALL.to_vec()
}

impl Default for GenSelectionConfig {
    fn default() -> Self {
        Self { definitions: all_definitions(), filter_by_decay: false }
    }
}

/// A selected muon or neutrino: collection index and (pt, eta, phi).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pick {
    /// Index into the source collection, or -1 when absent.
    pub idx: i32,
    /// (pt, eta, phi), zeros when absent.
    pub p3: [f32; 3],
}

impl Pick {
    /// No candidate found.
    pub const NONE: Pick = Pick { idx: -1, p3: [0.0; 3] };

    fn from_particle(idx: usize, particle: &Particle) -> Self {
        Pick { idx: idx as i32, p3: [particle.pt, particle.eta, particle.phi] }
    }

    fn from_index(particles: &[Particle], idx: usize) -> Self {
        Pick::from_particle(idx, &particles[idx])
    }
}

impl Default for Pick {
    fn default() -> Self {
        Pick::NONE
    }
}

/// The two selected muons of one lepton-definition convention.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MuonPair {
    /// For Z events the mu+ (pdgId -13); for W events the only muon.
    pub mu1: Pick,
    /// For Z events the mu- (pdgId +13); absent for W events.
    pub mu2: Pick,
}

/// Per-event classification result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecaySelection {
    /// Signed event type: the leading neutrino's pdgId for W-like events,
    /// 13 for Z to mu mu, -1 otherwise.
    pub vtype: i32,
    /// Bare-muon selection.
    pub bare: MuonPair,
    /// Pre-FSR selection, resolved through the radiation chain.
    pub pre_fsr: MuonPair,
    /// Dressed-lepton selection.
    pub dressed: MuonPair,
    /// Leading prompt neutrino.
    pub nu: Pick,
}

impl Default for DecaySelection {
    fn default() -> Self {
        Self {
            vtype: VTYPE_OTHER,
            bare: MuonPair::default(),
            pre_fsr: MuonPair::default(),
            dressed: MuonPair::default(),
            nu: Pick::NONE,
        }
    }
}

impl DecaySelection {
    /// Whether the event is a W to mu nu or Z to mu mu candidate.
    pub fn is_muon_decay(&self) -> bool {
        matches!(self.vtype.abs(), 13 | 14)
    }

    /// The muon pair selected under `definition`.
    pub fn pair(&self, definition: LeptonDefinition) -> &MuonPair {
        match definition {
            LeptonDefinition::Bare => &self.bare,
            LeptonDefinition::PreFsr => &self.pre_fsr,
            LeptonDefinition::Dressed => &self.dressed,
        }
    }
}

/// Highest-pt candidate; the first one in scan order wins ties.
fn leading<'a>(
    candidates: impl IntoIterator<Item = (usize, &'a Particle)>,
) -> Option<(usize, &'a Particle)> {
    let mut best: Option<(usize, &'a Particle)> = None;
    for candidate in candidates {
        match best {
            Some(current) if candidate.1.pt <= current.1.pt => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Leading-pt mu+ (pdgId -13) and mu- (pdgId +13), if both charges are
/// present among the candidates.
fn leading_pair<'a>(
    candidates: &[(usize, &'a Particle)],
) -> Option<((usize, &'a Particle), (usize, &'a Particle))> {
    let plus = leading(candidates.iter().copied().filter(|(_, p)| p.pdg_id == -13));
    let minus = leading(candidates.iter().copied().filter(|(_, p)| p.pdg_id == 13));
    match (plus, minus) {
        (Some(plus), Some(minus)) => Some((plus, minus)),
        _ => None,
    }
}

/// Walk up the same-flavour radiation chain from `start`.
///
/// Follows mother links while the mother carries the same signed pdgId and
/// returns the first ancestor flagged as last copy before FSR. Without such
/// an ancestor (or when the starting particle has no valid mother) the
/// starting index is returned. Mother indices outside the collection end
/// the walk like an invalid mother.
pub fn last_before_fsr(particles: &[Particle], start: usize) -> usize {
    let Some(mut current) = particles.get(start) else {
        return start;
    };
    if current.mother_idx <= 0 {
        return start;
    }
    loop {
        let mother_idx = current.mother_idx;
        if mother_idx < 0 {
            return start;
        }
        let Some(mother) = particles.get(mother_idx as usize) else {
            return start;
        };
        if mother.pdg_id != current.pdg_id {
            return start;
        }
        if mother.has_flag(IS_LAST_COPY_BEFORE_FSR) {
            return mother_idx as usize;
        }
        current = mother;
    }
}

/// Classify one event and select muons/neutrino under every convention.
///
/// Pure per-event computation; the module wraps it into branch writes.
pub fn classify(gen_particles: &[Particle], dressed_leptons: &[Particle]) -> DecaySelection {
    let mut selection = DecaySelection::default();

    // prompt final-state candidates
    let mut neutrinos: Vec<(usize, &Particle)> = Vec::new();
    let mut bare_muons: Vec<(usize, &Particle)> = Vec::new();
    let mut pre_fsr_muons: Vec<(usize, &Particle)> = Vec::new();
    for (i, g) in gen_particles.iter().enumerate() {
        if !(g.has_flag(IS_PROMPT) && g.status == 1) {
            continue;
        }
        if g.pdg_id.abs() == 13 {
            bare_muons.push((i, g));
            if g.has_flag(FROM_HARD_PROCESS) {
                pre_fsr_muons.push((i, g));
            }
        }
        // any neutrino flavour counts
        if matches!(g.pdg_id.abs(), 12 | 14 | 16) {
            neutrinos.push((i, g));
        }
    }

    // W to mu nu: the highest-pt neutrino sets the event type
    if let Some((nu_idx, nu)) = leading(neutrinos.iter().copied()) {
        selection.vtype = nu.pdg_id;
        selection.nu = Pick::from_particle(nu_idx, nu);
        match leading(bare_muons.iter().copied()) {
            Some((mu_idx, mu)) => selection.bare.mu1 = Pick::from_particle(mu_idx, mu),
            None => tracing::debug!("event has a prompt neutrino but no bare muon"),
        }
    // Z to mu mu: two bare muons of opposite sign
    } else if bare_muons.len() > 1 {
        if let Some((plus, minus)) = leading_pair(&bare_muons) {
            selection.bare.mu1 = Pick::from_particle(plus.0, plus.1);
            selection.bare.mu2 = Pick::from_particle(minus.0, minus.1);
            selection.vtype = 13;
        }
    }

    // not a W to mu nu or Z to mu mu candidate: only the event type survives
    if !selection.is_muon_decay() {
        return DecaySelection { vtype: selection.vtype, ..DecaySelection::default() };
    }

    // pre-FSR selection, resolved through the radiation chain
    if selection.vtype.abs() == 14 {
        match leading(pre_fsr_muons.iter().copied()) {
            Some((idx, _)) => {
                let resolved = last_before_fsr(gen_particles, idx);
                selection.pre_fsr.mu1 = Pick::from_index(gen_particles, resolved);
            }
            None => tracing::debug!("W-type event without a hard-process muon"),
        }
    } else if pre_fsr_muons.len() < 2 {
        tracing::debug!("Z-type event with fewer than two hard-process muons");
    } else if let Some((plus, minus)) = leading_pair(&pre_fsr_muons) {
        let i1 = last_before_fsr(gen_particles, plus.0);
        let i2 = last_before_fsr(gen_particles, minus.0);
        selection.pre_fsr.mu1 = Pick::from_index(gen_particles, i1);
        selection.pre_fsr.mu2 = Pick::from_index(gen_particles, i2);
    }

    // dressed selection from the dedicated collection
    let dressed_muons: Vec<(usize, &Particle)> = dressed_leptons
        .iter()
        .enumerate()
        .filter(|(_, l)| l.pdg_id.abs() == 13)
        .collect();
    if selection.vtype.abs() == 14 {
        match leading(dressed_muons.iter().copied()) {
            Some((idx, mu)) => selection.dressed.mu1 = Pick::from_particle(idx, mu),
            None => tracing::debug!("W-type event without a dressed muon"),
        }
    } else if dressed_muons.len() < 2 {
        tracing::debug!("Z-type event with fewer than two dressed muons");
    } else if let Some((plus, minus)) = leading_pair(&dressed_muons) {
        selection.dressed.mu1 = Pick::from_particle(plus.0, plus.1);
        selection.dressed.mu2 = Pick::from_particle(minus.0, minus.1);
    }

    selection
}

/// Writes `genVtype`, the per-convention muon indices/vectors and the
/// neutrino index/vector for every event.
pub struct GenSelectionModule {
    cfg: GenSelectionConfig,
}

impl GenSelectionModule {
    /// Create the module.
    pub fn new(cfg: GenSelectionConfig) -> Self {
        Self { cfg }
    }
}

impl Default for GenSelectionModule {
    fn default() -> Self {
        Self::new(GenSelectionConfig::default())
    }
}

impl Module for GenSelectionModule {
    fn name(&self) -> &str {
        "gen_selection"
    }

    fn begin_file(&mut self, out: &mut BranchStore) -> Result<()> {
        out.branch("genVtype", BranchType::Int, BranchLen::Scalar)?;
        for definition in &self.cfg.definitions {
            let t = definition.label();
            out.branch(&format!("Idx_{t}_mu1"), BranchType::Int, BranchLen::Scalar)?;
            out.branch(&format!("Idx_{t}_mu2"), BranchType::Int, BranchLen::Scalar)?;
            out.branch(&format!("GenMu1_{t}"), BranchType::Float, BranchLen::Fixed(3))?;
            out.branch(&format!("GenMu2_{t}"), BranchType::Float, BranchLen::Fixed(3))?;
        }
        out.branch("GenNu", BranchType::Float, BranchLen::Fixed(3))?;
        out.branch("Idx_nu", BranchType::Int, BranchLen::Scalar)?;
        Ok(())
    }

    fn analyze(&mut self, event: &Event, out: &mut BranchStore) -> Result<bool> {
        let selection =
            classify(event.collection("GenPart"), event.collection("GenDressedLepton"));

        out.fill_int("genVtype", selection.vtype)?;
        for definition in &self.cfg.definitions {
            let t = definition.label();
            let pair = selection.pair(*definition);
            out.fill_int(&format!("Idx_{t}_mu1"), pair.mu1.idx)?;
            out.fill_int(&format!("Idx_{t}_mu2"), pair.mu2.idx)?;
            out.fill_floats(&format!("GenMu1_{t}"), pair.mu1.p3.to_vec())?;
            out.fill_floats(&format!("GenMu2_{t}"), pair.mu2.p3.to_vec())?;
        }
        out.fill_floats("GenNu", selection.nu.p3.to_vec())?;
        out.fill_int("Idx_nu", selection.nu.idx)?;

        Ok(selection.is_muon_decay() || !self.cfg.filter_by_decay)
    }
}
