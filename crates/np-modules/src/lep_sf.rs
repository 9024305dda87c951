//! Per-lepton efficiency scale-factor producer.
//!
//! Resolves one surface file from the data-taking period and run period,
//! loads up to three surfaces (central, stat, syst) once per job, and writes
//! `<Flavour>_<Cut>_SF[stat|syst]` arrays parallel to the lepton collection.

use np_core::branch::{BranchLen, BranchStore, BranchType};
use np_core::error::{Error, Result};
use np_core::event::Event;
use np_core::module::Module;
use np_lookup::{Surface2d, SurfaceFile};
use serde::Deserialize;
use std::path::PathBuf;

/// Data-taking period to candidate file prefixes. The requested run period
/// selects the first prefix whose name contains it.
const MUON_PERIOD_FILES: &[(&str, &[&str])] = &[
    ("2016", &["RunBCDEF_SF_", "RunGH_SF_"]),
    ("2017", &["RunBCDEF_SF_"]),
    ("2018", &["RunABCD_SF_"]),
];

/// Placeholder uncertainty written when no dedicated surface is configured.
const FALLBACK_SF_ERR: f32 = 0.005;

/// Configuration for [`LepSfModule`].
#[derive(Debug, Clone, Deserialize)]
pub struct LepSfConfig {
    /// Lepton collection to correct; also the branch-name prefix.
    #[serde(default = "default_flavour")]
    pub flavour: String,

    /// Selection-cut label; completes the file name and branch names.
    #[serde(default = "default_cut")]
    pub cut: String,

    /// One to three surface names: central, then stat, then syst.
    pub surfaces: Vec<String>,

    /// Fold eta to |eta| before the lookup.
    #[serde(default = "default_true")]
    pub use_abs_eta: bool,

    /// Query surfaces as (pt, eta); `false` swaps the coordinates.
    #[serde(default = "default_true")]
    pub pt_eta_axis: bool,

    /// Data-taking period selecting the candidate file prefixes.
    #[serde(default = "default_period")]
    pub data_period: String,

    /// Run period matched against the candidate prefixes.
    #[serde(default = "default_run_period")]
    pub run_period: String,

    /// Directory holding the scale-factor surface files.
    pub sf_dir: PathBuf,
}

fn default_flavour() -> String {
    "Muon".to_string()
}

fn default_cut() -> String {
    "Trigger".to_string()
}

fn default_true() -> bool {
    true
}

fn default_period() -> String {
    "2016".to_string()
}

fn default_run_period() -> String {
    "B".to_string()
}

impl LepSfConfig {
    /// Muon trigger-efficiency configuration for the standard IsoMu24
    /// tables.
    pub fn muon_trigger(sf_dir: impl Into<PathBuf>) -> Self {
        Self {
            flavour: default_flavour(),
            cut: default_cut(),
            surfaces: vec!["IsoMu24_OR_IsoTkMu24_PtEtaBins/pt_abseta_ratio".to_string()],
            use_abs_eta: true,
            pt_eta_axis: true,
            data_period: default_period(),
            run_period: default_run_period(),
            sf_dir: sf_dir.into(),
        }
    }
}

/// Writes `<Flavour>_<Cut>_SF`, `..._SFstat` and `..._SFsyst` arrays with
/// one entry per lepton in the configured collection.
#[derive(Debug)]
pub struct LepSfModule {
    cfg: LepSfConfig,
    branch_prefix: String,
    sf_file: PathBuf,
    central: Option<Surface2d>,
    stat: Option<Surface2d>,
    syst: Option<Surface2d>,
}

impl LepSfModule {
    /// Resolve the surface file path and validate the configuration.
    ///
    /// An unknown data period, a run period matching no candidate prefix,
    /// or a surface list outside 1..=3 entries is a fatal configuration
    /// error; nothing is read from disk until `begin_job`.
    pub fn new(cfg: LepSfConfig) -> Result<Self> {
        if cfg.surfaces.is_empty() || cfg.surfaces.len() > 3 {
            return Err(Error::Config(format!(
                "expected 1 to 3 surface names (central, stat, syst), got {}",
                cfg.surfaces.len()
            )));
        }
        let prefixes = MUON_PERIOD_FILES
            .iter()
            .find(|(period, _)| *period == cfg.data_period)
            .map(|(_, prefixes)| *prefixes)
            .ok_or_else(|| {
                Error::Config(format!("unknown data period '{}'", cfg.data_period))
            })?;
        let prefix = prefixes
            .iter()
            .find(|prefix| prefix.contains(&cfg.run_period))
            .ok_or_else(|| {
                Error::Config(format!(
                    "no scale-factor file for run period '{}' in data period '{}'",
                    cfg.run_period, cfg.data_period
                ))
            })?;

        let sf_file = cfg.sf_dir.join(format!("{prefix}{}.json", cfg.cut));
        let branch_prefix = format!("{}_{}", cfg.flavour, cfg.cut);
        Ok(Self { cfg, branch_prefix, sf_file, central: None, stat: None, syst: None })
    }

    /// Resolved surface-file path.
    pub fn sf_file(&self) -> &PathBuf {
        &self.sf_file
    }

    fn coords(&self, pt: f32, eta: f32) -> (f64, f64) {
        let eta = if self.cfg.use_abs_eta { eta.abs() } else { eta };
        if self.cfg.pt_eta_axis {
            (f64::from(pt), f64::from(eta))
        } else {
            (f64::from(eta), f64::from(pt))
        }
    }
}

impl Module for LepSfModule {
    fn name(&self) -> &str {
        "lep_sf"
    }

    fn begin_job(&mut self) -> Result<()> {
        tracing::info!(
            "reading {} scale factors from {}",
            self.branch_prefix,
            self.sf_file.display()
        );
        let file = SurfaceFile::open(&self.sf_file)
            .map_err(|e| Error::Config(e.to_string()))?;
        let mut loaded = self
            .cfg
            .surfaces
            .iter()
            .map(|name| {
                file.surface(name).cloned().map_err(|e| Error::Config(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter();
        self.central = loaded.next();
        self.stat = loaded.next();
        self.syst = loaded.next();
        Ok(())
    }

    fn begin_file(&mut self, out: &mut BranchStore) -> Result<()> {
        let len = BranchLen::PerEntry(self.cfg.flavour.clone());
        out.branch(&format!("{}_SF", self.branch_prefix), BranchType::Float, len.clone())?;
        out.branch(&format!("{}_SFstat", self.branch_prefix), BranchType::Float, len.clone())?;
        out.branch(&format!("{}_SFsyst", self.branch_prefix), BranchType::Float, len)?;
        Ok(())
    }

    fn analyze(&mut self, event: &Event, out: &mut BranchStore) -> Result<bool> {
        let central = self.central.as_ref().ok_or_else(|| {
            Error::Config("scale-factor surfaces not loaded; begin_job must run first".into())
        })?;

        let leptons = event.collection(&self.cfg.flavour);
        let mut sf = Vec::with_capacity(leptons.len());
        let mut sf_stat = Vec::with_capacity(leptons.len());
        let mut sf_syst = Vec::with_capacity(leptons.len());
        for lepton in leptons {
            let (x, y) = self.coords(lepton.pt, lepton.eta);
            sf.push(central.value_at(x, y) as f32);
            sf_stat.push(match &self.stat {
                Some(surface) => surface.error_at(x, y) as f32,
                None => FALLBACK_SF_ERR,
            });
            sf_syst.push(match &self.syst {
                Some(surface) => surface.error_at(x, y) as f32,
                None => FALLBACK_SF_ERR,
            });
        }

        out.fill_floats(&format!("{}_SF", self.branch_prefix), sf)?;
        out.fill_floats(&format!("{}_SFstat", self.branch_prefix), sf_stat)?;
        out.fill_floats(&format!("{}_SFsyst", self.branch_prefix), sf_syst)?;
        Ok(true)
    }
}
