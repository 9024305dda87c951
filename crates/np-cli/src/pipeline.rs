//! `nanopost run` orchestration: pipeline spec to modules to output rows.

use anyhow::{Context, Result};
use np_core::event::Event;
use np_core::module::{run_modules, Module};
use np_modules::{GenSelectionConfig, GenSelectionModule, LepSfConfig, LepSfModule};
use serde::Deserialize;
use std::path::Path;

/// A module pipeline: modules run in spec order on every event.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSpec {
    /// Modules to run, in order.
    pub modules: Vec<ModuleSpec>,
}

/// One module entry in a pipeline spec.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModuleSpec {
    /// Per-lepton efficiency scale factors.
    LepSf(LepSfConfig),
    /// Generator-level W/Z decay classification.
    GenSelection(GenSelectionConfig),
}

#[derive(Debug, Clone, Deserialize)]
struct EventsFile {
    events: Vec<Event>,
}

pub fn read_pipeline_spec(path: &Path) -> Result<PipelineSpec> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("reading pipeline spec {}", path.display()))?;
    let spec = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing pipeline spec {}", path.display()))?;
    Ok(spec)
}

fn build_modules(spec: &PipelineSpec) -> Result<Vec<Box<dyn Module>>> {
    spec.modules
        .iter()
        .map(|module| -> Result<Box<dyn Module>> {
            Ok(match module {
                ModuleSpec::LepSf(cfg) => Box::new(LepSfModule::new(cfg.clone())?),
                ModuleSpec::GenSelection(cfg) => {
                    Box::new(GenSelectionModule::new(cfg.clone()))
                }
            })
        })
        .collect()
}

pub fn cmd_run(spec_path: &Path, input: &Path, output: Option<&Path>) -> Result<()> {
    let spec = read_pipeline_spec(spec_path)?;
    let mut modules = build_modules(&spec)?;

    let bytes = std::fs::read(input)
        .with_context(|| format!("reading events file {}", input.display()))?;
    let events: EventsFile = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing events file {}", input.display()))?;

    tracing::info!(
        n_modules = modules.len(),
        n_events = events.events.len(),
        "starting event loop"
    );
    let rows = run_modules(&mut modules, &events.events)?;
    tracing::info!(kept = rows.len(), total = events.events.len(), "event loop finished");

    let json = serde_json::to_string_pretty(&rows)?;
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("writing output {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}
