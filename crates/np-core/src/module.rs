//! Plugin lifecycle contract and the event-loop driver.

use crate::branch::{BranchStore, Row};
use crate::error::Result;
use crate::event::Event;

/// An event-processing plugin.
///
/// The driver owns the invocation order: `begin_job`, `begin_file`, one
/// `analyze` call per event, `end_file`, `end_job`. Branches are declared
/// during `begin_file` and must be filled on every `analyze` call that keeps
/// the event.
pub trait Module {
    /// Module name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Called once before any file is processed. Load job-lifetime
    /// resources (lookup tables) here.
    fn begin_job(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once per input file; declare output branches here.
    fn begin_file(&mut self, out: &mut BranchStore) -> Result<()>;

    /// Process one event. Returning `false` drops the event: later modules
    /// are skipped and nothing is written.
    fn analyze(&mut self, event: &Event, out: &mut BranchStore) -> Result<bool>;

    /// Called once per input file after the last event.
    fn end_file(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once after all files.
    fn end_job(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Drive `modules` over `events` in lifecycle order.
///
/// Returns one output row per kept event. A module rejecting an event
/// discards any branches already filled for it; for kept events every
/// declared branch must have been filled exactly once.
pub fn run_modules(modules: &mut [Box<dyn Module>], events: &[Event]) -> Result<Vec<Row>> {
    let mut out = BranchStore::new();
    for module in modules.iter_mut() {
        module.begin_job()?;
    }
    for module in modules.iter_mut() {
        module.begin_file(&mut out)?;
    }

    let mut rows = Vec::new();
    'events: for event in events {
        for module in modules.iter_mut() {
            if !module.analyze(event, &mut out)? {
                out.clear();
                continue 'events;
            }
        }
        rows.push(out.take_row(event)?);
    }

    for module in modules.iter_mut() {
        module.end_file()?;
    }
    for module in modules.iter_mut() {
        module.end_job()?;
    }
    Ok(rows)
}
