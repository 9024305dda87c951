//! Integration tests: scale-factor lookup against fixture surface files.

use approx::assert_relative_eq;
use np_core::branch::{BranchStore, BranchValue, Row};
use np_core::module::{run_modules, Module};
use np_core::{Event, Particle};
use np_modules::{GenSelectionModule, LepSfConfig, LepSfModule};
use std::path::PathBuf;

const CENTRAL: &str = "IsoMu24_OR_IsoTkMu24_PtEtaBins/pt_abseta_ratio";

fn sf_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn config(surfaces: &[&str]) -> LepSfConfig {
    LepSfConfig {
        surfaces: surfaces.iter().map(|s| s.to_string()).collect(),
        ..LepSfConfig::muon_trigger(sf_dir())
    }
}

fn muon(pt: f32, eta: f32) -> Particle {
    Particle { pt, eta, ..Default::default() }
}

fn run_sf(cfg: LepSfConfig, muons: Vec<Particle>) -> Row {
    let event = Event::new().with_collection("Muon", muons);
    let mut modules: Vec<Box<dyn Module>> = vec![Box::new(LepSfModule::new(cfg).unwrap())];
    let mut rows = run_modules(&mut modules, &[event]).unwrap();
    rows.pop().unwrap()
}

fn floats(row: &Row, name: &str) -> Vec<f32> {
    match &row[name] {
        BranchValue::Floats(v) => v.clone(),
        other => panic!("branch {name} is not a float sequence: {other:?}"),
    }
}

#[test]
fn single_surface_uses_placeholder_errors() {
    let row = run_sf(config(&[CENTRAL]), vec![muon(30.0, 1.0), muon(80.0, 2.0)]);

    let sf = floats(&row, "Muon_Trigger_SF");
    assert_relative_eq!(sf[0], 0.91, max_relative = 1e-6);
    assert_relative_eq!(sf[1], 0.96, max_relative = 1e-6);
    assert_eq!(floats(&row, "Muon_Trigger_SFstat"), vec![0.005; 2]);
    assert_eq!(floats(&row, "Muon_Trigger_SFsyst"), vec![0.005; 2]);
}

#[test]
fn two_surfaces_take_stat_from_the_second() {
    let stat = format!("{CENTRAL}_stat");
    let row = run_sf(config(&[CENTRAL, stat.as_str()]), vec![muon(30.0, 1.0)]);
    assert_relative_eq!(floats(&row, "Muon_Trigger_SFstat")[0], 0.001, max_relative = 1e-6);
    assert_eq!(floats(&row, "Muon_Trigger_SFsyst"), vec![0.005]);
}

#[test]
fn three_surfaces_fill_both_uncertainties() {
    let stat = format!("{CENTRAL}_stat");
    let syst = format!("{CENTRAL}_syst");
    let row = run_sf(
        config(&[CENTRAL, stat.as_str(), syst.as_str()]),
        vec![muon(30.0, 1.0), muon(50.0, 1.5)],
    );
    let stat = floats(&row, "Muon_Trigger_SFstat");
    let syst = floats(&row, "Muon_Trigger_SFsyst");
    assert_relative_eq!(stat[0], 0.001, max_relative = 1e-6);
    assert_relative_eq!(stat[1], 0.004, max_relative = 1e-6);
    assert_relative_eq!(syst[0], 0.021, max_relative = 1e-6);
    assert_relative_eq!(syst[1], 0.024, max_relative = 1e-6);
}

#[test]
fn axis_order_flag_swaps_the_lookup_coordinates() {
    // (pt 30, |eta| 1.0): bin (0, 0) with pt on the first axis, but the
    // swapped lookup clamps eta below the pt range and pt above the eta
    // range, landing in bin (0, 1)
    let pt_eta = run_sf(config(&[CENTRAL]), vec![muon(30.0, 1.0)]);
    let mut cfg = config(&[CENTRAL]);
    cfg.pt_eta_axis = false;
    let eta_pt = run_sf(cfg, vec![muon(30.0, 1.0)]);

    assert_relative_eq!(floats(&pt_eta, "Muon_Trigger_SF")[0], 0.91, max_relative = 1e-6);
    assert_relative_eq!(floats(&eta_pt, "Muon_Trigger_SF")[0], 0.92, max_relative = 1e-6);
}

#[test]
fn abs_eta_flag_folds_negative_eta() {
    let folded = run_sf(config(&[CENTRAL]), vec![muon(30.0, -1.5)]);
    assert_relative_eq!(floats(&folded, "Muon_Trigger_SF")[0], 0.92, max_relative = 1e-6);

    let mut cfg = config(&[CENTRAL]);
    cfg.use_abs_eta = false;
    let raw = run_sf(cfg, vec![muon(30.0, -1.5)]);
    // unfolded eta clamps into the first |eta| bin
    assert_relative_eq!(floats(&raw, "Muon_Trigger_SF")[0], 0.91, max_relative = 1e-6);
}

#[test]
fn empty_collection_writes_empty_arrays() {
    let row = run_sf(config(&[CENTRAL]), vec![]);
    assert_eq!(floats(&row, "Muon_Trigger_SF"), Vec::<f32>::new());
    assert_eq!(floats(&row, "Muon_Trigger_SFstat"), Vec::<f32>::new());
}

#[test]
fn missing_surface_name_aborts_the_job() {
    let mut module = LepSfModule::new(config(&["no_such_histogram"])).unwrap();
    let err = module.begin_job().unwrap_err();
    assert!(err.to_string().contains("no_such_histogram"));
}

#[test]
fn missing_surface_file_aborts_the_job() {
    // run period G resolves to the RunGH file, which the fixtures do not have
    let mut cfg = config(&[CENTRAL]);
    cfg.run_period = "G".to_string();
    let mut module = LepSfModule::new(cfg).unwrap();
    assert!(module.begin_job().is_err());
}

#[test]
fn analyze_without_begin_job_is_an_error() {
    let mut module = LepSfModule::new(config(&[CENTRAL])).unwrap();
    let mut out = BranchStore::new();
    module.begin_file(&mut out).unwrap();
    let event = Event::new().with_collection("Muon", vec![muon(30.0, 1.0)]);
    assert!(module.analyze(&event, &mut out).is_err());
}

#[test]
fn pipeline_with_both_modules_fills_every_branch() {
    let event = Event::new()
        .with_collection("Muon", vec![muon(38.0, 1.2)])
        .with_collection(
            "GenPart",
            vec![
                Particle {
                    pt: 40.0,
                    pdg_id: -14,
                    status: 1,
                    status_flags: np_core::flags::IS_PROMPT,
                    ..Default::default()
                },
                Particle {
                    pt: 38.0,
                    eta: 1.2,
                    pdg_id: 13,
                    status: 1,
                    status_flags: np_core::flags::IS_PROMPT,
                    ..Default::default()
                },
            ],
        );

    let mut modules: Vec<Box<dyn Module>> = vec![
        Box::new(GenSelectionModule::default()),
        Box::new(LepSfModule::new(config(&[CENTRAL])).unwrap()),
    ];
    let rows = run_modules(&mut modules, &[event]).unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];

    assert_eq!(row["genVtype"], BranchValue::Int(-14));
    assert_eq!(floats(row, "Muon_Trigger_SF").len(), 1);
    // 15 classification branches + 3 scale-factor branches
    assert_eq!(row.len(), 18);
}
