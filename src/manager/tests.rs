use super::*;
use crate::cycles::Units;
use crate::formats::{Branch, Instrument, SourceInfo};
use crate::test_fixtures::{constant_current_dta, gamry_dta_at};
use std::fs;
use tempfile::TempDir;

fn record(branch: Branch, name: &str) -> RawHalfCycle {
    let sign = match branch {
        Branch::Charge => 1.0,
        Branch::Discharge => -1.0,
    };
    RawHalfCycle::new(
        vec![0.0, 1.0, 2.0],
        vec![sign, sign, sign],
        vec![1.0, 1.0, 1.0],
        branch,
        SourceInfo::new(name, Instrument::Gamry),
    )
    .unwrap()
}

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn names(records: &[RawHalfCycle]) -> Vec<&str> {
    records.iter().map(|r| r.source().name.as_str()).collect()
}

#[test]
fn test_sequence_number_takes_last_digit_run() {
    assert_eq!(sequence_number(Path::new("Charge_#3.DTA")), Some(3));
    assert_eq!(sequence_number(Path::new("dir7/discharge 12 b.DTA")), Some(12));
    assert_eq!(sequence_number(Path::new("cell2_charge_10.DTA")), Some(10));
    assert_eq!(sequence_number(Path::new("charge.DTA")), None);
}

#[test]
fn test_fetch_orders_by_sequence_number_charge_first() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let charge = constant_current_dta(0.1, 1.2, 10);
    let discharge = constant_current_dta(-0.1, 1.0, 10);
    let paths = vec![
        write(dir.path(), "Discharge_2.DTA", &discharge),
        write(dir.path(), "Charge_2.DTA", &charge),
        write(dir.path(), "Discharge_1.DTA", &discharge),
        write(dir.path(), "Charge_1.DTA", &charge),
        write(dir.path(), "Charge_10.DTA", &charge),
    ];

    let mut manager = FileManager::new();
    let report = manager.fetch(&paths);
    assert!(report.is_complete());
    assert_eq!(report.records, 5);
    assert_eq!(
        names(manager.records()),
        ["Charge_1.DTA", "Discharge_1.DTA", "Charge_2.DTA", "Discharge_2.DTA", "Charge_10.DTA"]
    );
    Ok(())
}

#[test]
fn test_fetch_falls_back_to_path_order() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let charge = constant_current_dta(0.1, 1.2, 5);
    let discharge = constant_current_dta(-0.1, 1.0, 5);
    let paths = vec![
        write(dir.path(), "b_discharge.DTA", &discharge),
        write(dir.path(), "a_charge_1.DTA", &charge),
    ];

    let mut manager = FileManager::new();
    manager.fetch(&paths);
    assert_eq!(names(manager.records()), ["a_charge_1.DTA", "b_discharge.DTA"]);
    Ok(())
}

#[test]
fn test_fetch_orders_by_timestamp() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let rows = |i: f64| vec![(0.0, 1.0, i), (1.0, 1.0, i), (2.0, 1.0, i)];
    let paths = vec![
        write(dir.path(), "a.DTA", &gamry_dta_at("12/25/2022", "15:00:00", -0.1, &rows(-0.1), false, 25.0)),
        write(dir.path(), "b.DTA", &gamry_dta_at("12/25/2022", "13:00:00", 0.1, &rows(0.1), false, 25.0)),
    ];

    let mut manager = FileManager::with_config(ManagerConfig::default().with_order(FetchOrder::Timestamp));
    manager.fetch(&paths);
    assert_eq!(names(manager.records()), ["b.DTA", "a.DTA"]);
    Ok(())
}

#[test]
fn test_fetch_collects_failures_without_aborting() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let good = write(dir.path(), "Charge_1.DTA", &constant_current_dta(0.1, 1.2, 5));
    let bad = write(dir.path(), "Discharge_1.DTA", "EXPLAIN\nTAG\tCHARGE\n");
    let missing = dir.path().join("Charge_2.DTA");

    let mut manager = FileManager::new();
    let report = manager.fetch([&good, &bad, &missing]);
    assert_eq!(report.loaded, vec![good]);
    assert_eq!(report.failed.len(), 2);
    assert_eq!(report.attempted(), 3);
    assert_eq!(manager.len(), 1);
    assert!(report.to_string().contains("Fetched 1 of 3 files"));

    match report.into_result() {
        Err(ManagerError::BatchFailed { failed, total, failures }) => {
            assert_eq!((failed, total), (2, 3));
            assert_eq!(failures[0].path, bad);
            assert!(matches!(failures[1].error, FormatError::Io { .. }));
        }
        other => panic!("expected BatchFailed, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_fetch_file_returns_parser_error() {
    let mut manager = FileManager::new();
    let err = manager.fetch_file("/nonexistent/Charge_1.DTA").unwrap_err();
    assert!(matches!(err, ManagerError::Format { source: FormatError::Io { .. }, .. }));
    assert!(manager.is_empty());
}

#[test]
fn test_fetch_file_rejects_rate_tables() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = write(dir.path(), "rate.csv", "cycle,current,discharge capacity\n1,0.1,10\n");

    let mut manager = FileManager::new();
    let err = manager.fetch_file(&path).unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Format {
            source: FormatError::UnsupportedInstrument { .. },
            ..
        }
    ));
    Ok(())
}

#[test]
fn test_fetch_from_folder_matches_extension_case_insensitively() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    write(dir.path(), "Charge_1.DTA", &constant_current_dta(0.1, 1.2, 5));
    write(dir.path(), "Discharge_1.dta", &constant_current_dta(-0.1, 1.0, 5));
    write(dir.path(), "notes.txt", "not a data file");

    let mut manager = FileManager::new();
    let report = manager.fetch_from_folder(dir.path(), ".DTA")?;
    assert_eq!(report.loaded.len(), 2);
    assert!(report.is_complete());

    let mut other = FileManager::new();
    other.fetch_from_folder(dir.path(), "dta")?;
    assert_eq!(names(other.records()), names(manager.records()));
    Ok(())
}

#[test]
fn test_fetch_from_folder_rejects_files() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let file = write(dir.path(), "Charge_1.DTA", &constant_current_dta(0.1, 1.2, 5));

    let mut manager = FileManager::new();
    assert!(matches!(
        manager.fetch_from_folder(&file, "DTA"),
        Err(ManagerError::InvalidFolder(_))
    ));
    Ok(())
}

#[test]
fn test_fetches_append_in_call_order() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let late = write(dir.path(), "Charge_9.DTA", &constant_current_dta(0.1, 1.2, 5));
    let early = write(dir.path(), "Charge_1.DTA", &constant_current_dta(0.1, 1.2, 5));

    let mut manager = FileManager::new();
    manager.fetch_file(&late)?;
    manager.fetch_file(&early)?;
    assert_eq!(names(manager.records()), ["Charge_9.DTA", "Charge_1.DTA"]);
    Ok(())
}

#[test]
fn test_pairing_alternating_records() -> Result<(), Box<dyn std::error::Error>> {
    let records = vec![
        record(Branch::Charge, "c0"),
        record(Branch::Discharge, "d0"),
        record(Branch::Charge, "c1"),
        record(Branch::Discharge, "d1"),
    ];
    let cycles = pair_sequential(records, &PairingOptions::default())?;
    assert_eq!(cycles.len(), 2);
    assert!(cycles.iter().all(Cycle::is_complete));
    assert_eq!(cycles.iter().map(Cycle::number).collect::<Vec<_>>(), [0, 1]);
    Ok(())
}

#[test]
fn test_lenient_pairing_emits_one_sided_cycles() -> Result<(), Box<dyn std::error::Error>> {
    let records = vec![
        record(Branch::Discharge, "d0"),
        record(Branch::Charge, "c1"),
        record(Branch::Charge, "c2"),
        record(Branch::Discharge, "d2"),
        record(Branch::Charge, "c3"),
    ];
    let cycles = pair_sequential(records, &PairingOptions::default())?;
    assert_eq!(cycles.len(), 4);
    assert!(cycles[0].charge().is_none() && cycles[0].discharge().is_some());
    assert!(cycles[1].charge().is_some() && cycles[1].discharge().is_none());
    assert!(cycles[2].is_complete());
    assert_eq!(cycles[2].charge().map(|h| h.source().name.as_str()), Some("c2"));
    assert!(cycles[3].discharge().is_none());
    Ok(())
}

#[test]
fn test_strict_pairing_rejects_consecutive_charges() {
    let options = PairingOptions {
        strict: true,
        ..Default::default()
    };
    let records = vec![
        record(Branch::Charge, "c1"),
        record(Branch::Charge, "c2"),
        record(Branch::Discharge, "d2"),
    ];
    match pair_sequential(records, &options) {
        Err(ManagerError::UnpairedData { position, .. }) => assert_eq!(position, 1),
        other => panic!("expected UnpairedData, got {:?}", other),
    }

    let leading = vec![record(Branch::Discharge, "d0"), record(Branch::Charge, "c1")];
    assert!(matches!(
        pair_sequential(leading, &options),
        Err(ManagerError::UnpairedData { position: 0, .. })
    ));
}

#[test]
fn test_strict_pairing_allows_terminal_charge() -> Result<(), Box<dyn std::error::Error>> {
    let options = PairingOptions {
        strict: true,
        ..Default::default()
    };
    let records = vec![
        record(Branch::Charge, "c0"),
        record(Branch::Discharge, "d0"),
        record(Branch::Charge, "c1"),
    ];
    let cycles = pair_sequential(records, &options)?;
    assert_eq!(cycles.len(), 2);
    assert!(!cycles[1].is_complete());
    Ok(())
}

#[test]
fn test_merge_partial_joins_same_branch_runs() -> Result<(), Box<dyn std::error::Error>> {
    let records = vec![
        record(Branch::Charge, "c0a"),
        record(Branch::Charge, "c0b"),
        record(Branch::Discharge, "d0"),
    ];
    assert_eq!(group_consecutive(&records), vec![vec![0, 1], vec![2]]);

    let options = PairingOptions {
        merge_partial: true,
        strict: true,
        units: Units::default(),
    };
    let cycles = pair_sequential(records, &options)?;
    assert_eq!(cycles.len(), 1);
    let charge = cycles[0].charge().unwrap();
    assert_eq!(charge.len(), 6);
    assert!(charge.time().windows(2).all(|w| w[1] >= w[0]));
    Ok(())
}

#[test]
fn test_session_build_and_reset() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let mut manager = FileManager::new();
    assert!(matches!(manager.build_cellcycling(), Err(ManagerError::EmptySession)));

    manager.fetch_file(write(dir.path(), "Charge_1.DTA", &constant_current_dta(0.1, 1.2, 37)))?;
    manager.fetch_file(write(dir.path(), "Discharge_1.DTA", &constant_current_dta(-0.1, 1.0, 37)))?;
    assert_eq!(manager.suggest_ordering(), vec![vec![0], vec![1]]);

    let first = manager.build_cellcycling()?;
    let second = manager.build_cellcycling()?;
    assert_eq!(first.len(), 1);
    assert_eq!(first.capacities(), second.capacities());
    assert!((first[0].capacity_discharge().unwrap() - 1.0).abs() < 1e-9);

    manager.reset();
    assert!(manager.is_empty());
    assert!(matches!(manager.build_cycles(), Err(ManagerError::EmptySession)));
    Ok(())
}

#[test]
fn test_parse_step_current() {
    assert_eq!(parse_step_current("step_0,3A"), Some(0.3));
    assert_eq!(parse_step_current("300mA"), Some(0.3));
    assert_eq!(parse_step_current("I=1.5"), Some(1.5));
    assert_eq!(parse_step_current("step_2"), Some(2.0));
    assert_eq!(parse_step_current("fast"), None);
}

fn gamry_tree(base: &Path, steps: &[&str]) {
    for step in steps {
        let data = base.join(step).join(DEFAULT_RESERVED_FOLDER);
        fs::create_dir_all(&data).unwrap();
        write(&data, "Charge_1.DTA", &constant_current_dta(0.1, 1.2, 10));
        write(&data, "Discharge_1.DTA", &constant_current_dta(-0.1, 1.0, 10));
    }
}

#[test]
fn test_discover_gamry_tree() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    gamry_tree(dir.path(), &["step_2_200mA", "step_1_0,1A", "step_3"]);
    fs::write(dir.path().join("step_3").join(tree::STEP_COMPANION), "current = 0.5\n")?;

    let steps = discover_gamry_tree(dir.path(), "charge_discharge")?;
    let currents: Vec<f64> = steps.iter().map(|s| s.current).collect();
    assert_eq!(currents, [1.0, 2.0, 0.5]);
    assert!(steps[0].folder.ends_with("step_1_0,1A"));
    Ok(())
}

#[test]
fn test_discover_gamry_tree_errors() -> Result<(), Box<dyn std::error::Error>> {
    let empty = TempDir::new()?;
    assert!(matches!(
        discover_gamry_tree(empty.path(), DEFAULT_RESERVED_FOLDER),
        Err(ManagerError::InvalidFolderTree { .. })
    ));

    let no_reserved = TempDir::new()?;
    fs::create_dir_all(no_reserved.path().join("100mA").join("DATA"))?;
    assert!(matches!(
        discover_gamry_tree(no_reserved.path(), DEFAULT_RESERVED_FOLDER),
        Err(ManagerError::InvalidFolderTree { .. })
    ));

    let no_current = TempDir::new()?;
    gamry_tree(no_current.path(), &["fast"]);
    match discover_gamry_tree(no_current.path(), DEFAULT_RESERVED_FOLDER) {
        Err(ManagerError::InvalidFolderTree { reason, .. }) => assert!(reason.contains("fast")),
        other => panic!("expected InvalidFolderTree, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_fetch_gamry_folder_tree_appends_steps_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    gamry_tree(dir.path(), &["a_100mA", "b_200mA"]);

    let mut manager = FileManager::new();
    let report = manager.fetch_gamry_folder_tree(dir.path())?;
    assert_eq!(report.loaded.len(), 4);
    assert_eq!(manager.len(), 4);
    assert_eq!(manager.build_cycles()?.len(), 2);
    Ok(())
}
