//! Save/load round trips through every format, and atomic failure on load.

use std::path::PathBuf;

use ising_anneal::config::*;
use ising_anneal::persistence::{read_state, write_state};
use ising_anneal::{Format, SimError, Simulation};

fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ising_anneal_test_{}", name));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn cleanup(dir: &PathBuf) {
    let _ = std::fs::remove_dir_all(dir);
}

fn evolved(boundary: BoundaryConfig, rule: UpdateRule, seed: u64) -> Simulation {
    let mut sim = Simulation::new(SimConfig {
        grid_size: 7,
        temperature: 2.269,
        boundary,
        update_rule: rule,
        seed,
        sequential: true,
        ..SimConfig::default()
    })
    .unwrap();
    sim.run(3_000, 100, None).unwrap();
    sim
}

#[test]
fn test_every_format_round_trips_through_a_file() {
    let dir = test_dir("round_trip");
    let source = evolved(
        BoundaryConfig::mixed(
            [
                (Edge::Left, BoundaryKind::Periodic),
                (Edge::Right, BoundaryKind::Periodic),
                (Edge::Top, BoundaryKind::Fixed),
                (Edge::Bottom, BoundaryKind::Open),
            ],
            -1,
        ),
        UpdateRule::Glauber,
        17,
    );
    let snapshot = source.snapshot();
    assert_eq!(source.metrics().len(), 30);
    assert!(!source.metrics().binder_cumulant.is_empty());

    for format in Format::ALL {
        let path = dir.join(format!("state.{}", format.as_str()));
        source.save_state(&path, format).unwrap();
        assert_eq!(Format::from_path(&path).unwrap(), format);

        let decoded = read_state(&path, format).unwrap();
        assert_eq!(decoded, snapshot, "format {}", format.as_str());

        let mut target = Simulation::new(SimConfig {
            grid_size: 4,
            sequential: true,
            ..SimConfig::default()
        })
        .unwrap();
        target.load_state(&path, format).unwrap();
        assert_eq!(target.grid(), source.grid());
        assert_eq!(target.energy(), source.energy());
        assert_eq!(target.magnetization(), source.magnetization());
        assert_eq!(target.temperature(), source.temperature());
        assert_eq!(target.config().boundary, source.config().boundary);
        assert_eq!(target.config().update_rule, UpdateRule::Glauber);
        assert_eq!(
            target.accountant().total_moves(),
            source.accountant().total_moves()
        );
        assert_eq!(target.snapshot(), snapshot);
    }
    cleanup(&dir);
}

#[test]
fn test_restored_simulation_keeps_accumulating() {
    let source = evolved(BoundaryConfig::fixed(1), UpdateRule::HeatBath, 5);
    let mut resumed = Simulation::from_state(source.snapshot(), 99).unwrap();
    resumed.run(500, 100, None).unwrap();
    assert_eq!(resumed.metrics().len(), 35);
    assert_eq!(resumed.metrics().specific_heat.len(), 34);
    assert_eq!(resumed.accountant().total_moves(), 3_500);
    assert!(resumed.check_consistency().is_ok());
}

#[test]
fn test_failed_load_leaves_simulation_untouched() {
    let dir = test_dir("failed_load");
    let mut sim = evolved(BoundaryConfig::default(), UpdateRule::Metropolis, 1);
    let before = sim.snapshot();

    // A spin that is not ±1.
    let mut bad = before.clone();
    bad.grid[3][3] = 0;
    let path = dir.join("bad_spin.json");
    write_state(&bad, &path, Format::Json).unwrap();
    assert!(matches!(
        sim.load_state(&path, Format::Json),
        Err(SimError::InvalidState(_))
    ));
    assert_eq!(sim.snapshot(), before);

    // Magnetization that disagrees with the grid.
    let mut bad = before.clone();
    bad.magnetization += 2;
    assert!(matches!(sim.restore(bad), Err(SimError::InvalidState(_))));

    // Energy that disagrees with the grid.
    let mut bad = before.clone();
    bad.energy += 4.0;
    assert!(matches!(sim.restore(bad), Err(SimError::InvalidState(_))));

    // Ragged grid.
    let mut bad = before.clone();
    bad.grid[2].pop();
    assert!(matches!(sim.restore(bad), Err(SimError::InvalidState(_))));

    // Unknown and unimplemented tags.
    let mut bad = before.clone();
    bad.parameters.update_rule = "gibbs".into();
    assert!(matches!(sim.restore(bad), Err(SimError::Config(_))));
    let mut bad = before.clone();
    bad.parameters.update_rule = "wolff".into();
    assert!(matches!(sim.restore(bad), Err(SimError::NotImplemented(_))));
    let mut bad = before.clone();
    bad.parameters.update_rule = "fortun_kasteleyn".into();
    assert!(matches!(
        sim.restore(bad),
        Err(SimError::NotImplemented("fortuin_kasteleyn"))
    ));
    let mut bad = before.clone();
    bad.parameters.boundary = "twisted".into();
    assert!(matches!(sim.restore(bad), Err(SimError::Config(_))));

    // A fixed boundary whose ring does not hold the fixed value.
    let mut bad = before.clone();
    bad.parameters.boundary = "fixed".into();
    bad.parameters.fixed_value = 1;
    bad.grid[0][0] = -1;
    assert!(sim.restore(bad).is_err());

    // Wrong version.
    let mut bad = before.clone();
    bad.version = 0;
    assert!(matches!(sim.restore(bad), Err(SimError::InvalidState(_))));

    // Missing file and truncated payload.
    assert!(matches!(
        sim.load_state(dir.join("absent.bin"), Format::Binary),
        Err(SimError::Io(_))
    ));
    let path = dir.join("truncated.bin.gz");
    sim.save_state(&path, Format::CompressedBinary).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
    assert!(sim.load_state(&path, Format::CompressedBinary).is_err());

    assert_eq!(sim.snapshot(), before);
    cleanup(&dir);
}

#[test]
fn test_missing_json_field_is_reported() {
    let dir = test_dir("missing_field");
    let sim = evolved(BoundaryConfig::default(), UpdateRule::Metropolis, 2);
    let path = dir.join("state.json");
    sim.save_state(&path, Format::Json).unwrap();

    let mut value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    value.as_object_mut().unwrap().remove("temperature");
    std::fs::write(&path, value.to_string()).unwrap();

    match read_state(&path, Format::Json) {
        Err(SimError::Json(e)) => assert!(e.to_string().contains("temperature")),
        other => panic!("expected a JSON error, got {other:?}"),
    }
    cleanup(&dir);
}

#[test]
fn test_unsupported_format_names() {
    for name in ["xml", "yaml", "hdf"] {
        assert!(matches!(
            Format::try_from(name),
            Err(SimError::UnsupportedFormat(_))
        ));
    }
}
