//! Save/load round trips through the filesystem.

mod common;

use std::fs;

use common::{breaker, workspace};
use panel_sim::io::persist::{self, PersistError};
use panel_sim::panel::slots::SwapPolicy;
use panel_sim::panel::types::AMBIENT_TEMP_F;
use panel_sim::sim::engine::Engine;
use panel_sim::sim::types::{SimConfig, TimeSpeed};

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("panel-sim-{}-{name}", std::process::id()))
}

#[test]
fn saved_panel_loads_cold_with_other_fields_intact() {
    let ws = workspace(vec![
        breaker("kitchen", 15, &[1], 2700.0),
        breaker("dryer", 30, &[2, 4], 5000.0),
    ]);
    let mut engine = Engine::new(SimConfig::new(20, TimeSpeed::X10, 1), ws, Vec::new());
    engine.run();
    let warm = engine.workspace().active_panel().clone();
    assert!(warm.breakers.iter().any(|b| b.thermal_heat > 0.0));

    let path = temp_path("roundtrip.json");
    let saved = persist::save(engine.workspace(), &path);
    assert!(saved.is_ok(), "{saved:?}");
    let loaded = persist::load(&path, SwapPolicy::BestEffort, 0);
    fs::remove_file(&path).ok();
    let loaded = loaded.unwrap();

    let cold = loaded.active_panel();
    for (before, after) in warm.breakers.iter().zip(&cold.breakers) {
        assert_eq!(after.thermal_heat, 0.0);
        assert!(after.components().all(|c| c.temperature == AMBIENT_TEMP_F));

        let mut expected = before.clone();
        expected.thermal_heat = 0.0;
        for c in expected.runs.iter_mut().flatten() {
            c.temperature = AMBIENT_TEMP_F;
        }
        assert_eq!(after, &expected);
    }
    assert_eq!(cold.main_tripped, warm.main_tripped);
    assert_eq!(loaded.time_speed(), TimeSpeed::X1);
}

#[test]
fn missing_file_is_an_io_error() {
    let err = persist::load(&temp_path("absent.json"), SwapPolicy::BestEffort, 0);
    assert!(matches!(err, Err(PersistError::Io(_))));
}

#[test]
fn garbage_is_a_json_error() {
    let path = temp_path("garbage.json");
    fs::write(&path, "not json").unwrap();
    let err = persist::load(&path, SwapPolicy::BestEffort, 0);
    fs::remove_file(&path).ok();
    assert!(matches!(err, Err(PersistError::Json(_))));
}

#[test]
fn hand_edited_overlap_is_refused_on_load() {
    let ws = workspace(vec![
        breaker("kitchen", 15, &[1], 1200.0),
        breaker("dryer", 30, &[2, 4], 5000.0),
    ]);
    let mut state: serde_json::Value =
        serde_json::from_str(&persist::to_json(&ws).unwrap()).unwrap();
    state["panels"][0]["breakers"][1]["slots"] = serde_json::json!([1, 3]);

    let path = temp_path("overlap.json");
    fs::write(&path, state.to_string()).unwrap();
    let err = persist::load(&path, SwapPolicy::BestEffort, 0);
    fs::remove_file(&path).ok();
    assert!(matches!(err, Err(PersistError::InvalidPanel { .. })), "{err:?}");
}
