/*!
 * Persistence Tests
 * Best-config round-trips between profiling and apply mode
 */

use allocator_sim::config::{BestConfig, ConfigStore};
use allocator_sim::controller::{Controller, FileConfigStore, ModeFlag};
use pretty_assertions::assert_eq;
use std::path::Path;

const KIB: usize = 1024;
const MIB: usize = 1_048_576;

fn profiling_controller(dir: &Path) -> Controller {
    Controller::with_paths(0, 0, dir.join("best_config.txt"), dir.join("dumps"))
}

fn apply_controller(dir: &Path) -> Controller {
    let mut controller = profiling_controller(dir);
    controller.set_mode(ModeFlag::Profiling, false);
    controller.set_mode(ModeFlag::AsyncTracing, false);
    controller.set_mode(ModeFlag::FunctionalityChecking, true);
    controller
}

/// The shared workload: small, medium, and clustered large blocks
fn feed_events(controller: &mut Controller) {
    let sizes: [usize; 5] = [4 * KIB, 600 * KIB, 30 * MIB, 32 * MIB, 34 * MIB];
    for (i, &size) in sizes.iter().enumerate() {
        let ptr = 0x1000 + i;
        controller.collect_trace(ptr, size as i64, true).unwrap();
        controller.collect_trace(ptr, -1, true).unwrap();
    }
}

fn run_profiling(dir: &Path, group_optimization: bool) -> (usize, usize) {
    let mut controller = profiling_controller(dir);
    controller.set_mode(ModeFlag::ConfigOptimization, !group_optimization);
    controller.set_mode(ModeFlag::GroupOptimization, group_optimization);

    feed_events(&mut controller);
    assert!(!controller.iteration_trigger(false).unwrap());
    feed_events(&mut controller);
    assert!(controller.iteration_trigger(false).unwrap());

    let best = controller.best().expect("search ran");
    (best.peak_allocated, best.peak_reserved)
}

#[test]
fn apply_mode_reproduces_the_tuned_peaks() {
    let dir = tempfile::tempdir().unwrap();
    let (_, best_reserved) = run_profiling(dir.path(), false);

    let mut controller = apply_controller(dir.path());
    // Loading the persisted config counts as a reconfiguration
    assert!(controller.iteration_trigger(true).unwrap());

    feed_events(&mut controller);
    feed_events(&mut controller);
    assert_eq!(controller.usage().peak_reserved, best_reserved);
}

#[test]
fn apply_mode_reproduces_grouped_peaks() {
    let dir = tempfile::tempdir().unwrap();
    let (_, best_reserved) = run_profiling(dir.path(), true);

    let mut controller = apply_controller(dir.path());
    controller.set_mode(ModeFlag::GroupOptimization, true);
    assert!(controller.iteration_trigger(true).unwrap());
    assert!(controller.engine().grouping_enabled());

    feed_events(&mut controller);
    feed_events(&mut controller);
    assert_eq!(controller.usage().peak_reserved, best_reserved);
}

#[test]
fn persisted_file_round_trips_through_the_store() {
    let dir = tempfile::tempdir().unwrap();
    run_profiling(dir.path(), true);

    let store = FileConfigStore::new(dir.path().join("best_config.txt"));
    let best = store.load(true).unwrap();
    assert_eq!(best.knobs.len(), 6);
    assert!(best.groups.is_some());
    assert!(best.callpath_hashes.is_empty());

    // Saving it again yields a byte-identical file
    let copy_path = dir.path().join("copy.txt");
    let copy_store = FileConfigStore::new(&copy_path);
    copy_store.save(&best).unwrap();
    assert_eq!(
        std::fs::read_to_string(dir.path().join("best_config.txt")).unwrap(),
        std::fs::read_to_string(&copy_path).unwrap()
    );
}

#[test]
fn reader_accepts_trailing_callpath_hashes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("best_config.txt");
    let store = FileConfigStore::new(&path);
    store
        .save(&BestConfig {
            knobs: [512, MIB, 2 * MIB, 20 * MIB, 10 * MIB, 2 * MIB],
            groups: None,
            callpath_hashes: vec!["0123abcd".into()],
        })
        .unwrap();

    let mut controller = apply_controller(dir.path());
    assert!(controller.iteration_trigger(true).unwrap());
    assert_eq!(controller.allocation_size_of(KIB), 2 * MIB);
}

#[test]
fn missing_config_file_surfaces_and_preserves_mode() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = apply_controller(dir.path());

    assert!(controller.iteration_trigger(true).is_err());
    // Mode flags are untouched by the failure
    assert!(!controller.modes().profiling);
    assert!(controller.modes().functionality_checking);
    // The controller still works as a plain synchronous simulator
    controller.collect_trace(0x1000, KIB as i64, true).unwrap();
    assert_eq!(controller.usage().current_allocated, KIB);
}
