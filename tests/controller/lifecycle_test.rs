/*!
 * Controller Lifecycle Tests
 * Collection modes, iteration boundaries, and the profiling cutoff
 */

use allocator_sim::controller::{Controller, ModeFlag};
use pretty_assertions::assert_eq;
use std::path::Path;

const KIB: usize = 1024;
const MIB: usize = 1_048_576;

fn test_controller(dir: &Path) -> Controller {
    let _ = env_logger::builder().is_test(true).try_init();
    Controller::with_paths(0, 0, dir.join("best_config.txt"), dir.join("dumps"))
}

/// One iteration's worth of malloc/free pairs
fn feed_iteration(controller: &mut Controller, base_ptr: usize) {
    controller.collect_trace(base_ptr, KIB as i64, true).unwrap();
    controller.collect_trace(base_ptr + 1, (3 * MIB) as i64, true).unwrap();
    controller.collect_trace(base_ptr, -1, true).unwrap();
    controller.collect_trace(base_ptr + 1, -1, true).unwrap();
}

#[test]
fn sync_mode_drives_the_engine_directly() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = test_controller(dir.path());
    controller.set_mode(ModeFlag::AsyncTracing, false);
    controller.set_mode(ModeFlag::Profiling, false);
    controller.set_mode(ModeFlag::FunctionalityChecking, true);

    controller.collect_trace(0x1000, KIB as i64, true).unwrap();
    assert_eq!(controller.usage().current_allocated, KIB);
    assert_eq!(controller.usage().current_reserved, 2 * MIB);

    controller.collect_trace(0x1000, -1, true).unwrap();
    assert_eq!(controller.usage().current_allocated, 0);

    controller
        .collect_api(allocator_sim::replay::ApiEvent::EmptyCache)
        .unwrap();
    assert_eq!(controller.usage().current_reserved, 0);
}

#[test]
fn sync_mode_rejects_unknown_pointers() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = test_controller(dir.path());
    controller.set_mode(ModeFlag::AsyncTracing, false);
    controller.set_mode(ModeFlag::FunctionalityChecking, true);

    assert!(controller.collect_trace(0xdead, -1, true).is_err());
}

#[test]
fn profiling_tunes_at_the_second_iteration_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = test_controller(dir.path());

    // Iteration 1: accumulate only
    assert!(!controller.iteration_trigger(true).unwrap());
    feed_iteration(&mut controller, 0x1000);
    assert!(!controller.iteration_trigger(false).unwrap());
    assert_eq!(controller.iteration(), 1);
    assert!(controller.best().is_none());

    // Iteration 2: the cutoff
    assert!(!controller.iteration_trigger(true).unwrap());
    feed_iteration(&mut controller, 0x2000);
    let reconfigured = controller.iteration_trigger(false).unwrap();
    assert!(reconfigured);

    let best = controller.best().expect("search ran");
    assert!(best.peak_reserved <= best.baseline_reserved);
    assert!(controller.config_path().exists());

    // Later iterations do not rerun the search
    assert!(!controller.iteration_trigger(true).unwrap());
    feed_iteration(&mut controller, 0x3000);
    assert!(!controller.iteration_trigger(false).unwrap());
    assert_eq!(controller.iteration(), 3);
}

#[test]
fn profiling_cutoff_with_no_search_mode_does_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = test_controller(dir.path());
    controller.set_mode(ModeFlag::ConfigOptimization, false);

    feed_iteration(&mut controller, 0x1000);
    assert!(!controller.iteration_trigger(false).unwrap());
    feed_iteration(&mut controller, 0x2000);
    assert!(!controller.iteration_trigger(false).unwrap());
    assert!(controller.best().is_none());
    assert!(!controller.config_path().exists());
}

#[test]
fn still_live_pointers_survive_the_cutoff() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = test_controller(dir.path());

    // A pointer allocated in iteration 1 and never freed
    controller.collect_trace(0x7000, (2 * MIB) as i64, true).unwrap();
    feed_iteration(&mut controller, 0x1000);
    assert!(!controller.iteration_trigger(false).unwrap());
    feed_iteration(&mut controller, 0x2000);
    // The close pass synthesises its free; the search still runs
    assert!(controller.iteration_trigger(false).unwrap());
    assert!(controller.best().is_some());
}

#[test]
fn allocation_size_mirror_matches_the_engine_config() {
    let dir = tempfile::tempdir().unwrap();
    let controller = test_controller(dir.path());

    assert_eq!(controller.allocation_size_of(KIB), 2 * MIB);
    assert_eq!(controller.allocation_size_of(3 * MIB), 20 * MIB);
    assert_eq!(controller.allocation_size_of(21 * MIB), 22 * MIB);
}

#[test]
fn trace_dump_writes_one_batch_per_iteration() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = test_controller(dir.path());
    controller.set_mode(ModeFlag::TraceDumping, true);

    feed_iteration(&mut controller, 0x1000);
    controller.iteration_trigger(false).unwrap();

    let text = std::fs::read_to_string(dir.path().join("dumps/trace_dump.csv")).unwrap();
    assert!(text.contains("<<<<<<<<<< iteration 1 end >>>>>>>>>>"));
    // malloc op 0 freed at op 2 with 1 KiB
    assert!(text.lines().any(|line| line == format!("0,2,{KIB}")));
}

#[test]
fn usage_dump_rows_follow_sync_execution() {
    let dir = tempfile::tempdir().unwrap();
    let mut controller = test_controller(dir.path());
    controller.set_mode(ModeFlag::AsyncTracing, false);
    controller.set_mode(ModeFlag::FunctionalityChecking, true);
    controller.set_mode(ModeFlag::DebugDumping, true);

    controller.collect_trace(0x1000, KIB as i64, true).unwrap();
    controller.collect_trace(0x1000, -1, true).unwrap();
    controller.finalize_dumps().unwrap();

    let text = std::fs::read_to_string(dir.path().join("dumps/memory_usage.csv")).unwrap();
    assert!(text.starts_with("opid,delta_size,current_allocated,current_reserved"));
    assert!(text.contains(&format!("0,{KIB},{KIB},{}", 2 * MIB)));
    assert!(text.ends_with(&format!("max_allocated_size,{KIB}\nmax_reserved_size,{}\n", 2 * MIB)));
}
