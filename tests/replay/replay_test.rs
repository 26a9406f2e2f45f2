/*!
 * Replay Tests
 * Recorder-to-replayer pipeline, ordering, determinism, and trace errors
 */

use allocator_sim::engine::CacheEngine;
use allocator_sim::replay::{
    ApiEvent, ReplayError, Replayer, Trace, TraceEntry, TraceError, TraceRecorder,
};
use pretty_assertions::assert_eq;

const KIB: usize = 1024;
const MIB: usize = 1_048_576;

fn recorded_workload() -> Trace {
    let mut recorder = TraceRecorder::new();
    recorder.record_malloc(0, 0x1000, 600 * KIB).unwrap();
    recorder.record_malloc(1, 0x2000, 3 * MIB).unwrap();
    recorder.record_free(2, 0x1000).unwrap();
    recorder.record_malloc(3, 0x3000, 600 * KIB).unwrap();
    recorder.record_free(4, 0x3000).unwrap();
    recorder.record_free(5, 0x2000).unwrap();
    recorder.take_trace()
}

#[test]
fn replay_reproduces_the_live_run() {
    // Drive the engine directly
    let mut direct = CacheEngine::new();
    let a = direct.malloc(0, 600 * KIB, 0).unwrap();
    let b = direct.malloc(0, 3 * MIB, 0).unwrap();
    direct.free(a);
    let c = direct.malloc(0, 600 * KIB, 0).unwrap();
    direct.free(c);
    direct.free(b);

    // Replay the recorded equivalent
    let trace = recorded_workload();
    let mut replayed = CacheEngine::new();
    let usage = Replayer::replay(&trace, &mut replayed, 0, 0).unwrap();

    assert_eq!(usage, direct.usage());
}

#[test]
fn replay_is_deterministic() {
    let trace = recorded_workload();

    let mut first = CacheEngine::new();
    let mut second = CacheEngine::new();
    let usage_first = Replayer::replay(&trace, &mut first, 0, 0).unwrap();
    let usage_second = Replayer::replay(&trace, &mut second, 0, 0).unwrap();

    assert_eq!(usage_first, usage_second);
    assert_eq!(first.free_block_count(), second.free_block_count());
    assert_eq!(first.segment_count(), second.segment_count());
}

#[test]
fn empty_cache_event_releases_between_blocks() {
    let mut trace = Trace::new();
    trace.insert_block(0, TraceEntry { free_op: 1, size: KIB }).unwrap();
    trace.insert_api(2, ApiEvent::EmptyCache);

    let mut engine = CacheEngine::new();
    let usage = Replayer::replay(&trace, &mut engine, 0, 0).unwrap();

    // Without the API event the freed segment would stay reserved
    assert_eq!(usage.current_reserved, 0);
    assert_eq!(usage.peak_reserved, 2 * MIB);
}

#[test]
fn closed_trace_frees_leftover_blocks() {
    let mut recorder = TraceRecorder::new();
    recorder.record_malloc(0, 0x1000, KIB as usize).unwrap();
    recorder.record_malloc(1, 0x2000, 2 * KIB).unwrap();
    recorder.record_free(2, 0x2000).unwrap();

    // 0x1000 never freed: closing synthesises its free event
    let next = recorder.close(3).unwrap();
    assert_eq!(next, 4);
    let trace = recorder.take_trace();

    let mut engine = CacheEngine::new();
    let usage = Replayer::replay(&trace, &mut engine, 0, 0).unwrap();
    assert_eq!(usage.current_allocated, 0);
}

#[test]
fn free_before_malloc_is_rejected() {
    // A block whose free op precedes its malloc op
    let mut trace = Trace::new();
    trace.insert_block(5, TraceEntry { free_op: 1, size: KIB }).unwrap();

    let mut engine = CacheEngine::new();
    let err = Replayer::replay(&trace, &mut engine, 0, 0).unwrap_err();
    assert_eq!(err, ReplayError::Trace(TraceError::DanglingPointer { op: 1 }));
}

#[test]
fn colliding_op_ids_are_rejected() {
    let mut trace = Trace::new();
    trace.insert_block(0, TraceEntry { free_op: 2, size: KIB }).unwrap();
    trace.insert_block(2, TraceEntry { free_op: 3, size: KIB }).unwrap();

    let mut engine = CacheEngine::new();
    let err = Replayer::replay(&trace, &mut engine, 0, 0).unwrap_err();
    assert_eq!(err, ReplayError::Trace(TraceError::OpIdCollision { op: 2 }));
}

#[test]
fn pointer_reuse_while_active_is_rejected() {
    let mut recorder = TraceRecorder::new();
    recorder.record_malloc(0, 0x1000, KIB).unwrap();
    let err = recorder.record_malloc(1, 0x1000, 2 * KIB).unwrap_err();
    assert_eq!(err, TraceError::PointerStillActive { op: 1, ptr: 0x1000 });
}

#[test]
fn recycled_pointer_after_free_is_fine() {
    let mut recorder = TraceRecorder::new();
    recorder.record_malloc(0, 0x1000, KIB).unwrap();
    recorder.record_free(1, 0x1000).unwrap();
    recorder.record_malloc(2, 0x1000, 2 * KIB).unwrap();
    recorder.record_free(3, 0x1000).unwrap();

    let trace = recorder.take_trace();
    assert_eq!(trace.len(), 2);
}
