/*!
 * Research Dumps
 *
 * Optional file outputs for offline study: completed traces per iteration,
 * per-op memory usage rows, and JSON free-pool snapshots.
 */

use crate::config::PersistResult;
use crate::core::types::{OpId, Size};
use crate::engine::{PoolsSnapshot, SegmentSnapshot};
use crate::replay::Trace;
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

fn create_writer(path: &Path) -> PersistResult<BufWriter<fs::File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(BufWriter::new(fs::File::create(path)?))
}

/// Writes completed traces, one batch per iteration
#[derive(Debug)]
pub struct TraceDumper {
    out: BufWriter<fs::File>,
    path: PathBuf,
}

impl TraceDumper {
    pub fn create(path: impl Into<PathBuf>) -> PersistResult<Self> {
        let path = path.into();
        Ok(Self {
            out: create_writer(&path)?,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One iteration's completed blocks, a separator, then the API events
    ///
    /// `from_op` is the watermark of the previous boundary: the trace
    /// accumulates across iterations, so earlier entries are skipped.
    pub fn dump_iteration(&mut self, iteration: u64, trace: &Trace, from_op: OpId) -> PersistResult<()> {
        for (&malloc_op, entry) in trace.blocks() {
            if malloc_op < from_op {
                continue;
            }
            writeln!(self.out, "{malloc_op},{},{}", entry.free_op, entry.size)?;
        }
        writeln!(self.out, "<<<<<<<<<< iteration {iteration} end >>>>>>>>>>")?;
        for (&op, event) in trace.apis() {
            if op < from_op {
                continue;
            }
            writeln!(self.out, "{op},{}", event.code())?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Writes one usage row per op plus a final peak summary
#[derive(Debug)]
pub struct UsageDumper {
    out: BufWriter<fs::File>,
    max_allocated: Size,
    max_reserved: Size,
}

impl UsageDumper {
    pub fn create(path: impl Into<PathBuf>) -> PersistResult<Self> {
        let path = path.into();
        let mut out = create_writer(&path)?;
        writeln!(out, "opid,delta_size,current_allocated,current_reserved")?;
        Ok(Self {
            out,
            max_allocated: 0,
            max_reserved: 0,
        })
    }

    /// Record one op's signed size delta and the counters after it
    pub fn record(
        &mut self,
        op: OpId,
        delta: i64,
        current_allocated: Size,
        current_reserved: Size,
    ) -> PersistResult<()> {
        writeln!(
            self.out,
            "{op},{delta},{current_allocated},{current_reserved}"
        )?;
        self.max_allocated = self.max_allocated.max(current_allocated);
        self.max_reserved = self.max_reserved.max(current_reserved);
        Ok(())
    }

    /// Trailing peak summary
    pub fn finish(&mut self) -> PersistResult<()> {
        writeln!(self.out)?;
        writeln!(self.out, "max_allocated_size,{}", self.max_allocated)?;
        writeln!(self.out, "max_reserved_size,{}", self.max_reserved)?;
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct SnapshotRecord<'a> {
    op: OpId,
    #[serde(flatten)]
    pools: &'a PoolsSnapshot,
    segments: &'a [SegmentSnapshot],
}

/// Writes free-pool and segment-layout snapshots as one JSON document per
/// line
#[derive(Debug)]
pub struct PoolSnapshotDumper {
    out: BufWriter<fs::File>,
}

impl PoolSnapshotDumper {
    pub fn create(path: impl Into<PathBuf>) -> PersistResult<Self> {
        let path = path.into();
        Ok(Self {
            out: create_writer(&path)?,
        })
    }

    pub fn record(
        &mut self,
        op: OpId,
        pools: &PoolsSnapshot,
        segments: &[SegmentSnapshot],
    ) -> PersistResult<()> {
        let record = SnapshotRecord { op, pools, segments };
        serde_json::to_writer(&mut self.out, &record).map_err(std::io::Error::from)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
