/*!
 * Best-Config Persistence
 *
 * Plain-text, newline-separated file: the six knobs in fixed order, then
 * (when group optimization produced them) the five group boundaries with
 * the sentinel written as the platform maximum, then zero or more opaque
 * callpath-hash lines belonging to the static-tensor layer above.
 */

use crate::config::{BestConfig, ConfigStore, GroupBoundaries, PersistError, PersistResult};
use crate::core::limits::GROUP_SLOTS;
use crate::core::types::Size;
use log::info;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File-backed configuration store
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_size(line: &str, number: usize) -> PersistResult<Size> {
        line.trim().parse().map_err(|_| PersistError::Parse {
            line: number,
            reason: format!("expected a size, got {line:?}"),
        })
    }
}

impl ConfigStore for FileConfigStore {
    fn save(&self, best: &BestConfig) -> PersistResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut out = fs::File::create(&self.path)?;
        for knob in best.knobs {
            writeln!(out, "{knob}")?;
        }
        if let Some(groups) = &best.groups {
            for &slot in groups.slots() {
                writeln!(out, "{slot}")?;
            }
        }
        for hash in &best.callpath_hashes {
            writeln!(out, "{hash}")?;
        }
        out.flush()?;

        info!("persisted best config to {}", self.path.display());
        Ok(())
    }

    fn load(&self, expect_groups: bool) -> PersistResult<BestConfig> {
        let text = fs::read_to_string(&self.path)?;
        let lines: Vec<&str> = text.lines().collect();

        let needed = 6 + if expect_groups { GROUP_SLOTS } else { 0 };
        if lines.len() < needed {
            return Err(PersistError::Parse {
                line: lines.len(),
                reason: format!("file truncated: {} of {needed} value lines", lines.len()),
            });
        }

        let mut knobs = [0; 6];
        for (i, knob) in knobs.iter_mut().enumerate() {
            *knob = Self::parse_size(lines[i], i + 1)?;
        }

        let groups = if expect_groups {
            let mut slots = [0; GROUP_SLOTS];
            for (i, slot) in slots.iter_mut().enumerate() {
                *slot = Self::parse_size(lines[6 + i], 7 + i)?;
            }
            Some(GroupBoundaries::from_slots(slots))
        } else {
            None
        };

        let callpath_hashes = lines[needed..]
            .iter()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();

        Ok(BestConfig {
            knobs,
            groups,
            callpath_hashes,
        })
    }
}
