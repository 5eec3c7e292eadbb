//! Undo/redo history of workflow edits
//!
//! Each entry is a zstd-compressed JSON snapshot of the workflow together
//! with the cause that produced it, so stepping back can say which edit it
//! reverts. An edit that leaves the workflow unchanged (a selection click,
//! a resize) records nothing.

use std::collections::VecDeque;

use workflow_types::Workflow;

use crate::error::{EditorError, Result};
use crate::events::ChangeCause;

/// A workflow pulled back out of the history and the edit it crossed
#[derive(Debug, Clone, PartialEq)]
pub struct Restored {
    pub workflow: Workflow,
    /// The edit undone or redone by this step
    pub cause: ChangeCause,
}

#[derive(Debug)]
struct Entry {
    /// `None` for the base state the session started from
    cause: Option<ChangeCause>,
    snapshot: Vec<u8>,
}

/// Bounded edit history with a cursor on the current state
#[derive(Debug)]
pub struct History {
    entries: VecDeque<Entry>,
    cursor: usize,
    depth: usize,
}

impl History {
    /// History keeping at most `depth` states (minimum 1)
    pub fn new(depth: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            depth: depth.max(1),
        }
    }

    /// Forget everything and start from `workflow`
    pub fn reset(&mut self, workflow: &Workflow) -> Result<()> {
        let snapshot = compress(workflow)?;
        self.entries.clear();
        self.entries.push_back(Entry { cause: None, snapshot });
        self.cursor = 0;
        Ok(())
    }

    /// Record `workflow` as produced by `cause`
    ///
    /// Drops any redo tail. Returns `false` without recording when the
    /// workflow equals the current state.
    pub fn record(&mut self, workflow: &Workflow, cause: ChangeCause) -> Result<bool> {
        let snapshot = compress(workflow)?;
        if self.entries.get(self.cursor).is_some_and(|e| e.snapshot == snapshot) {
            log::trace!("History: {:?} left the workflow unchanged", cause);
            return Ok(false);
        }

        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push_back(Entry {
            cause: Some(cause),
            snapshot,
        });
        self.cursor = self.entries.len() - 1;

        if self.entries.len() > self.depth {
            let excess = self.entries.len() - self.depth;
            self.entries.drain(..excess);
            self.cursor -= excess;
            // The oldest kept state becomes the new base
            if let Some(base) = self.entries.front_mut() {
                base.cause = None;
            }
        }
        Ok(true)
    }

    /// The edit an `undo` would revert
    pub fn undo_cause(&self) -> Option<&ChangeCause> {
        if self.can_undo() {
            self.entries[self.cursor].cause.as_ref()
        } else {
            None
        }
    }

    /// The edit a `redo` would reapply
    pub fn redo_cause(&self) -> Option<&ChangeCause> {
        if self.can_redo() {
            self.entries[self.cursor + 1].cause.as_ref()
        } else {
            None
        }
    }

    /// Step back over the current edit
    pub fn undo(&mut self) -> Option<Result<Restored>> {
        let cause = self.undo_cause()?.clone();
        self.cursor -= 1;
        Some(self.restore(self.cursor).map(|workflow| Restored { workflow, cause }))
    }

    /// Step forward over the next edit
    pub fn redo(&mut self) -> Option<Result<Restored>> {
        let cause = self.redo_cause()?.clone();
        self.cursor += 1;
        Some(self.restore(self.cursor).map(|workflow| Restored { workflow, cause }))
    }

    pub fn current(&self) -> Option<Result<Workflow>> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.restore(self.cursor))
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Number of stored states, base included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    /// Total bytes held by all snapshots
    pub fn compressed_size(&self) -> usize {
        self.entries.iter().map(|e| e.snapshot.len()).sum()
    }

    fn restore(&self, index: usize) -> Result<Workflow> {
        let json = zstd::decode_all(&self.entries[index].snapshot[..])
            .map_err(|e| EditorError::Compression(e.to_string()))?;
        Ok(serde_json::from_slice(&json)?)
    }
}

fn compress(workflow: &Workflow) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(workflow)?;
    zstd::encode_all(&json[..], zstd::DEFAULT_COMPRESSION_LEVEL)
        .map_err(|e| EditorError::Compression(e.to_string()))
}
