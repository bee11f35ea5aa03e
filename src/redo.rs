// src/redo.rs - Undo/redo records as exact chain splices
//
// A record keeps the range it spliced out and the range it spliced in. The
// inactive half stays linked to itself and to the neighbours it had, so
// applying a record in either direction is a relink, never a rebuild.

use crate::error::EditError;
use crate::event::{ChainChange, ChangeKind};
use crate::file::{LineEnding, LineStore};
use crate::line::{LineFlags, LineId, Place};
use crate::message::Severity;

/// Inclusive run of linked lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub head: LineId,
    pub tail: LineId,
}

impl Range {
    pub fn single(line: LineId) -> Self {
        Self {
            head: line,
            tail: line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedoRecord {
    pub removed: Option<Range>,
    pub inserted: Option<Range>,
    /// Spans the whole body; the file mode is recomputed when applied
    whole_body: bool,
}

/// A pending change to the chain. `new` ranges must be detached lines built
/// with `LineStore::new_line` and linked with `LineStore::chain_detached`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Replace { old: Range, new: Range },
    Insert { after: LineId, new: Range },
    Remove { old: Range },
}

/// `redo_stack` holds applied records (popped by undo), `undo_stack` holds
/// undone ones (popped by redo).
#[derive(Debug, Default)]
pub struct RedoLog {
    redo_stack: Vec<RedoRecord>,
    undo_stack: Vec<RedoRecord>,
}

impl RedoLog {
    pub fn can_undo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn applied(&self) -> &[RedoRecord] {
        &self.redo_stack
    }

    pub fn undone(&self) -> &[RedoRecord] {
        &self.undo_stack
    }

    /// The half of each record that is out of the chain
    pub(crate) fn inactive_halves(&self) -> impl Iterator<Item = Range> + '_ {
        let applied = self.redo_stack.iter().filter_map(|record| record.removed);
        let undone = self.undo_stack.iter().filter_map(|record| record.inserted);
        applied.chain(undone)
    }
}

impl LineStore {
    /// Splice `edit` into the chain and record it. The new lines are consumed
    /// even when the edit is refused.
    pub fn commit_edit(&mut self, edit: Edit) -> Result<ChainChange, EditError> {
        let (old, new) = match edit {
            Edit::Replace { old, new } => (Some(old), Some(new)),
            Edit::Insert { new, .. } => (None, Some(new)),
            Edit::Remove { old } => (Some(old), None),
        };

        if let Err(err) = self.validate(edit, old, new) {
            if let Some(new) = new {
                if self.check_range(new, Place::Detached).is_ok() {
                    self.discard_detached(new);
                }
            }
            return Err(err);
        }

        if let Edit::Insert { after, new } = edit {
            self.lines[new.head].prev = Some(after);
        }

        let whole_body = match old {
            Some(old) => self.prev(old.head) == Some(self.top()) && self.next(old.tail) == Some(self.end()),
            None => self.row_count() == 0,
        };
        let record = RedoRecord {
            removed: old,
            inserted: new,
            whole_body,
        };

        let change = self.swap(ChangeKind::Commit, record.removed, record.inserted, whole_body)?;
        self.redo.redo_stack.push(record);

        for record in std::mem::take(&mut self.redo.undo_stack) {
            if let Some(inserted) = record.inserted {
                self.free_range(inserted);
            }
        }
        self.changed = true;
        log::debug!(
            "commit: -{} +{} lines, {} records",
            change.removed.len(),
            change.inserted.len(),
            self.redo.redo_stack.len()
        );
        Ok(change)
    }

    /// Revert the last applied record. Posts "Cannot undo" when there is none.
    pub fn undo(&mut self) -> Option<ChainChange> {
        let Some(record) = self.redo.redo_stack.pop() else {
            self.put_message("Cannot undo", Severity::Info);
            return None;
        };
        match self.swap(ChangeKind::Undo, record.inserted, record.removed, record.whole_body) {
            Ok(change) => {
                self.redo.undo_stack.push(record);
                self.changed = self.redo.can_undo();
                log::debug!("undo: {} records left", self.redo.redo_stack.len());
                Some(change)
            }
            Err(err) => {
                self.redo.redo_stack.push(record);
                self.alert("undo", err);
                None
            }
        }
    }

    /// Re-apply the last undone record. Posts "Cannot redo" when there is none.
    pub fn redo(&mut self) -> Option<ChainChange> {
        let Some(record) = self.redo.undo_stack.pop() else {
            self.put_message("Cannot redo", Severity::Info);
            return None;
        };
        match self.swap(ChangeKind::Redo, record.removed, record.inserted, record.whole_body) {
            Ok(change) => {
                self.redo.redo_stack.push(record);
                self.changed = true;
                log::debug!("redo: {} records left", self.redo.undo_stack.len());
                Some(change)
            }
            Err(err) => {
                self.redo.undo_stack.push(record);
                self.alert("redo", err);
                None
            }
        }
    }

    /// Drop all history, freeing the half of each record that is not live.
    pub fn reset(&mut self) {
        for record in std::mem::take(&mut self.redo.redo_stack) {
            if let Some(removed) = record.removed {
                self.free_range(removed);
            }
        }
        for record in std::mem::take(&mut self.redo.undo_stack) {
            if let Some(inserted) = record.inserted {
                self.free_range(inserted);
            }
        }
        self.changed = false;
    }

    /// Rewrite every newline terminator of the body as `ending`, as one
    /// record. NUL runs and a missing final terminator are kept.
    pub fn set_line_ending_mode(&mut self, ending: LineEnding) -> Result<Option<ChainChange>, EditError> {
        if self.is_protected() {
            return Err(EditError::ReadOnly);
        }
        let target = ending.delimiter();
        let body: Vec<LineId> = self.body().collect();
        let needed = body.iter().any(|&id| {
            let delim = self.lines[id].delim;
            delim.is_newline() && delim != target
        });
        if !needed {
            self.mode = self.infer_mode();
            return Ok(None);
        }

        let mut fresh = Vec::with_capacity(body.len());
        for &id in &body {
            let line = &self.lines[id];
            let delim = if line.delim.is_newline() { target } else { line.delim };
            let flags = line.flags - LineFlags::MARKED;
            fresh.push(self.copy_line(id, delim, flags)?);
        }

        let (Some(&first), Some(&last)) = (body.first(), body.last()) else {
            return Ok(None);
        };
        let Some(new) = self.chain_detached(&fresh) else {
            return Ok(None);
        };
        let change = self.commit_edit(Edit::Replace {
            old: Range {
                head: first,
                tail: last,
            },
            new,
        })?;
        log::info!("{}: line endings now {}", self.path().display(), self.mode);
        Ok(Some(change))
    }

    fn validate(&self, edit: Edit, old: Option<Range>, new: Option<Range>) -> Result<(), EditError> {
        if self.is_protected() {
            return Err(EditError::ReadOnly);
        }
        if old.is_none() && new.is_none() {
            return Err(EditError::EmptyEdit);
        }
        if let Some(old) = old {
            self.check_range(old, Place::Live)?;
            let protected = self
                .range_ids(old)
                .into_iter()
                .any(|id| self.lines[id].is_protected());
            if protected {
                return Err(EditError::Protected);
            }
        }
        if let Some(new) = new {
            self.check_range(new, Place::Detached)?;
        }
        if let Edit::Insert { after, .. } = edit {
            if !self.is_live(after) || after == self.end() {
                return Err(EditError::NotInChain);
            }
        }
        Ok(())
    }

    /// Splice `out` away and `into` in at the same place.
    fn swap(
        &mut self,
        kind: ChangeKind,
        out: Option<Range>,
        into: Option<Range>,
        whole_body: bool,
    ) -> Result<ChainChange, EditError> {
        let anchor_range = out.or(into).ok_or(EditError::EmptyEdit)?;
        let after = self
            .prev(anchor_range.head)
            .ok_or_else(|| EditError::Inconsistent("range has no predecessor".into()))?;

        if let Some(out) = out {
            self.check_range(out, Place::Live)?;
        }
        if let Some(into) = into {
            let ids = self.range_ids(into);
            if ids.last() != Some(&into.tail) || ids.iter().any(|&id| self.lines[id].place == Place::Live) {
                return Err(EditError::AlreadyLinked);
            }
        }

        let removed = out.map(|range| self.range_ids(range)).unwrap_or_default();
        let inserted = into.map(|range| self.range_ids(range)).unwrap_or_default();
        let top_hit = removed.contains(&self.top_line());
        let cursor_hit = removed.contains(&self.cursor_line());

        if let Some(out) = out {
            self.splice_remove(out.head, out.tail)?;
        }
        if let Some(into) = into {
            self.splice_insert(after, into.head, into.tail)?;
            if top_hit {
                self.set_top_line(into.head);
            }
            if cursor_hit {
                self.activate(into.head);
            }
        }
        if whole_body {
            self.mode = self.infer_mode();
        }

        Ok(ChainChange {
            file: self.id(),
            kind,
            after,
            removed,
            inserted,
        })
    }

    fn alert(&mut self, what: &str, err: EditError) {
        log::error!("{} failed on {}: {}", what, self.path().display(), err);
        self.put_message(err.to_string(), Severity::Error);
    }
}
