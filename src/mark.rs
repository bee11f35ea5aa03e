// src/mark.rs - Selection and clipboard
//
// The mark refers into one file's chain without owning any line. Every
// applied change is delivered through `on_change`, which moves anchor and
// touch off lines that left the chain.

use crate::error::MarkError;
use crate::event::{ChainChange, EditListener};
use crate::file::{FileId, LineStore};
use crate::line::{LineFlags, LineId};
use crate::redo::{Edit, Range};
use crate::width::{self, ColumnPolicy, Locate};

/// Text captured by copy or cut
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clip {
    pub lines: Vec<Vec<u8>>,
    /// Rectangular column block rather than whole lines
    pub block: bool,
}

#[derive(Debug, Default)]
pub struct Mark {
    file: Option<FileId>,
    anchor: LineId,
    touch: LineId,
    anchor_column: usize,
    touch_column: usize,
    block: bool,
    clip: Option<Clip>,
    policy: ColumnPolicy,
}

impl Mark {
    pub fn new(policy: ColumnPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn file(&self) -> Option<FileId> {
        self.file
    }

    pub fn is_block(&self) -> bool {
        self.file.is_some() && self.block
    }

    pub fn clip(&self) -> Option<&Clip> {
        self.clip.as_ref()
    }

    pub fn anchor(&self) -> Option<LineId> {
        self.file.map(|_| self.anchor)
    }

    pub fn touch(&self) -> Option<LineId> {
        self.file.map(|_| self.touch)
    }

    /// Start a new mark. `column` selects block mode.
    pub fn set(
        &mut self,
        store: &mut LineStore,
        line: LineId,
        column: Option<usize>,
    ) -> Result<(), MarkError> {
        markable(store, line)?;
        if self.file == Some(store.id()) {
            self.paint(store, false);
        }

        self.file = Some(store.id());
        self.anchor = line;
        self.touch = line;
        self.block = column.is_some();
        self.anchor_column = column.unwrap_or(0);
        self.touch_column = self.anchor_column;
        self.paint(store, true);
        Ok(())
    }

    /// Move the touch end of the mark.
    pub fn extend(
        &mut self,
        store: &mut LineStore,
        line: LineId,
        column: Option<usize>,
    ) -> Result<(), MarkError> {
        match self.file {
            None => return Err(MarkError::NoMark),
            Some(file) if file != store.id() => return Err(MarkError::OtherFile),
            Some(_) => {}
        }
        markable(store, line)?;

        self.paint(store, false);
        self.touch = line;
        if let Some(column) = column {
            self.touch_column = column;
        }
        self.paint(store, true);
        Ok(())
    }

    /// Drop the mark, unflagging its lines. The clip is kept.
    pub fn clear(&mut self, store: &mut LineStore) {
        if self.file == Some(store.id()) {
            self.paint(store, false);
        }
        self.forget();
    }

    /// Marked range in chain order, or None when unset or in another file.
    pub fn range(&self, store: &LineStore) -> Option<Range> {
        if self.file != Some(store.id()) || !store.is_live(self.anchor) || !store.is_live(self.touch) {
            return None;
        }
        let rank = |id: LineId| {
            if id == store.top() {
                Some(0)
            } else {
                store.get_row(id).map(|row| row + 1)
            }
        };
        let (anchor, touch) = (rank(self.anchor)?, rank(self.touch)?);
        Some(if anchor <= touch {
            Range {
                head: self.anchor,
                tail: self.touch,
            }
        } else {
            Range {
                head: self.touch,
                tail: self.anchor,
            }
        })
    }

    /// Block column bounds `[left, right)`
    pub fn columns(&self) -> Option<(usize, usize)> {
        if !self.is_block() {
            return None;
        }
        let left = self.anchor_column.min(self.touch_column);
        let right = self.anchor_column.max(self.touch_column) + 1;
        Some((left, right))
    }

    /// Capture the marked text into the clip. Returns the number of lines.
    pub fn copy(&mut self, store: &LineStore) -> Result<usize, MarkError> {
        let range = self.body_range(store)?;
        let ids = store.range_ids(range);
        let lines: Vec<Vec<u8>> = match self.columns() {
            Some((left, right)) => ids
                .iter()
                .map(|&id| slice_columns(store.text(id).unwrap_or_default(), left, right, self.policy))
                .collect(),
            None => ids
                .iter()
                .map(|&id| store.text(id).unwrap_or_default().to_vec())
                .collect(),
        };

        let count = lines.len();
        log::debug!("mark: copied {} lines (block={})", count, self.block);
        self.clip = Some(Clip {
            lines,
            block: self.block,
        });
        Ok(count)
    }

    /// Copy, then remove the marked text as one record and drop the mark.
    pub fn cut(&mut self, store: &mut LineStore) -> Result<ChainChange, MarkError> {
        self.copy(store)?;
        let range = self.body_range(store)?;

        let edit = match self.columns() {
            None => Edit::Remove { old: range },
            Some((left, right)) => {
                let mut fresh = Vec::new();
                for id in store.range_ids(range) {
                    let Some(line) = store.line(id) else { continue };
                    let (delim, flags) = (line.delim, line.flags - LineFlags::MARKED);
                    let text = remove_columns(store.text(id).unwrap_or_default(), left, right, self.policy);
                    fresh.push(store.new_line(&text, delim, flags));
                }
                let new = store.chain_detached(&fresh).ok_or(MarkError::NoMark)?;
                Edit::Replace { old: range, new }
            }
        };

        self.paint(store, false);
        match store.commit_edit(edit) {
            Ok(change) => {
                self.forget();
                Ok(change)
            }
            Err(err) => {
                self.paint(store, true);
                Err(err.into())
            }
        }
    }

    /// Insert the clip at `line`/`column` as one record. Whole-line clips go
    /// after `line` and become the new mark.
    pub fn paste(
        &mut self,
        store: &mut LineStore,
        line: LineId,
        column: usize,
    ) -> Result<ChainChange, MarkError> {
        let clip = self.clip.clone().ok_or(MarkError::NoClip)?;
        if !store.is_live(line) {
            return Err(MarkError::Offscreen);
        }
        if clip.block {
            self.paste_block(store, &clip, line, column)
        } else {
            self.paste_lines(store, &clip, line)
        }
    }

    fn paste_lines(
        &mut self,
        store: &mut LineStore,
        clip: &Clip,
        line: LineId,
    ) -> Result<ChainChange, MarkError> {
        let after = if line == store.end() {
            store.prev(line).ok_or(MarkError::Offscreen)?
        } else {
            line
        };
        let delim = store.default_delimiter();

        // A final line without terminator gets one before lines follow it
        let mut fresh = Vec::with_capacity(clip.lines.len() + 1);
        let mut old = None;
        if let Some(prior) = store.line(after).filter(|prior| after != store.top() && prior.delim.is_none()) {
            let flags = prior.flags - LineFlags::MARKED;
            fresh.push(store.copy_line(after, delim, flags)?);
            old = Some(Range::single(after));
        }
        let first = fresh.len();
        for text in &clip.lines {
            fresh.push(store.new_line(text, delim, LineFlags::empty()));
        }
        let new = store.chain_detached(&fresh).ok_or(MarkError::NoClip)?;
        let edit = match old {
            Some(old) => Edit::Replace { old, new },
            None => Edit::Insert { after, new },
        };

        let marked_here = self.file == Some(store.id());
        if marked_here {
            self.paint(store, false);
        }
        let change = match store.commit_edit(edit) {
            Ok(change) => change,
            Err(err) => {
                if marked_here {
                    self.paint(store, true);
                }
                return Err(err.into());
            }
        };

        self.file = Some(store.id());
        self.anchor = fresh[first];
        self.touch = new.tail;
        self.block = false;
        self.paint(store, true);
        Ok(change)
    }

    fn paste_block(
        &mut self,
        store: &mut LineStore,
        clip: &Clip,
        line: LineId,
        column: usize,
    ) -> Result<ChainChange, MarkError> {
        let mut targets = Vec::new();
        let mut cursor = if line == store.top() { store.next(line) } else { Some(line) };
        while let Some(id) = cursor {
            if id == store.end() || targets.len() == clip.lines.len() {
                break;
            }
            targets.push(id);
            cursor = store.next(id);
        }

        let default = store.default_delimiter();
        let appending = targets.len() < clip.lines.len();
        let mut fresh = Vec::with_capacity(clip.lines.len());
        for (index, &id) in targets.iter().enumerate() {
            let Some(target) = store.line(id) else { continue };
            let mut delim = target.delim;
            if appending && index + 1 == targets.len() && delim.is_none() {
                delim = default;
            }
            let flags = target.flags - LineFlags::MARKED;
            let text = insert_at_column(
                store.text(id).unwrap_or_default(),
                column,
                &clip.lines[index],
                self.policy,
            );
            fresh.push(store.new_line(&text, delim, flags));
        }
        for row in &clip.lines[targets.len()..] {
            let text = insert_at_column(b"", column, row, self.policy);
            fresh.push(store.new_line(&text, default, LineFlags::empty()));
        }

        let new = store.chain_detached(&fresh).ok_or(MarkError::NoClip)?;
        let edit = match (targets.first(), targets.last()) {
            (Some(&head), Some(&tail)) => Edit::Replace {
                old: Range { head, tail },
                new,
            },
            _ => {
                let after = store.prev(store.end()).ok_or(MarkError::Offscreen)?;
                Edit::Insert { after, new }
            }
        };
        Ok(store.commit_edit(edit)?)
    }

    /// Marked range without the sentinels
    fn body_range(&self, store: &LineStore) -> Result<Range, MarkError> {
        let range = match self.file {
            None => return Err(MarkError::NoMark),
            Some(file) if file != store.id() => return Err(MarkError::OtherFile),
            Some(_) => self.range(store).ok_or(MarkError::Offscreen)?,
        };
        let head = if range.head == store.top() {
            store.next(range.head).ok_or(MarkError::NoMark)?
        } else {
            range.head
        };
        if head == store.end() || store.get_row(head) > store.get_row(range.tail) {
            return Err(MarkError::NoMark);
        }
        Ok(Range {
            head,
            tail: range.tail,
        })
    }

    fn paint(&self, store: &mut LineStore, on: bool) {
        let Some(range) = self.range(store) else { return };
        for id in store.range_ids(range) {
            let protected = store.line(id).is_none_or(|line| line.is_protected());
            if !protected || !on {
                store.set_flag(id, LineFlags::MARKED, on);
            }
        }
    }

    fn forget(&mut self) {
        self.file = None;
        self.block = false;
        self.anchor = LineId::default();
        self.touch = LineId::default();
    }
}

impl EditListener for Mark {
    fn on_change(&mut self, store: &mut LineStore, change: &ChainChange) {
        if self.file != Some(change.file) {
            return;
        }
        for &id in &change.removed {
            store.set_flag(id, LineFlags::MARKED, false);
        }

        let anchor = change.relocate(self.anchor).unwrap_or(self.anchor);
        let touch = change.relocate(self.touch).unwrap_or(self.touch);
        if !store.is_live(anchor) || !store.is_live(touch) {
            log::debug!("mark: dropped, no surviving line");
            self.forget();
            return;
        }
        self.anchor = anchor;
        self.touch = touch;
        self.paint(store, true);
    }

    fn on_file_closed(&mut self, file: FileId) {
        if self.file == Some(file) {
            self.forget();
        }
    }
}

fn markable(store: &LineStore, line: LineId) -> Result<(), MarkError> {
    match store.line(line) {
        Some(_) if !store.is_live(line) => Err(MarkError::Offscreen),
        Some(target) if target.is_protected() => Err(MarkError::Protected),
        Some(_) => Ok(()),
        None => Err(MarkError::Offscreen),
    }
}

/// Columns `[left, right)` of `bytes`, blank-padded to the full width.
fn slice_columns(bytes: &[u8], left: usize, right: usize, policy: ColumnPolicy) -> Vec<u8> {
    let start = width::offset_of(bytes, left, policy);
    let end = width::offset_of(bytes, right, policy).max(start);
    let mut piece = bytes[start..end].to_vec();
    let have = width::width(&piece, policy);
    let want = right - left;
    if have < want {
        piece.resize(piece.len() + want - have, b' ');
    }
    piece
}

fn remove_columns(bytes: &[u8], left: usize, right: usize, policy: ColumnPolicy) -> Vec<u8> {
    let start = width::offset_of(bytes, left, policy);
    let end = width::offset_of(bytes, right, policy).max(start);
    [&bytes[..start], &bytes[end..]].concat()
}

fn insert_at_column(bytes: &[u8], column: usize, piece: &[u8], policy: ColumnPolicy) -> Vec<u8> {
    match width::locate(bytes, column, policy) {
        Locate::At(offset) => [&bytes[..offset], piece, &bytes[offset..]].concat(),
        Locate::Past { missing, .. } => {
            let mut text = bytes.to_vec();
            text.resize(text.len() + missing, b' ');
            text.extend_from_slice(piece);
            text
        }
    }
}
