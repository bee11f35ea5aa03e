// src/view.rs - Cursor position and the hot edit buffer

use crate::active::ActiveBuffer;
use crate::event::{ChainChange, EditListener};
use crate::file::{FileId, LineStore};
use crate::line::{LineFlags, LineId};
use crate::message::Severity;
use crate::redo::{Edit, Range};
use crate::width::ColumnPolicy;

#[derive(Debug, Default)]
pub struct View {
    file: Option<FileId>,
    cursor: LineId,
    column: usize,
    active: ActiveBuffer,
}

impl View {
    pub fn new(policy: ColumnPolicy, block: usize) -> Self {
        Self {
            active: ActiveBuffer::new(policy, block),
            ..Self::default()
        }
    }

    pub fn file(&self) -> Option<FileId> {
        self.file
    }

    pub fn cursor(&self) -> LineId {
        self.cursor
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn set_column(&mut self, column: usize) {
        self.column = column;
    }

    pub fn active(&self) -> &ActiveBuffer {
        &self.active
    }

    pub fn active_mut(&mut self) -> &mut ActiveBuffer {
        &mut self.active
    }

    /// Shadow `line` without committing. Falls back to the file's stored
    /// cursor when `line` is not in the chain.
    pub fn attach(&mut self, store: &mut LineStore, line: LineId) {
        let line = if store.is_live(line) && line != store.top() {
            line
        } else {
            store.cursor_line()
        };
        store.activate(line);
        self.file = Some(store.id());
        self.cursor = line;
        let text = store.share_text(line);
        self.active.attach(text);
    }

    /// Forget the file, e.g. after it was closed.
    pub fn detach(&mut self) {
        self.file = None;
        self.cursor = LineId::default();
        self.column = 0;
        self.active.attach(Default::default());
    }

    /// Commit any pending edit, then move to `line`.
    pub fn activate(&mut self, store: &mut LineStore, line: LineId) -> Option<ChainChange> {
        let change = self.commit(store);
        let target = change
            .as_ref()
            .and_then(|change| change.relocate(line))
            .unwrap_or(line);
        self.attach(store, target);
        change
    }

    /// Replace the cursor line with the edited text as one record.
    pub fn commit(&mut self, store: &mut LineStore) -> Option<ChainChange> {
        if self.file != Some(store.id()) {
            return None;
        }
        let text = self.active.get_changed()?.to_vec();

        let Some(line) = store.line(self.cursor) else {
            self.active.undo();
            return None;
        };
        if line.is_protected() || store.is_protected() {
            let reason = if store.is_protected() { "Read-only file" } else { "Protected" };
            store.put_message(reason, Severity::Warning);
            self.active.undo();
            return None;
        }

        let (delim, flags) = (line.delim, line.flags - LineFlags::MARKED);
        let new = store.new_line(&text, delim, flags);
        match store.commit_edit(Edit::Replace {
            old: Range::single(self.cursor),
            new: Range::single(new),
        }) {
            Ok(change) => {
                log::debug!("commit: row {:?}", store.get_row(new));
                self.attach(store, new);
                Some(change)
            }
            Err(err) => {
                log::error!("commit failed: {}", err);
                store.put_message(err.to_string(), Severity::Error);
                self.active.undo();
                let fallback = store.cursor_line();
                self.attach(store, fallback);
                None
            }
        }
    }

    /// Commit, then step up to `delta` lines (negative is up). Stops at the
    /// first body line and at the end sentinel.
    pub fn move_cursor_vertical(&mut self, store: &mut LineStore, delta: isize) -> Option<ChainChange> {
        let change = self.commit(store);
        let mut line = self.cursor;
        for _ in 0..delta.unsigned_abs() {
            let step = if delta < 0 { store.prev(line) } else { store.next(line) };
            match step {
                Some(next) if next != store.top() && store.is_live(next) => line = next,
                _ => break,
            }
        }
        self.attach(store, line);
        change
    }
}

impl EditListener for View {
    fn on_change(&mut self, store: &mut LineStore, change: &ChainChange) {
        if self.file != Some(change.file) {
            return;
        }
        let Some(mut line) = change.relocate(self.cursor) else {
            return;
        };
        if line == store.top() {
            line = store.next(line).unwrap_or(store.end());
        }
        self.attach(store, line);
    }

    fn on_file_closed(&mut self, file: FileId) {
        if self.file == Some(file) {
            self.detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::active::ActiveState;

    fn setup(data: &[u8]) -> (LineStore, View, Vec<LineId>) {
        let mut store = LineStore::from_bytes("v.txt", data.to_vec());
        let lines: Vec<LineId> = store.body().collect();
        let mut view = View::default();
        view.attach(&mut store, lines[0]);
        (store, view, lines)
    }

    #[test]
    fn test_commit_replaces_cursor_line() {
        let (mut store, mut view, lines) = setup(b"abc\ndef\n");
        view.active_mut().replace_char(1, 'X' as u32);
        assert_eq!(view.active().state(), ActiveState::Changed);

        let change = view.commit(&mut store).unwrap();
        assert_eq!(change.removed, vec![lines[0]]);
        assert_eq!(store.text(view.cursor()), Some(&b"aXc"[..]));
        assert_eq!(store.get_row(view.cursor()), Some(0));
        assert_eq!(view.active().state(), ActiveState::Reset);

        // Nothing pending, nothing committed
        assert!(view.commit(&mut store).is_none());
    }

    #[test]
    fn test_commit_on_protected_line() {
        let (mut store, mut view, _) = setup(b"a\n");
        let end = store.end();
        view.attach(&mut store, end);
        view.active_mut().insert_char(0, 'x' as u32);

        assert!(view.commit(&mut store).is_none());
        assert_eq!(store.take_message().unwrap().text, "Protected");
        assert!(view.active().get_changed().is_none());
    }

    #[test]
    fn test_vertical_motion_stops_at_sentinels() {
        let (mut store, mut view, lines) = setup(b"a\nb\nc\n");
        view.move_cursor_vertical(&mut store, 10);
        assert_eq!(view.cursor(), store.end());
        view.move_cursor_vertical(&mut store, -10);
        assert_eq!(view.cursor(), lines[0]);
        view.move_cursor_vertical(&mut store, 2);
        assert_eq!(view.cursor(), lines[2]);
    }

    #[test]
    fn test_motion_commits_pending_edit() {
        let (mut store, mut view, _) = setup(b"a\nb\n");
        view.active_mut().insert_char(1, 'z' as u32);
        let change = view.move_cursor_vertical(&mut store, 1);
        assert!(change.is_some());
        assert_eq!(store.text(store.get_line(0).unwrap()), Some(&b"az"[..]));
        assert_eq!(store.get_row(view.cursor()), Some(1));
    }

    #[test]
    fn test_activate_same_line_after_edit() {
        let (mut store, mut view, lines) = setup(b"a\nb\n");
        view.active_mut().insert_char(0, 'q' as u32);
        view.activate(&mut store, lines[0]);
        assert_eq!(store.get_row(view.cursor()), Some(0));
        assert_eq!(store.text(view.cursor()), Some(&b"qa"[..]));
    }

    #[test]
    fn test_cursor_follows_undo() {
        let (mut store, mut view, lines) = setup(b"a\nb\n");
        view.active_mut().insert_char(0, 'q' as u32);
        view.commit(&mut store);

        let change = store.undo().unwrap();
        view.on_change(&mut store, &change);
        assert_eq!(view.cursor(), lines[0]);
    }
}
