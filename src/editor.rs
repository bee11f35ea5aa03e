// src/editor.rs - Editing session coordinator
//
// Owns the open files, the view and the mark. Every operation that touches a
// chain commits the pending line edit first, and every resulting change is
// delivered to the mark and then the view.

use crate::config::EditorConfig;
use crate::error::EditError;
use crate::event::{ChainChange, EditEvent, EditListener};
use crate::file::{self, FileId, LineEnding, LineStore};
use crate::line::{LineFlags, LineId};
use crate::mark::Mark;
use crate::message::{Message, Severity};
use crate::redo::{Edit, Range};
use crate::view::View;
use crate::width;
use slotmap::SlotMap;
use std::path::{Path, PathBuf};

pub struct Editor {
    config: EditorConfig,
    files: SlotMap<FileId, LineStore>,
    /// Open order
    ring: Vec<FileId>,
    view: View,
    mark: Mark,
    /// Autosave artifacts found in the configured directory at startup
    leftovers: Vec<PathBuf>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        let policy = config.column_policy();
        let leftovers = match config.autosave_dir.as_deref() {
            Some(dir) => scan_autosaves(dir),
            None => Vec::new(),
        };
        Self {
            view: View::new(policy, config.buffer_block),
            mark: Mark::new(policy),
            leftovers,
            config,
            files: SlotMap::with_key(),
            ring: Vec::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Artifacts of interrupted saves found in the autosave directory when
    /// the editor started.
    pub fn autosave_leftovers(&self) -> &[PathBuf] {
        &self.leftovers
    }

    /// Open files in open order
    pub fn files(&self) -> &[FileId] {
        &self.ring
    }

    pub fn file(&self, file: FileId) -> Option<&LineStore> {
        self.files.get(file)
    }

    pub fn current_file(&self) -> Option<FileId> {
        self.view.file()
    }

    /// The file under the cursor
    pub fn store(&self) -> Option<&LineStore> {
        self.files.get(self.view.file()?)
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn mark(&self) -> &Mark {
        &self.mark
    }

    /// Open `path` (or switch to it if already open) and make it current.
    pub fn open(&mut self, path: impl AsRef<Path>) -> FileId {
        let path = path.as_ref();
        if let Some(&file) = self.ring.iter().find(|&&id| self.files[id].path() == path) {
            self.activate_file(file);
            return file;
        }
        self.adopt(LineStore::open(path))
    }

    /// Open in-memory content under `name`.
    pub fn open_bytes(&mut self, name: impl AsRef<Path>, data: Vec<u8>) -> FileId {
        self.adopt(LineStore::from_bytes(name.as_ref(), data))
    }

    fn adopt(&mut self, mut store: LineStore) -> FileId {
        let artifact = store.autosave_path(self.config.autosave_dir.as_deref());
        if artifact.is_file() {
            log::warn!("File exists: {}", artifact.display());
            store.put_message(format!("File exists: {}", artifact.display()), Severity::Warning);
        }
        let file = self.files.insert_with_key(|id| {
            let mut store = store;
            store.id = id;
            store
        });
        self.ring.push(file);
        if let Some(store) = self.files.get(file) {
            log::info!(
                "Opened {}: {} lines, {}",
                store.path().display(),
                store.row_count(),
                store.mode()
            );
        }
        self.activate_file(file);
        file
    }

    /// Close `file`, dropping its history. The view moves to the most
    /// recently opened remaining file.
    pub fn close(&mut self, file: FileId) -> bool {
        if !self.files.contains_key(file) {
            return false;
        }
        if self.view.file() == Some(file) {
            self.commit();
        }
        if let Some(mut store) = self.files.remove(file) {
            store.reset();
            log::info!("Closed {}", store.path().display());
        }
        self.ring.retain(|&id| id != file);
        self.publish(EditEvent::FileClosed(file));

        if self.view.file().is_none() {
            if let Some(&next) = self.ring.last() {
                self.activate_file(next);
            }
        }
        true
    }

    pub fn activate_file(&mut self, file: FileId) -> bool {
        if !self.files.contains_key(file) {
            return false;
        }
        if self.view.file() == Some(file) {
            return true;
        }
        self.commit();
        let Some(store) = self.files.get_mut(file) else {
            return false;
        };
        let line = store.cursor_line();
        self.view.attach(store, line);
        self.view.set_column(0);
        true
    }

    pub fn activate_line(&mut self, line: LineId) -> bool {
        let change = {
            let Some((store, view, _)) = self.parts() else {
                return false;
            };
            if !store.is_live(line) || line == store.top() {
                return false;
            }
            view.activate(store, line)
        };
        self.dispatch(change);
        true
    }

    /// Flush the pending line edit. Returns whether a record was made.
    pub fn commit(&mut self) -> bool {
        let change = match self.parts() {
            Some((store, view, _)) => view.commit(store),
            None => None,
        };
        let committed = change.is_some();
        self.dispatch(change);
        committed
    }

    pub fn get_row(&self, line: LineId) -> Option<usize> {
        self.store()?.get_row(line)
    }

    pub fn get_line(&self, row: usize) -> Option<LineId> {
        self.store()?.get_line(row)
    }

    pub fn top_line(&self) -> Option<LineId> {
        Some(self.store()?.top_line())
    }

    /// (file, line, column) of the cursor
    pub fn cursor(&self) -> Option<(FileId, LineId, usize)> {
        let file = self.view.file()?;
        Some((file, self.view.cursor(), self.view.column()))
    }

    pub fn set_column(&mut self, column: usize) {
        self.view.set_column(column);
    }

    /// Cursor line as currently edited
    pub fn active_text(&self) -> &[u8] {
        self.view.active().text()
    }

    pub fn move_cursor_vertical(&mut self, delta: isize) -> bool {
        let change = match self.parts() {
            Some((store, view, _)) => view.move_cursor_vertical(store, delta),
            None => return false,
        };
        self.dispatch(change);
        true
    }

    pub fn insert_char(&mut self, codepoint: u32) -> bool {
        if !self.editable() {
            return false;
        }
        let column = self.view.column();
        let end = self.view.active_mut().insert_char(column, codepoint);
        self.advance_to(end);
        true
    }

    pub fn replace_char(&mut self, codepoint: u32) -> bool {
        if !self.editable() {
            return false;
        }
        let column = self.view.column();
        let end = self.view.active_mut().replace_char(column, codepoint);
        self.advance_to(end);
        true
    }

    pub fn insert_text(&mut self, bytes: &[u8]) -> bool {
        if !self.editable() {
            return false;
        }
        let column = self.view.column();
        let end = self.view.active_mut().insert_text(column, bytes);
        self.advance_to(end);
        true
    }

    /// Delete the unit under the cursor.
    pub fn remove_char(&mut self) -> bool {
        if !self.editable() {
            return false;
        }
        let column = self.view.column();
        self.view.active_mut().remove_char(column)
    }

    /// Delete the unit before the cursor; at column 0 join with the line
    /// above.
    pub fn backspace(&mut self) -> bool {
        let column = self.view.column();
        if column == 0 {
            return self.join_with_previous();
        }
        if !self.editable() {
            return false;
        }

        let active = self.view.active_mut();
        let policy = active.policy();
        if column > width::width(active.text(), policy) {
            self.view.set_column(column - 1);
            return true;
        }
        let offset = active.column_to_offset(column - 1);
        let start = width::width(&active.text()[..offset], policy);
        active.remove_char(start);
        self.view.set_column(start);
        true
    }

    /// Drop the pending line edit, else revert the last record.
    pub fn undo(&mut self) -> bool {
        if self.view.active_mut().undo() {
            return true;
        }
        let change = match self.parts() {
            Some((store, _, _)) => store.undo(),
            None => return false,
        };
        let undone = change.is_some();
        self.dispatch(change);
        undone
    }

    pub fn redo(&mut self) -> bool {
        self.commit();
        let change = match self.parts() {
            Some((store, _, _)) => store.redo(),
            None => return false,
        };
        let redone = change.is_some();
        self.dispatch(change);
        redone
    }

    /// Split the cursor line at the cursor column. The cursor moves to the
    /// start of the second half.
    pub fn split_line(&mut self) -> bool {
        self.commit();
        if self.at_end() {
            return self.insert_line();
        }
        if !self.editable() {
            return false;
        }
        let column = self.view.column();
        let result = {
            let Some((store, view, _)) = self.parts() else {
                return false;
            };
            let cursor = view.cursor();
            let Some(line) = store.line(cursor) else {
                return false;
            };
            let (delim, flags) = (line.delim, line.flags - LineFlags::MARKED);
            let text = store.text(cursor).unwrap_or_default().to_vec();
            let offset = width::offset_of(&text, column, view.active().policy());

            let default = store.default_delimiter();
            let left = store.new_line(&text[..offset], default, flags);
            let right = store.new_line(&text[offset..], delim, flags);
            let new = store.chain_detached(&[left, right]);
            new.map(|new| {
                store
                    .commit_edit(Edit::Replace {
                        old: Range::single(cursor),
                        new,
                    })
                    .map(|change| (change, right))
            })
        };
        self.finish(result, 0)
    }

    /// Append the next line to the cursor line.
    pub fn join_line(&mut self) -> bool {
        self.commit();
        if !self.editable() {
            return false;
        }
        let column = self.view.column();
        let result = {
            let Some((store, view, _)) = self.parts() else {
                return false;
            };
            let cursor = view.cursor();
            let Some(next) = store.next(cursor).filter(|&next| store.is_body(next)) else {
                return false;
            };
            let (Some(line), Some(below)) = (store.line(cursor), store.line(next)) else {
                return false;
            };
            if below.is_protected() {
                store.put_message("Protected", Severity::Warning);
                return false;
            }
            let (delim, flags) = (below.delim, line.flags - LineFlags::MARKED);
            let text = [
                store.text(cursor).unwrap_or_default(),
                store.text(next).unwrap_or_default(),
            ]
            .concat();
            let joined = store.new_line(&text, delim, flags);
            Some(
                store
                    .commit_edit(Edit::Replace {
                        old: Range {
                            head: cursor,
                            tail: next,
                        },
                        new: Range::single(joined),
                    })
                    .map(|change| (change, joined)),
            )
        };
        self.finish(result, column)
    }

    /// Insert an empty line after the cursor and move onto it. A final line
    /// without terminator gets the default one first.
    pub fn insert_line(&mut self) -> bool {
        self.commit();
        let result = {
            let Some((store, view, _)) = self.parts() else {
                return false;
            };
            if store.is_protected() {
                store.put_message("Read-only file", Severity::Warning);
                return false;
            }
            let cursor = view.cursor();
            let after = if cursor == store.end() {
                store.prev(cursor).unwrap_or(store.top())
            } else {
                cursor
            };
            let delim = store.default_delimiter();

            let mut fresh = Vec::with_capacity(2);
            let mut old = None;
            if after != store.top() {
                if let Some(line) = store.line(after).filter(|line| line.delim.is_none()) {
                    let flags = line.flags - LineFlags::MARKED;
                    if let Ok(copy) = store.copy_line(after, delim, flags) {
                        fresh.push(copy);
                        old = Some(Range::single(after));
                    }
                }
            }
            let blank = store.new_line(b"", delim, LineFlags::empty());
            fresh.push(blank);
            store.chain_detached(&fresh).map(|new| {
                let edit = match old {
                    Some(old) => Edit::Replace { old, new },
                    None => Edit::Insert { after, new },
                };
                store.commit_edit(edit).map(|change| (change, blank))
            })
        };
        self.finish(result, 0)
    }

    /// Remove the cursor line; the cursor moves to the line below.
    pub fn delete_line(&mut self) -> bool {
        self.commit();
        if !self.editable() {
            return false;
        }
        let column = self.view.column();
        let result = {
            let Some((store, view, _)) = self.parts() else {
                return false;
            };
            let cursor = view.cursor();
            let below = store.next(cursor).unwrap_or(store.end());
            Some(
                store
                    .commit_edit(Edit::Remove {
                        old: Range::single(cursor),
                    })
                    .map(|change| (change, below)),
            )
        };
        self.finish(result, column)
    }

    /// Start a line mark at the cursor, or extend the one in this file.
    pub fn mark_line(&mut self) -> bool {
        self.place_mark(false)
    }

    /// Start a column block mark at the cursor, or extend the one in this
    /// file.
    pub fn mark_block(&mut self) -> bool {
        self.place_mark(true)
    }

    pub fn clear_mark(&mut self) {
        if let Some(store) = self.mark.file().and_then(|file| self.files.get_mut(file)) {
            self.mark.clear(store);
        }
    }

    pub fn copy(&mut self) -> bool {
        self.commit();
        let Some(file) = self.mark.file() else {
            self.notify("No mark", Severity::Warning);
            return false;
        };
        let Some(store) = self.files.get_mut(file) else {
            return false;
        };
        match self.mark.copy(store) {
            Ok(_) => true,
            Err(err) => {
                store.put_message(err.to_string(), Severity::Warning);
                false
            }
        }
    }

    pub fn cut(&mut self) -> bool {
        self.commit();
        let Some(file) = self.mark.file() else {
            self.notify("No mark", Severity::Warning);
            return false;
        };
        let Some(store) = self.files.get_mut(file) else {
            return false;
        };
        match self.mark.cut(store) {
            Ok(change) => {
                self.dispatch(Some(change));
                true
            }
            Err(err) => {
                store.put_message(err.to_string(), Severity::Warning);
                false
            }
        }
    }

    /// Insert the clip at the cursor.
    pub fn paste(&mut self) -> bool {
        self.commit();
        let Some(file) = self.view.file() else {
            return false;
        };
        let whole_lines = self.mark.clip().is_some_and(|clip| !clip.block);
        if whole_lines && self.mark.file().is_some_and(|marked| marked != file) {
            self.clear_mark();
        }

        let result = {
            let Some((store, view, mark)) = self.parts() else {
                return false;
            };
            match mark.paste(store, view.cursor(), view.column()) {
                Ok(change) => Ok(change),
                Err(err) => {
                    store.put_message(err.to_string(), Severity::Warning);
                    Err(())
                }
            }
        };
        match result {
            Ok(change) => {
                self.dispatch(Some(change));
                true
            }
            Err(()) => false,
        }
    }

    pub fn set_line_ending_mode(&mut self, ending: LineEnding) -> bool {
        self.commit();
        let result = match self.parts() {
            Some((store, _, _)) => store.set_line_ending_mode(ending),
            None => return false,
        };
        match result {
            Ok(change) => {
                self.dispatch(change);
                true
            }
            Err(err) => self.refuse(err),
        }
    }

    /// Save the current file through its autosave artifact.
    pub fn save(&mut self) -> bool {
        self.commit();
        let dir = self.config.autosave_dir.clone();
        match self.parts() {
            Some((store, _, _)) => store.atomic_save(dir.as_deref()),
            None => false,
        }
    }

    /// Queued messages of the current file
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.store().into_iter().flat_map(|store| store.messages())
    }

    pub fn take_message(&mut self) -> Option<Message> {
        let file = self.view.file()?;
        self.files.get_mut(file)?.take_message()
    }

    fn parts(&mut self) -> Option<(&mut LineStore, &mut View, &mut Mark)> {
        let file = self.view.file()?;
        let store = self.files.get_mut(file)?;
        Some((store, &mut self.view, &mut self.mark))
    }

    fn publish(&mut self, event: EditEvent) {
        let mut store = match &event {
            EditEvent::Changed(change) => self.files.get_mut(change.file),
            EditEvent::FileClosed(_) => None,
        };
        let listeners: [&mut dyn EditListener; 2] = [&mut self.mark, &mut self.view];
        for listener in listeners {
            listener.on_event(store.as_deref_mut(), &event);
        }
    }

    fn dispatch(&mut self, change: Option<ChainChange>) {
        if let Some(change) = change {
            self.publish(EditEvent::Changed(change));
        }
    }

    /// Deliver a line operation's change and put the cursor on `target`.
    fn finish(&mut self, result: Option<Result<(ChainChange, LineId), EditError>>, column: usize) -> bool {
        match result {
            Some(Ok((change, target))) => {
                if let Some((store, view, _)) = self.parts() {
                    view.attach(store, target);
                    view.set_column(column);
                }
                self.dispatch(Some(change));
                true
            }
            Some(Err(err)) => self.refuse(err),
            None => false,
        }
    }

    /// Report a refused edit. Structural failures go through the alert path
    /// and the cursor is put back on a line known to be in the chain.
    fn refuse(&mut self, err: EditError) -> bool {
        let Some((store, view, _)) = self.parts() else {
            return false;
        };
        match err {
            EditError::Protected | EditError::ReadOnly => {
                store.put_message(err.to_string(), Severity::Warning);
            }
            _ => {
                log::error!("edit refused on {}: {}", store.path().display(), err);
                store.put_message(err.to_string(), Severity::Error);
                let line = store.cursor_line();
                view.attach(store, line);
            }
        }
        false
    }

    fn notify(&mut self, text: &str, severity: Severity) {
        if let Some((store, _, _)) = self.parts() {
            store.put_message(text, severity);
        }
    }

    /// Whether the cursor line may be edited; posts the reason when not.
    fn editable(&mut self) -> bool {
        let Some((store, view, _)) = self.parts() else {
            return false;
        };
        if store.is_protected() {
            store.put_message("Read-only file", Severity::Warning);
            return false;
        }
        let protected = store
            .line(view.cursor())
            .is_none_or(|line| line.is_protected());
        if protected {
            store.put_message("Protected", Severity::Warning);
            return false;
        }
        true
    }

    fn at_end(&self) -> bool {
        self.store()
            .is_some_and(|store| store.end() == self.view.cursor())
    }

    fn advance_to(&mut self, offset: usize) {
        let active = self.view.active();
        let column = width::width(&active.text()[..offset], active.policy());
        self.view.set_column(column);
    }

    fn join_with_previous(&mut self) -> bool {
        self.commit();
        let target = {
            let Some((store, view, _)) = self.parts() else {
                return false;
            };
            if store.is_protected() {
                store.put_message("Read-only file", Severity::Warning);
                return false;
            }
            match store.prev(view.cursor()) {
                Some(prev) if store.is_body(prev) => {
                    let width = width::width(store.text(prev).unwrap_or_default(), view.active().policy());
                    Some((prev, width))
                }
                _ => None,
            }
        };
        let Some((prev, column)) = target else {
            return false;
        };
        self.activate_line(prev);
        self.view.set_column(column);
        self.join_line()
    }

    fn place_mark(&mut self, block: bool) -> bool {
        self.commit();
        let Some(file) = self.view.file() else {
            return false;
        };
        let extending = self.mark.file() == Some(file) && self.mark.is_block() == block;
        if !extending {
            self.clear_mark();
        }

        let Some((store, view, mark)) = self.parts() else {
            return false;
        };
        let column = block.then(|| view.column());
        let result = if extending {
            mark.extend(store, view.cursor(), column)
        } else {
            mark.set(store, view.cursor(), column)
        };
        match result {
            Ok(()) => true,
            Err(err) => {
                store.put_message(err.to_string(), Severity::Warning);
                false
            }
        }
    }
}

fn scan_autosaves(dir: &Path) -> Vec<PathBuf> {
    match file::leftover_autosaves(dir) {
        Ok(found) => {
            for path in &found {
                log::warn!("File exists: {}", path.display());
            }
            found
        }
        Err(err) => {
            log::warn!("Cannot scan autosave directory {}: {}", dir.display(), err);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor(data: &[u8]) -> (Editor, FileId) {
        let mut editor = Editor::default();
        let file = editor.open_bytes("e.txt", data.to_vec());
        (editor, file)
    }

    fn texts(editor: &Editor) -> Vec<String> {
        let store = editor.store().unwrap();
        store
            .body()
            .map(|id| String::from_utf8_lossy(store.text(id).unwrap()).into_owned())
            .collect()
    }

    #[test]
    fn test_concrete_scenario() {
        let (mut editor, _) = editor(b"abc\ndef\n");
        let first = editor.get_line(0).unwrap();
        assert_eq!(editor.cursor().unwrap().1, first);

        editor.set_column(1);
        assert!(editor.replace_char('X' as u32));
        assert_eq!(editor.active_text(), b"aXc");
        assert!(editor.commit());
        assert_eq!(texts(&editor), vec!["aXc", "def"]);
        assert_eq!(editor.store().unwrap().redo_log().applied().len(), 1);

        assert!(editor.undo());
        assert_eq!(texts(&editor), vec!["abc", "def"]);
        let (_, cursor, _) = editor.cursor().unwrap();
        assert_eq!(cursor, first);
        assert_eq!(editor.get_row(cursor), Some(0));
    }

    #[test]
    fn test_typing_moves_column() {
        let (mut editor, _) = editor(b"\n");
        editor.insert_char('日' as u32);
        editor.insert_char('x' as u32);
        assert_eq!(editor.cursor().unwrap().2, 2);
        assert!(editor.backspace());
        assert_eq!(editor.active_text(), "日".as_bytes());
        assert_eq!(editor.cursor().unwrap().2, 1);
    }

    #[test]
    fn test_undo_pending_edit_first() {
        let (mut editor, _) = editor(b"abc\n");
        editor.insert_char('z' as u32);
        assert!(editor.undo());
        assert_eq!(editor.active_text(), b"abc");
        assert!(!editor.store().unwrap().redo_log().can_undo());
        assert!(!editor.undo());
        assert_eq!(editor.take_message().unwrap().text, "Cannot undo");
    }

    #[test]
    fn test_split_and_join() {
        let (mut editor, _) = editor(b"hello world\n");
        editor.set_column(5);
        assert!(editor.split_line());
        assert_eq!(texts(&editor), vec!["hello", " world"]);
        assert_eq!(editor.get_row(editor.cursor().unwrap().1), Some(1));
        assert_eq!(editor.cursor().unwrap().2, 0);

        assert!(editor.backspace());
        assert_eq!(texts(&editor), vec!["hello world"]);
        assert_eq!(editor.cursor().unwrap().2, 5);
        assert!(editor.store().unwrap().verify().is_ok());
    }

    #[test]
    fn test_backspace_at_line_start_on_read_only_file() {
        let mut editor = Editor::default();
        let mut store = LineStore::from_bytes("locked.txt", b"one\ntwo\n".to_vec());
        store.set_protected(true);
        editor.adopt(store);
        editor.move_cursor_vertical(1);
        let (_, before, _) = editor.cursor().unwrap();

        assert!(!editor.backspace());
        let (_, after, column) = editor.cursor().unwrap();
        assert_eq!(after, before);
        assert_eq!(editor.get_row(after), Some(1));
        assert_eq!(column, 0);
        assert_eq!(editor.take_message().unwrap().text, "Read-only file");
        assert_eq!(texts(&editor), vec!["one", "two"]);
    }

    #[test]
    fn test_insert_line_fixes_unterminated_final_line() {
        let (mut editor, _) = editor(b"a\nb");
        editor.move_cursor_vertical(1);
        assert!(editor.insert_line());
        assert_eq!(editor.store().unwrap().to_bytes(), b"a\nb\n\n");
        assert_eq!(editor.get_row(editor.cursor().unwrap().1), Some(2));
    }

    #[test]
    fn test_delete_line_moves_down() {
        let (mut editor, _) = editor(b"a\nb\nc\n");
        editor.move_cursor_vertical(1);
        assert!(editor.delete_line());
        assert_eq!(texts(&editor), vec!["a", "c"]);
        let cursor = editor.cursor().unwrap().1;
        assert_eq!(editor.store().unwrap().text(cursor), Some(&b"c"[..]));
    }

    #[test]
    fn test_edit_on_end_sentinel_refused() {
        let (mut editor, _) = editor(b"a\n");
        editor.move_cursor_vertical(5);
        assert!(!editor.insert_char('x' as u32));
        assert_eq!(editor.take_message().unwrap().text, "Protected");
    }

    #[test]
    fn test_read_only_file() {
        let mut editor = Editor::default();
        let mut store = LineStore::from_bytes("ro.txt", b"a\n".to_vec());
        store.set_protected(true);
        editor.adopt(store);
        assert!(!editor.insert_char('x' as u32));
        assert_eq!(editor.take_message().unwrap().text, "Read-only file");
    }

    #[test]
    fn test_mark_cut_paste_between_files() {
        let (mut editor, first) = editor(b"one\ntwo\n");
        assert!(editor.mark_line());
        assert!(editor.cut());
        assert_eq!(texts(&editor), vec!["two"]);
        assert!(editor.mark().file().is_none());

        let second = editor.open_bytes("f.txt", b"x\n".to_vec());
        assert_eq!(editor.current_file(), Some(second));
        assert!(editor.paste());
        assert_eq!(texts(&editor), vec!["x", "one"]);
        assert_eq!(editor.mark().file(), Some(second));

        assert!(editor.close(second));
        assert!(editor.mark().file().is_none());
        assert_eq!(editor.current_file(), Some(first));
    }

    #[test]
    fn test_mark_follows_commit() {
        let (mut editor, _) = editor(b"a\nb\n");
        assert!(editor.mark_line());
        editor.insert_char('z' as u32);
        assert!(editor.commit());
        let cursor = editor.cursor().unwrap().1;
        assert_eq!(editor.mark().anchor(), Some(cursor));
        assert!(editor.store().unwrap().line(cursor).unwrap().is_marked());
    }

    #[test]
    fn test_line_ending_conversion() {
        let (mut editor, _) = editor(b"a\nb\n");
        assert!(editor.set_line_ending_mode(LineEnding::Dos));
        assert_eq!(editor.store().unwrap().to_bytes(), b"a\r\nb\r\n");
        assert!(editor.undo());
        assert_eq!(editor.store().unwrap().to_bytes(), b"a\nb\n");
    }
}
