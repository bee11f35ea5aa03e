// src/file/mod.rs - Line chain of one open file
//
// The chain is a slot map of Line nodes with intrusive prev/next links,
// bounded by two protected sentinels. Body rows are numbered from 0 starting
// at the line after the top sentinel; the end sentinel sits at row
// `row_count()`, the top sentinel has no row.

mod parse;
mod write;

pub use write::leftover_autosaves;

use crate::error::EditError;
use crate::line::{Delimiter, Line, LineFlags, LineId, Place};
use crate::message::{Message, Severity};
use crate::pool::{SharedText, TextPool};
use crate::redo::{Range, RedoLog};
use slotmap::SlotMap;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

slotmap::new_key_type! {
    /// Handle of an open file
    pub struct FileId;
}

const TOP_TEXT: &[u8] = b"* * * * Top of file * * * *";
const END_TEXT: &[u8] = b"* * * * End of file * * * *";

/// File-wide line ending classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    None,
    Unix,
    Dos,
    Mix,
    Binary,
}

impl Mode {
    /// Fold one newline delimiter into the inferred mode.
    pub(crate) fn merge(self, delim: Delimiter) -> Mode {
        let seen = if delim.is_dos() { Mode::Dos } else { Mode::Unix };
        match self {
            Mode::None => seen,
            Mode::Binary | Mode::Mix => self,
            current if current == seen => current,
            _ => Mode::Mix,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::None => "NONE",
            Mode::Unix => "UNIX",
            Mode::Dos => "DOS",
            Mode::Mix => "MIX",
            Mode::Binary => "BINARY",
        };
        f.write_str(name)
    }
}

/// Target of a line ending conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Unix,
    Dos,
}

impl LineEnding {
    pub fn delimiter(self) -> Delimiter {
        match self {
            LineEnding::Unix => Delimiter::UNIX,
            LineEnding::Dos => Delimiter::DOS,
        }
    }
}

pub struct LineStore {
    pub(crate) id: FileId,
    path: PathBuf,
    pub(crate) lines: SlotMap<LineId, Line>,
    pub(crate) pool: TextPool,
    top: LineId,
    end: LineId,
    rows: usize,
    pub(crate) mode: Mode,
    pub(crate) changed: bool,
    pub(crate) damaged: bool,
    protect: bool,
    top_line: LineId,
    csr_line: LineId,
    messages: VecDeque<Message>,
    pub(crate) redo: RedoLog,
}

impl LineStore {
    /// An empty file named `path`, holding only the sentinels.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let mut pool = TextPool::new();
        let mut lines = SlotMap::with_key();
        let top_text = pool.alloc(TOP_TEXT);
        let end_text = pool.alloc(END_TEXT);
        let top = lines.insert(Line::new(top_text, Delimiter::UNIX, LineFlags::PROTECTED));
        let end = lines.insert(Line::new(end_text, Delimiter::UNIX, LineFlags::PROTECTED));
        lines[top].next = Some(end);
        lines[top].place = Place::Live;
        lines[end].prev = Some(top);
        lines[end].place = Place::Live;

        Self {
            id: FileId::default(),
            path: path.into(),
            lines,
            pool,
            top,
            end,
            rows: 0,
            mode: Mode::None,
            changed: false,
            damaged: false,
            protect: false,
            top_line: top,
            csr_line: end,
            messages: VecDeque::new(),
            redo: RedoLog::default(),
        }
    }

    /// Parse in-memory content as if it had been read from `path`.
    pub fn from_bytes(path: impl Into<PathBuf>, data: Vec<u8>) -> Self {
        let mut store = Self::new(path);
        if data.is_empty() {
            store.put_message("Empty file", Severity::Info);
        }
        store.parse(data);
        store
    }

    /// Load `path`. Failures never abort: they are queued as messages and the
    /// store continues empty, protected or damaged.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = Self::new(path.clone());

        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                store.put_message("File not found", Severity::Info);
                return store;
            }
            Err(err) => {
                store.put_message(format!("Cannot access file: {}", err), Severity::Error);
                store.protect = true;
                return store;
            }
        };

        if !metadata.is_file() {
            store.put_message("Not a regular file", Severity::Error);
            store.protect = true;
            return store;
        }
        if metadata.permissions().readonly() {
            store.put_message("Read-only file", Severity::Warning);
            store.protect = true;
        }

        let mut data = Vec::with_capacity(metadata.len() as usize);
        let result = File::open(&path).and_then(|mut file| file.read_to_end(&mut data));
        match result {
            Ok(_) if data.is_empty() => store.put_message("Empty file", Severity::Info),
            Ok(_) => {}
            Err(err) => {
                log::error!("Read failure on {}: {}", path.display(), err);
                store.put_message("Read failure", Severity::Error);
                store.damaged = true;
            }
        }
        store.parse(data);
        store
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn is_damaged(&self) -> bool {
        self.damaged
    }

    pub fn is_protected(&self) -> bool {
        self.protect
    }

    pub fn set_protected(&mut self, protect: bool) {
        self.protect = protect;
    }

    /// Mark the content as incomplete, e.g. after a short read. A damaged
    /// store refuses to save.
    pub fn set_damaged(&mut self, damaged: bool) {
        self.damaged = damaged;
    }

    pub fn redo_log(&self) -> &RedoLog {
        &self.redo
    }

    /// Top sentinel
    pub fn top(&self) -> LineId {
        self.top
    }

    /// End sentinel
    pub fn end(&self) -> LineId {
        self.end
    }

    pub fn top_line(&self) -> LineId {
        self.top_line
    }

    pub fn cursor_line(&self) -> LineId {
        self.csr_line
    }

    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.get(id)
    }

    pub fn text(&self, id: LineId) -> Option<&[u8]> {
        self.lines.get(id).map(|line| self.pool.get(line.text))
    }

    /// Handle to a line's text that outlives borrows of the store
    pub fn share_text(&mut self, id: LineId) -> SharedText {
        match self.lines.get(id) {
            Some(line) => {
                let span = line.text;
                self.pool.share(span)
            }
            None => SharedText::default(),
        }
    }

    pub fn next(&self, id: LineId) -> Option<LineId> {
        self.lines.get(id).and_then(|line| line.next)
    }

    pub fn prev(&self, id: LineId) -> Option<LineId> {
        self.lines.get(id).and_then(|line| line.prev)
    }

    pub fn is_live(&self, id: LineId) -> bool {
        self.lines
            .get(id)
            .is_some_and(|line| line.place == Place::Live)
    }

    pub fn is_body(&self, id: LineId) -> bool {
        id != self.top && id != self.end && self.is_live(id)
    }

    /// Body lines in chain order
    pub fn body(&self) -> impl Iterator<Item = LineId> + '_ {
        let mut cursor = self.next(self.top);
        std::iter::from_fn(move || {
            let id = cursor.filter(|&id| id != self.end)?;
            cursor = self.next(id);
            Some(id)
        })
    }

    pub fn get_row(&self, line: LineId) -> Option<usize> {
        if !self.is_live(line) || line == self.top {
            return None;
        }
        if line == self.end {
            return Some(self.rows);
        }
        self.body().position(|id| id == line)
    }

    pub fn get_line(&self, row: usize) -> Option<LineId> {
        if row == self.rows {
            return Some(self.end);
        }
        self.body().nth(row)
    }

    /// Store the cursor of an off-screen file; pulls `top_line` up when the
    /// cursor would be above it.
    pub fn activate(&mut self, line: LineId) -> bool {
        if !self.is_live(line) || line == self.top {
            return false;
        }
        self.csr_line = line;
        if let (Some(top_row), Some(row)) = (self.get_row(self.top_line), self.get_row(line)) {
            if row < top_row {
                self.top_line = line;
            }
        }
        true
    }

    pub fn set_top_line(&mut self, line: LineId) -> bool {
        if !self.is_live(line) {
            return false;
        }
        self.top_line = line;
        true
    }

    pub fn default_delimiter(&self) -> Delimiter {
        if self.mode == Mode::Dos {
            Delimiter::DOS
        } else {
            Delimiter::UNIX
        }
    }

    /// Build a detached line holding a copy of `text`.
    pub fn new_line(&mut self, text: &[u8], delim: Delimiter, flags: LineFlags) -> LineId {
        let span = self.pool.alloc(text);
        self.lines.insert(Line::new(span, delim, flags))
    }

    /// Build a detached line that shares the text of `source`.
    pub fn copy_line(
        &mut self,
        source: LineId,
        delim: Delimiter,
        flags: LineFlags,
    ) -> Result<LineId, EditError> {
        let span = self.lines.get(source).ok_or(EditError::NotInChain)?.text;
        Ok(self.lines.insert(Line::new(span, delim, flags)))
    }

    /// Link detached lines, in order, into a range ready for a commit.
    pub fn chain_detached(&mut self, ids: &[LineId]) -> Option<Range> {
        let (&head, &tail) = (ids.first()?, ids.last()?);
        for pair in ids.windows(2) {
            if let Some(line) = self.lines.get_mut(pair[0]) {
                line.next = Some(pair[1]);
            }
            if let Some(line) = self.lines.get_mut(pair[1]) {
                line.prev = Some(pair[0]);
            }
        }
        Some(Range { head, tail })
    }

    /// Drop detached lines that will never be committed.
    pub fn discard_detached(&mut self, range: Range) {
        for id in self.range_ids(range) {
            if self.lines.get(id).is_some_and(|line| line.place == Place::Detached) {
                self.lines.remove(id);
            }
        }
    }

    pub fn set_flag(&mut self, id: LineId, flag: LineFlags, on: bool) {
        if let Some(line) = self.lines.get_mut(id) {
            line.flags.set(flag, on);
        }
    }

    /// Ids of `range`, following next links from head to tail.
    pub(crate) fn range_ids(&self, range: Range) -> Vec<LineId> {
        let mut ids = Vec::new();
        let mut cursor = Some(range.head);
        while let Some(id) = cursor {
            if !self.lines.contains_key(id) || ids.len() > self.lines.len() {
                break;
            }
            ids.push(id);
            if id == range.tail {
                break;
            }
            cursor = self.lines[id].next;
        }
        ids
    }

    /// Whether `range` is a well-formed head..tail walk where every line is
    /// in `place`.
    pub(crate) fn check_range(&self, range: Range, place: Place) -> Result<usize, EditError> {
        let ids = self.range_ids(range);
        if ids.last() != Some(&range.tail) {
            return Err(EditError::InvalidRange);
        }
        for &id in &ids {
            if self.lines[id].place != place {
                return Err(match place {
                    Place::Live => EditError::NotInChain,
                    _ => EditError::AlreadyLinked,
                });
            }
        }
        Ok(ids.len())
    }

    /// Link `head..=tail` after `after`. Returns the number of lines linked.
    pub(crate) fn splice_insert(
        &mut self,
        after: LineId,
        head: LineId,
        tail: LineId,
    ) -> Result<usize, EditError> {
        if !self.is_live(after) || after == self.end {
            return Err(EditError::NotInChain);
        }
        let next = self.next(after).ok_or(EditError::NotInChain)?;

        let ids = self.range_ids(Range { head, tail });
        if ids.last() != Some(&tail) {
            return Err(EditError::InvalidRange);
        }

        self.lines[head].prev = Some(after);
        self.lines[tail].next = Some(next);
        self.lines[next].prev = Some(tail);
        self.lines[after].next = Some(head);

        for &id in &ids {
            self.lines[id].place = Place::Live;
        }
        self.rows += ids.len();
        log::trace!("splice_insert: {} lines, rows={}", ids.len(), self.rows);
        Ok(ids.len())
    }

    /// Unlink `head..=tail`, keeping the range's own links intact. Returns the
    /// number of lines unlinked.
    pub(crate) fn splice_remove(&mut self, head: LineId, tail: LineId) -> Result<usize, EditError> {
        let count = self.check_range(Range { head, tail }, Place::Live)?;
        let prev = self.prev(head).ok_or(EditError::NotInChain)?;
        let next = self.next(tail).ok_or(EditError::NotInChain)?;

        self.lines[prev].next = Some(next);
        self.lines[next].prev = Some(prev);

        let ids = self.range_ids(Range { head, tail });
        for &id in &ids {
            self.lines[id].place = Place::Shelved;
        }
        self.rows -= count;

        if !self.is_live(self.top_line) {
            self.top_line = prev;
        }
        if !self.is_live(self.csr_line) {
            self.csr_line = if prev == self.top { next } else { prev };
        }
        log::trace!("splice_remove: {} lines, rows={}", count, self.rows);
        Ok(count)
    }

    /// Free every line of a shelved range.
    pub(crate) fn free_range(&mut self, range: Range) {
        for id in self.range_ids(range) {
            match self.lines.get(id).map(|line| line.place) {
                Some(Place::Shelved) => {
                    self.lines.remove(id);
                }
                Some(place) => {
                    log::error!("free_range: line {:?} is {:?}, not shelved", id, place);
                }
                None => {}
            }
        }
    }

    /// Mode implied by the delimiters of the live body
    pub(crate) fn infer_mode(&self) -> Mode {
        let mut mode = Mode::None;
        for id in self.body() {
            let delim = self.lines[id].delim;
            if delim.nul_count() > 0 {
                return Mode::Binary;
            }
            if delim.is_newline() {
                mode = mode.merge(delim);
            }
        }
        mode
    }

    pub fn put_message(&mut self, text: impl Into<String>, severity: Severity) {
        let message = Message::new(text, severity);
        match severity {
            Severity::Info => log::debug!("{}: {}", self.path.display(), message.text),
            Severity::Warning => log::warn!("{}: {}", self.path.display(), message.text),
            Severity::Error => log::error!("{}: {}", self.path.display(), message.text),
        }
        self.messages.push_back(message);
    }

    pub fn take_message(&mut self) -> Option<Message> {
        self.messages.pop_front()
    }

    /// Remove the head message if it is no more severe than `severity`.
    pub fn remove_message_at_most(&mut self, severity: Severity) -> Option<Message> {
        if self.messages.front()?.severity <= severity {
            self.messages.pop_front()
        } else {
            None
        }
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Walk the chain and the redo log, reporting the first inconsistency.
    pub fn verify(&self) -> Result<(), EditError> {
        let fail = |what: String| Err(EditError::Inconsistent(what));

        for sentinel in [self.top, self.end] {
            match self.lines.get(sentinel) {
                Some(line) if line.is_protected() && line.place == Place::Live => {}
                _ => return fail(format!("sentinel {:?} damaged", sentinel)),
            }
        }
        if self.lines[self.top].prev.is_some() || self.lines[self.end].next.is_some() {
            return fail("sentinel has an outer link".into());
        }

        let mut live = HashSet::new();
        let mut cursor = self.top;
        live.insert(cursor);
        while cursor != self.end {
            let Some(next) = self.lines[cursor].next else {
                return fail(format!("chain broken after {:?}", cursor));
            };
            match self.lines.get(next) {
                Some(line) if line.prev == Some(cursor) && line.place == Place::Live => {}
                Some(_) => return fail(format!("back link mismatch at {:?}", next)),
                None => return fail(format!("dangling link to {:?}", next)),
            }
            if !live.insert(next) {
                return fail(format!("cycle at {:?}", next));
            }
            cursor = next;
        }

        if live.len() != self.rows + 2 {
            return fail(format!("row count {} but chain holds {}", self.rows, live.len() - 2));
        }
        if !live.contains(&self.top_line) || !live.contains(&self.csr_line) {
            return fail("top or cursor line not in chain".into());
        }

        let mut shelved = HashSet::new();
        for range in self.redo.inactive_halves() {
            let ids = self.range_ids(range);
            if ids.last() != Some(&range.tail) {
                return fail(format!("record range {:?} broken", range));
            }
            for id in ids {
                if self.lines[id].place != Place::Shelved || live.contains(&id) {
                    return fail(format!("line {:?} shelved but not inactive", id));
                }
                if !shelved.insert(id) {
                    return fail(format!("line {:?} owned by two records", id));
                }
            }
        }

        if live.len() + shelved.len() != self.lines.len() {
            return fail(format!(
                "{} lines allocated, {} live, {} shelved",
                self.lines.len(),
                live.len(),
                shelved.len()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(store: &LineStore) -> Vec<String> {
        store
            .body()
            .map(|id| String::from_utf8_lossy(store.text(id).unwrap()).into_owned())
            .collect()
    }

    #[test]
    fn test_empty_store() {
        let store = LineStore::new("empty.txt");
        assert_eq!(store.row_count(), 0);
        assert_eq!(store.get_row(store.end()), Some(0));
        assert_eq!(store.get_row(store.top()), None);
        assert_eq!(store.get_line(0), Some(store.end()));
        assert_eq!(store.cursor_line(), store.end());
        assert!(store.verify().is_ok());
    }

    #[test]
    fn test_rows_and_lines() {
        let store = LineStore::from_bytes("a.txt", b"one\ntwo\nthree\n".to_vec());
        assert_eq!(texts(&store), vec!["one", "two", "three"]);
        assert_eq!(store.row_count(), 3);
        for row in 0..=3 {
            let line = store.get_line(row).unwrap();
            assert_eq!(store.get_row(line), Some(row));
        }
        assert_eq!(store.get_line(4), None);
    }

    #[test]
    fn test_splice_remove_repairs_top_and_cursor() {
        let mut store = LineStore::from_bytes("a.txt", b"a\nb\nc\nd\n".to_vec());
        let a = store.get_line(0).unwrap();
        let b = store.get_line(1).unwrap();
        let c = store.get_line(2).unwrap();
        store.set_top_line(b);
        store.activate(c);

        store.splice_remove(b, c).unwrap();
        assert_eq!(store.top_line(), a);
        assert_eq!(store.cursor_line(), a);
        assert_eq!(store.row_count(), 2);
        // The removed range keeps its outer links for relinking
        assert_eq!(store.prev(b), Some(a));
        assert_eq!(store.next(b), Some(c));
        assert!(!store.is_live(b));
    }

    #[test]
    fn test_splice_insert_links_range() {
        let mut store = LineStore::from_bytes("a.txt", b"a\nc\n".to_vec());
        let a = store.get_line(0).unwrap();
        let b1 = store.new_line(b"b1", Delimiter::UNIX, LineFlags::empty());
        let b2 = store.new_line(b"b2", Delimiter::UNIX, LineFlags::empty());
        let range = store.chain_detached(&[b1, b2]).unwrap();

        store.splice_insert(a, range.head, range.tail).unwrap();
        assert_eq!(texts(&store), vec!["a", "b1", "b2", "c"]);
        assert_eq!(store.row_count(), 4);
    }

    #[test]
    fn test_splice_insert_rejects_after_end() {
        let mut store = LineStore::new("a.txt");
        let line = store.new_line(b"x", Delimiter::UNIX, LineFlags::empty());
        let end = store.end();
        assert_eq!(store.splice_insert(end, line, line), Err(EditError::NotInChain));
    }

    #[test]
    fn test_verify_detects_orphan() {
        let mut store = LineStore::from_bytes("a.txt", b"a\n".to_vec());
        assert!(store.verify().is_ok());
        let orphan = store.new_line(b"x", Delimiter::UNIX, LineFlags::empty());
        assert!(matches!(store.verify(), Err(EditError::Inconsistent(_))));
        store.discard_detached(Range::single(orphan));
        assert!(store.verify().is_ok());
    }

    #[test]
    fn test_message_queue() {
        let mut store = LineStore::new("a.txt");
        store.put_message("first", Severity::Info);
        store.put_message("second", Severity::Error);

        assert_eq!(store.messages().count(), 2);
        assert_eq!(store.remove_message_at_most(Severity::Info).unwrap().text, "first");
        assert!(store.remove_message_at_most(Severity::Warning).is_none());
        assert_eq!(store.take_message().unwrap().text, "second");
        assert!(store.take_message().is_none());
    }

    #[test]
    fn test_default_delimiter_follows_mode() {
        let unix = LineStore::from_bytes("u.txt", b"a\n".to_vec());
        let dos = LineStore::from_bytes("d.txt", b"a\r\n".to_vec());
        assert_eq!(unix.default_delimiter(), Delimiter::UNIX);
        assert_eq!(dos.default_delimiter(), Delimiter::DOS);
    }

    #[test]
    fn test_mode_merge() {
        assert_eq!(Mode::None.merge(Delimiter::UNIX), Mode::Unix);
        assert_eq!(Mode::Unix.merge(Delimiter::DOS), Mode::Mix);
        assert_eq!(Mode::Dos.merge(Delimiter::DOS), Mode::Dos);
        assert_eq!(Mode::Binary.merge(Delimiter::UNIX), Mode::Binary);
    }
}
