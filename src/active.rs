// src/active.rs - Mutable scratch copy of the line being edited
//
// The buffer shadows one Line. It is materialized on first touch, padded with
// blanks when an edit lands past the end of the text, and handed back through
// `get_changed` when the line is committed.

use crate::config::DEFAULT_BUFFER_BLOCK;
use crate::pool::SharedText;
use crate::width::{self, ColumnPolicy, Locate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveState {
    /// Attached, nothing copied yet
    Reset,
    /// Copied (and possibly padded), no edits
    Fetched,
    /// Edited since the last attach
    Changed,
}

#[derive(Debug)]
pub struct ActiveBuffer {
    source: SharedText,
    buffer: Vec<u8>,
    used: usize,
    state: ActiveState,
    policy: ColumnPolicy,
    block: usize,
}

impl Default for ActiveBuffer {
    fn default() -> Self {
        Self::new(ColumnPolicy::default(), DEFAULT_BUFFER_BLOCK)
    }
}

impl ActiveBuffer {
    /// `block` is the growth quantum and must be a power of two.
    pub fn new(policy: ColumnPolicy, block: usize) -> Self {
        debug_assert!(block.is_power_of_two());
        Self {
            source: SharedText::default(),
            buffer: Vec::new(),
            used: 0,
            state: ActiveState::Reset,
            policy,
            block: block.max(1),
        }
    }

    /// Shadow a new line. The backing buffer is kept for reuse.
    pub fn attach(&mut self, source: SharedText) {
        self.source = source;
        self.reset();
    }

    /// Forget fetched content and edits; the source is re-read on next touch.
    pub fn reset(&mut self) {
        self.used = 0;
        self.state = ActiveState::Reset;
    }

    pub fn state(&self) -> ActiveState {
        self.state
    }

    pub fn policy(&self) -> ColumnPolicy {
        self.policy
    }

    pub fn used_length(&self) -> usize {
        self.used
    }

    /// Allocated size of the backing buffer
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Current contents, trailing blanks included
    pub fn text(&self) -> &[u8] {
        match self.state {
            ActiveState::Reset => self.source.as_bytes(),
            _ => &self.buffer[..self.used],
        }
    }

    /// Display width without trailing blanks
    pub fn columns(&self) -> usize {
        width::width(trim_blanks(self.text()), self.policy)
    }

    /// Copy the source in on first touch, then pad with blanks up to
    /// `min_columns`. Padding alone is not an edit.
    pub fn fetch(&mut self, min_columns: usize) {
        if self.state == ActiveState::Reset {
            let length = self.source.len();
            self.expand(length);
            self.buffer[..length].copy_from_slice(self.source.as_bytes());
            self.used = length;
            self.state = ActiveState::Fetched;
        }

        let have = width::width(&self.buffer[..self.used], self.policy);
        if have < min_columns {
            let missing = min_columns - have;
            self.expand(self.used + missing);
            self.buffer[self.used..self.used + missing].fill(b' ');
            self.used += missing;
        }
    }

    /// Byte offset of the unit holding `column`, padding when it lies past
    /// the end of the text.
    pub fn column_to_offset(&mut self, column: usize) -> usize {
        self.fetch(0);
        match width::locate(&self.buffer[..self.used], column, self.policy) {
            Locate::At(offset) => offset,
            Locate::Past { .. } => {
                self.fetch(column);
                self.used
            }
        }
    }

    /// Replace `count` display units at `column` with `bytes`. Returns the
    /// byte offset just past the inserted text.
    pub fn replace_text(&mut self, column: usize, count: usize, bytes: &[u8]) -> usize {
        let origin = self.column_to_offset(column);
        let remove = width::span(&self.buffer[origin..self.used], count, self.policy);
        let length = self.used - remove + bytes.len();
        self.expand(length);

        self.buffer
            .copy_within(origin + remove..self.used, origin + bytes.len());
        self.buffer[origin..origin + bytes.len()].copy_from_slice(bytes);
        self.used = length;

        if !bytes.is_empty() || remove > 0 {
            self.state = ActiveState::Changed;
        }
        origin + bytes.len()
    }

    pub fn insert_text(&mut self, column: usize, bytes: &[u8]) -> usize {
        self.replace_text(column, 0, bytes)
    }

    /// Delete the unit at `column`. Returns whether anything was removed.
    pub fn remove_char(&mut self, column: usize) -> bool {
        self.fetch(0);
        let before = self.used;
        self.replace_text(column, 1, b"");
        self.used < before
    }

    /// Insert one codepoint; invalid values become U+FFFD.
    pub fn insert_char(&mut self, column: usize, codepoint: u32) -> usize {
        let mut utf8 = [0u8; 4];
        let encoded = encode(codepoint, &mut utf8);
        self.replace_text(column, 0, encoded)
    }

    /// Overwrite the unit at `column` with one codepoint.
    pub fn replace_char(&mut self, column: usize, codepoint: u32) -> usize {
        let mut utf8 = [0u8; 4];
        let encoded = encode(codepoint, &mut utf8);
        self.replace_text(column, 1, encoded)
    }

    /// The edited text with trailing blanks removed, or None when nothing
    /// was edited since attach.
    pub fn get_changed(&self) -> Option<&[u8]> {
        match self.state {
            ActiveState::Changed => Some(trim_blanks(&self.buffer[..self.used])),
            _ => None,
        }
    }

    /// Drop uncommitted edits. Returns whether there were any.
    pub fn undo(&mut self) -> bool {
        if self.state == ActiveState::Changed {
            self.reset();
            true
        } else {
            false
        }
    }

    fn expand(&mut self, length: usize) {
        if length <= self.buffer.len() {
            return;
        }
        let size = (length + 2 * self.block) & !(self.block - 1);
        log::trace!("ActiveBuffer: grow {} -> {}", self.buffer.len(), size);
        self.buffer.resize(size, b' ');
    }
}

fn encode(codepoint: u32, utf8: &mut [u8; 4]) -> &[u8] {
    let ch = char::from_u32(codepoint).unwrap_or(char::REPLACEMENT_CHARACTER);
    ch.encode_utf8(utf8).as_bytes()
}

fn trim_blanks(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
    &bytes[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attached(text: &str) -> ActiveBuffer {
        let mut active = ActiveBuffer::default();
        active.attach(SharedText::from(text.as_bytes()));
        active
    }

    #[test]
    fn test_fresh_attach_is_unchanged() {
        let active = attached("abc");
        assert_eq!(active.state(), ActiveState::Reset);
        assert_eq!(active.text(), b"abc");
        assert!(active.get_changed().is_none());
    }

    #[test]
    fn test_replace_char() {
        let mut active = attached("abc");
        active.replace_char(1, 'X' as u32);
        assert_eq!(active.state(), ActiveState::Changed);
        assert_eq!(active.get_changed(), Some(&b"aXc"[..]));
    }

    #[test]
    fn test_padding_is_not_an_edit() {
        let mut active = attached("ab");
        active.fetch(10);
        assert_eq!(active.state(), ActiveState::Fetched);
        assert_eq!(active.text(), b"ab        ");
        assert!(active.get_changed().is_none());

        assert_eq!(active.column_to_offset(20), 20);
        assert!(active.get_changed().is_none());
    }

    #[test]
    fn test_insert_past_end_pads() {
        let mut active = attached("ab");
        active.insert_char(5, 'z' as u32);
        assert_eq!(active.get_changed(), Some(&b"ab   z"[..]));
    }

    #[test]
    fn test_trailing_blanks_trimmed() {
        let mut active = attached("abc  ");
        active.insert_char(5, ' ' as u32);
        assert_eq!(active.get_changed(), Some(&b"abc"[..]));
        assert_eq!(active.columns(), 3);
    }

    #[test]
    fn test_remove_char_multibyte() {
        let mut active = attached("a€b");
        assert!(active.remove_char(1));
        assert_eq!(active.get_changed(), Some(&b"ab"[..]));
        // Nothing to remove past the end
        let mut active = attached("a");
        assert!(!active.remove_char(3));
        assert!(active.get_changed().is_none());
    }

    #[test]
    fn test_invalid_codepoint_becomes_replacement() {
        let mut active = attached("");
        active.insert_char(0, 0xD800);
        assert_eq!(active.get_changed(), Some("\u{FFFD}".as_bytes()));
    }

    #[test]
    fn test_undo_discards_edits() {
        let mut active = attached("abc");
        active.insert_text(0, b"xy");
        assert!(active.undo());
        assert!(active.get_changed().is_none());
        assert_eq!(active.text(), b"abc");
        assert!(!active.undo());
    }

    #[test]
    fn test_growth_policy() {
        let mut active = ActiveBuffer::new(ColumnPolicy::Codepoint, 16);
        active.attach(SharedText::from(&b"abc"[..]));
        active.fetch(0);
        // (3 + 32) rounded down to a multiple of 16
        assert_eq!(active.capacity(), 32);

        active.insert_text(0, &[b'x'; 40]);
        assert_eq!(active.capacity(), 64);
        assert_eq!(active.used_length(), 43);

        // Reattaching keeps the allocation
        active.attach(SharedText::from(&b"q"[..]));
        active.fetch(0);
        assert_eq!(active.capacity(), 64);
        assert_eq!(active.text(), b"q");
    }

    #[test]
    fn test_unicode_policy_columns() {
        let mut active = ActiveBuffer::new(ColumnPolicy::Unicode, DEFAULT_BUFFER_BLOCK);
        active.attach(SharedText::from("e\u{301}日x".as_bytes()));
        assert_eq!(active.column_to_offset(1), 3);
        assert_eq!(active.column_to_offset(3), 6);
        active.remove_char(1);
        assert_eq!(active.get_changed(), Some("e\u{301}x".as_bytes()));
    }
}
