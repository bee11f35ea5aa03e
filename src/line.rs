// src/line.rs - Line nodes of a file chain

use crate::pool::TextSpan;
use bitflags::bitflags;
use std::io::{self, Write};

slotmap::new_key_type! {
    /// Stable handle of a Line inside its file
    pub struct LineId;
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct LineFlags: u8 {
        /// Inside the current mark
        const MARKED = 0b0001;
        /// Read-only (sentinels, lines of protected files)
        const PROTECTED = 0b0010;
        const HIDDEN = 0b0100;
        /// Temporary line
        const AUTO = 0b1000;
    }
}

/// Two-byte line terminator encoding.
///
/// | `[0]`  | `[1]`  | meaning                    |
/// |--------|--------|----------------------------|
/// | `\n`   | `0`    | UNIX line ending           |
/// | `\n`   | `\r`   | DOS line ending            |
/// | `0`    | N > 0  | run of N NUL bytes         |
/// | `0`    | `0`    | no terminator (final line) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Delimiter(pub [u8; 2]);

impl Delimiter {
    pub const UNIX: Delimiter = Delimiter([b'\n', 0]);
    pub const DOS: Delimiter = Delimiter([b'\n', b'\r']);
    pub const NONE: Delimiter = Delimiter([0, 0]);

    pub const MAX_NUL_RUN: usize = 255;

    /// NUL run of `count` bytes, `1..=255`.
    pub fn nul_run(count: u8) -> Self {
        debug_assert!(count > 0);
        Delimiter([0, count])
    }

    pub fn is_newline(&self) -> bool {
        self.0[0] == b'\n'
    }

    pub fn is_dos(&self) -> bool {
        *self == Self::DOS
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    /// Number of NUL bytes encoded, zero for newline delimiters
    pub fn nul_count(&self) -> usize {
        if self.0[0] == 0 { self.0[1] as usize } else { 0 }
    }

    /// On-disk length of the terminator
    pub fn encoded_len(&self) -> usize {
        match self.0 {
            [b'\n', b'\r'] => 2,
            [b'\n', _] => 1,
            [_, count] => count as usize,
        }
    }

    pub fn encode(&self, out: &mut impl Write) -> io::Result<()> {
        match self.0 {
            [b'\n', b'\r'] => out.write_all(b"\r\n"),
            [b'\n', _] => out.write_all(b"\n"),
            [_, count] => {
                const ZEROS: [u8; Delimiter::MAX_NUL_RUN] = [0; Delimiter::MAX_NUL_RUN];
                out.write_all(&ZEROS[..count as usize])
            }
        }
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        Self::UNIX
    }
}

/// One immutable line of text in a file chain.
///
/// Text is owned by the file's `TextPool`. Detached ranges (inactive halves of
/// redo records) keep their internal links and the outer links they had when
/// spliced out, so they can be relinked exactly.
#[derive(Debug, Clone)]
pub struct Line {
    pub text: TextSpan,
    pub flags: LineFlags,
    pub delim: Delimiter,
    pub(crate) prev: Option<LineId>,
    pub(crate) next: Option<LineId>,
    pub(crate) place: Place,
}

/// Who currently owns a Line node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Place {
    /// Freshly built, not yet handed to a commit
    Detached,
    /// In the file chain
    Live,
    /// In the inactive half of a redo record
    Shelved,
}

impl Line {
    pub(crate) fn new(text: TextSpan, delim: Delimiter, flags: LineFlags) -> Self {
        Self {
            text,
            flags,
            delim,
            prev: None,
            next: None,
            place: Place::Detached,
        }
    }

    pub fn is_protected(&self) -> bool {
        self.flags.contains(LineFlags::PROTECTED)
    }

    pub fn is_marked(&self) -> bool {
        self.flags.contains(LineFlags::MARKED)
    }

    pub fn prev(&self) -> Option<LineId> {
        self.prev
    }

    pub fn next(&self) -> Option<LineId> {
        self.next
    }
}
