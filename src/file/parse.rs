// src/file/parse.rs - Split raw file bytes into Lines

use super::{LineStore, Mode};
use crate::line::{Delimiter, Line, LineFlags};
use crate::message::Severity;

/// One parsed line: text range and terminator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Piece {
    offset: usize,
    len: usize,
    delim: Delimiter,
}

#[derive(Debug, Default)]
struct Scan {
    pieces: Vec<Piece>,
    mode: Mode,
    binary: bool,
    unterminated: bool,
}

/// Lines end at the first `\n` or NUL. `\r\n` is a DOS ending; a NUL run is
/// one terminator split into chunks of at most 255.
fn scan(data: &[u8]) -> Scan {
    let mut scan = Scan::default();
    let mut pos = 0;

    while pos < data.len() {
        let start = pos;
        let Some(found) = data[start..].iter().position(|&b| b == b'\n' || b == 0) else {
            scan.pieces.push(Piece {
                offset: start,
                len: data.len() - start,
                delim: Delimiter::NONE,
            });
            scan.unterminated = true;
            break;
        };
        let at = start + found;

        if data[at] == b'\n' {
            let (len, delim) = if at > start && data[at - 1] == b'\r' {
                (at - start - 1, Delimiter::DOS)
            } else {
                (at - start, Delimiter::UNIX)
            };
            scan.mode = scan.mode.merge(delim);
            scan.pieces.push(Piece {
                offset: start,
                len,
                delim,
            });
            pos = at + 1;
            continue;
        }

        scan.binary = true;
        scan.mode = Mode::Binary;
        let run = data[at..].iter().take_while(|&&b| b == 0).count();
        let mut left = run;
        let mut text = (start, at - start);
        while left > 0 {
            let chunk = left.min(Delimiter::MAX_NUL_RUN);
            scan.pieces.push(Piece {
                offset: text.0,
                len: text.1,
                delim: Delimiter::nul_run(chunk as u8),
            });
            text = (at, 0);
            left -= chunk;
        }
        pos = at + run;
    }
    scan
}

impl LineStore {
    /// Append the lines of `data` to the body and infer the file mode.
    pub(crate) fn parse(&mut self, data: Vec<u8>) {
        let scan = scan(&data);
        let arena = self.pool.adopt(data);

        let mut after = self.lines[self.end()].prev.unwrap_or(self.top());
        let end = self.end();
        for piece in &scan.pieces {
            let span = self.pool.span(arena, piece.offset, piece.len);
            let id = self.lines.insert(Line::new(span, piece.delim, LineFlags::empty()));
            self.lines[id].prev = Some(after);
            self.lines[id].next = Some(end);
            self.lines[id].place = crate::line::Place::Live;
            self.lines[end].prev = Some(id);
            self.lines[after].next = Some(id);
            after = id;
        }
        self.rows += scan.pieces.len();
        self.mode = scan.mode;

        if let Some(first) = self.next(self.top()) {
            self.csr_line = first;
        }
        if scan.binary {
            self.put_message("Binary file", Severity::Warning);
        }
        if scan.unterminated {
            self.put_message("Ending '\\n' missing", Severity::Warning);
        }
        log::debug!(
            "parsed {}: {} lines, mode {}",
            self.path().display(),
            self.rows,
            self.mode
        );
    }
}
