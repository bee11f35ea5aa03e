// src/width.rs - Column <-> byte offset arithmetic over UTF-8 text
//
// A "unit" is what one cursor step moves over: a codepoint under
// `ColumnPolicy::Codepoint`, an extended grapheme cluster under
// `ColumnPolicy::Unicode`. Invalid byte sequences never fail; each one is a
// single one-column unit, displayed as U+FFFD.

use std::ops::ControlFlow;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColumnPolicy {
    /// Every codepoint occupies one column
    #[default]
    Codepoint,
    /// Grapheme clusters with East-Asian width (combining marks attach to
    /// their base character, wide characters take two columns)
    Unicode,
}

/// One display unit inside a byte buffer
#[derive(Debug, Clone, Copy)]
struct Unit {
    offset: usize,
    width: usize,
}

/// Result of resolving a column against buffer content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locate {
    /// Column starts (or falls inside) the unit at this byte offset
    At(usize),
    /// Column lies beyond the content; `missing` blank columns are needed
    Past { end: usize, missing: usize },
}

fn walk<T>(
    bytes: &[u8],
    policy: ColumnPolicy,
    mut visit: impl FnMut(Unit) -> ControlFlow<T>,
) -> Option<T> {
    let mut base = 0;
    for chunk in bytes.utf8_chunks() {
        let valid = chunk.valid();
        match policy {
            ColumnPolicy::Codepoint => {
                for (i, _) in valid.char_indices() {
                    let unit = Unit {
                        offset: base + i,
                        width: 1,
                    };
                    if let ControlFlow::Break(found) = visit(unit) {
                        return Some(found);
                    }
                }
            }
            ColumnPolicy::Unicode => {
                for (i, cluster) in valid.grapheme_indices(true) {
                    let unit = Unit {
                        offset: base + i,
                        width: cluster.width().max(1),
                    };
                    if let ControlFlow::Break(found) = visit(unit) {
                        return Some(found);
                    }
                }
            }
        }
        base += valid.len();

        let invalid = chunk.invalid();
        if !invalid.is_empty() {
            let unit = Unit {
                offset: base,
                width: 1,
            };
            if let ControlFlow::Break(found) = visit(unit) {
                return Some(found);
            }
            base += invalid.len();
        }
    }
    None
}

/// Resolve `column` to the byte offset of the unit that contains it.
pub fn locate(bytes: &[u8], column: usize, policy: ColumnPolicy) -> Locate {
    let mut col = 0;
    let found = walk(bytes, policy, |unit| {
        if column < col + unit.width {
            ControlFlow::Break(unit.offset)
        } else {
            col += unit.width;
            ControlFlow::Continue(())
        }
    });

    match found {
        Some(offset) => Locate::At(offset),
        None if column <= col => Locate::At(bytes.len()),
        None => Locate::Past {
            end: bytes.len(),
            missing: column - col,
        },
    }
}

/// Byte offset for `column`, clamped to the end of `bytes` (no padding).
pub fn offset_of(bytes: &[u8], column: usize, policy: ColumnPolicy) -> usize {
    match locate(bytes, column, policy) {
        Locate::At(offset) => offset,
        Locate::Past { end, .. } => end,
    }
}

/// Byte length of the first `count` units of `bytes`.
pub fn span(bytes: &[u8], count: usize, policy: ColumnPolicy) -> usize {
    let mut seen = 0;
    walk(bytes, policy, |unit| {
        if seen == count {
            ControlFlow::Break(unit.offset)
        } else {
            seen += 1;
            ControlFlow::Continue(())
        }
    })
    .unwrap_or(bytes.len())
}

/// Display width of `bytes` in columns.
pub fn width(bytes: &[u8], policy: ColumnPolicy) -> usize {
    let mut total = 0;
    walk(bytes, policy, |unit| {
        total += unit.width;
        ControlFlow::<()>::Continue(())
    });
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_locate() {
        let text = b"hello";
        assert_eq!(locate(text, 0, ColumnPolicy::Codepoint), Locate::At(0));
        assert_eq!(locate(text, 4, ColumnPolicy::Codepoint), Locate::At(4));
        assert_eq!(locate(text, 5, ColumnPolicy::Codepoint), Locate::At(5));
        assert_eq!(
            locate(text, 8, ColumnPolicy::Codepoint),
            Locate::Past { end: 5, missing: 3 }
        );
    }

    #[test]
    fn test_multibyte_codepoints() {
        // a(1) é(2) €(3) b(1)
        let text = "aé€b".as_bytes();
        let offsets: Vec<usize> = (0..4)
            .map(|c| offset_of(text, c, ColumnPolicy::Codepoint))
            .collect();
        assert_eq!(offsets, vec![0, 1, 3, 6]);
        assert_eq!(width(text, ColumnPolicy::Codepoint), 4);
    }

    #[test]
    fn test_combining_policy_attaches_marks() {
        // "e" + COMBINING ACUTE ACCENT, then "x"
        let text = "e\u{301}x".as_bytes();
        assert_eq!(width(text, ColumnPolicy::Codepoint), 3);
        assert_eq!(width(text, ColumnPolicy::Unicode), 2);
        assert_eq!(offset_of(text, 1, ColumnPolicy::Unicode), 3);
        assert_eq!(offset_of(text, 1, ColumnPolicy::Codepoint), 1);
    }

    #[test]
    fn test_wide_characters_take_two_columns() {
        let text = "日本x".as_bytes();
        assert_eq!(width(text, ColumnPolicy::Unicode), 5);
        // Column 1 is the second cell of the first character
        assert_eq!(offset_of(text, 1, ColumnPolicy::Unicode), 0);
        assert_eq!(offset_of(text, 2, ColumnPolicy::Unicode), 3);
        assert_eq!(offset_of(text, 4, ColumnPolicy::Unicode), 6);
    }

    #[test]
    fn test_invalid_bytes_are_single_columns() {
        let text = b"a\xffb\xc3";
        assert_eq!(width(text, ColumnPolicy::Codepoint), 4);
        assert_eq!(offset_of(text, 1, ColumnPolicy::Codepoint), 1);
        assert_eq!(offset_of(text, 2, ColumnPolicy::Codepoint), 2);
        assert_eq!(offset_of(text, 3, ColumnPolicy::Codepoint), 3);
    }

    #[test]
    fn test_span_counts_units() {
        let text = "é€b".as_bytes();
        assert_eq!(span(text, 0, ColumnPolicy::Codepoint), 0);
        assert_eq!(span(text, 1, ColumnPolicy::Codepoint), 2);
        assert_eq!(span(text, 2, ColumnPolicy::Codepoint), 5);
        assert_eq!(span(text, 9, ColumnPolicy::Codepoint), 6);
    }

    #[test]
    fn test_units_cover_buffer() {
        let text = "aé\u{301}日".as_bytes();
        assert_eq!(span(text, usize::MAX, ColumnPolicy::Codepoint), text.len());
        assert_eq!(span(text, usize::MAX, ColumnPolicy::Unicode), text.len());
        // The combining accent joins its base under Unicode
        assert_eq!(span(text, 2, ColumnPolicy::Codepoint), 3);
        assert_eq!(span(text, 2, ColumnPolicy::Unicode), 5);
    }
}
