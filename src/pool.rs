// src/pool.rs - Append-only text arenas for line text
//
// Line text is never freed individually. A whole file image is adopted as one
// arena; committed lines are bump-allocated into a growing block. Spans are
// plain (arena, offset, length) triples and stay valid for the pool lifetime.

use std::rc::Rc;

const BLOCK_SIZE: usize = 4096;

/// Location of immutable text inside a `TextPool`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextSpan {
    arena: u32,
    offset: usize,
    len: usize,
}

impl TextSpan {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A cheaply clonable handle to pool text, usable without borrowing the pool.
#[derive(Debug, Clone)]
pub struct SharedText {
    arena: Rc<[u8]>,
    start: usize,
    end: usize,
}

impl SharedText {
    pub fn as_bytes(&self) -> &[u8] {
        &self.arena[self.start..self.end]
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl Default for SharedText {
    fn default() -> Self {
        Self {
            arena: Rc::from(&[][..]),
            start: 0,
            end: 0,
        }
    }
}

impl From<&[u8]> for SharedText {
    fn from(bytes: &[u8]) -> Self {
        Self {
            arena: Rc::from(bytes),
            start: 0,
            end: bytes.len(),
        }
    }
}

#[derive(Debug)]
enum Arena {
    /// Shared, immutable
    Frozen(Rc<[u8]>),
    /// Bump block; bytes below `len()` never change
    Block(Vec<u8>),
}

impl Arena {
    fn bytes(&self) -> &[u8] {
        match self {
            Arena::Frozen(bytes) => bytes,
            Arena::Block(bytes) => bytes,
        }
    }
}

#[derive(Debug, Default)]
pub struct TextPool {
    arenas: Vec<Arena>,
    current: Option<usize>,
}

impl TextPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a whole buffer (e.g. a file image) as one arena.
    pub fn adopt(&mut self, bytes: Vec<u8>) -> u32 {
        self.arenas.push(Arena::Frozen(Rc::from(bytes)));
        (self.arenas.len() - 1) as u32
    }

    /// Span of an adopted arena.
    pub fn span(&self, arena: u32, offset: usize, len: usize) -> TextSpan {
        debug_assert!(offset + len <= self.arenas[arena as usize].bytes().len());
        TextSpan { arena, offset, len }
    }

    /// Copy `bytes` into the pool.
    pub fn alloc(&mut self, bytes: &[u8]) -> TextSpan {
        if bytes.len() > BLOCK_SIZE / 2 {
            let arena = self.adopt(bytes.to_vec());
            return TextSpan {
                arena,
                offset: 0,
                len: bytes.len(),
            };
        }

        if let Some(index) = self.current {
            if let Arena::Block(block) = &mut self.arenas[index] {
                if block.capacity() - block.len() >= bytes.len() {
                    let offset = block.len();
                    block.extend_from_slice(bytes);
                    return TextSpan {
                        arena: index as u32,
                        offset,
                        len: bytes.len(),
                    };
                }
            }
        }

        let mut block = Vec::with_capacity(BLOCK_SIZE);
        block.extend_from_slice(bytes);
        self.arenas.push(Arena::Block(block));
        let index = self.arenas.len() - 1;
        self.current = Some(index);
        log::trace!("TextPool: new block {}", index);
        TextSpan {
            arena: index as u32,
            offset: 0,
            len: bytes.len(),
        }
    }

    pub fn get(&self, span: TextSpan) -> &[u8] {
        let bytes = self.arenas[span.arena as usize].bytes();
        &bytes[span.offset..span.offset + span.len]
    }

    /// Shareable handle to `span`. A bump block is frozen on first share.
    pub fn share(&mut self, span: TextSpan) -> SharedText {
        let index = span.arena as usize;
        let arena = match &mut self.arenas[index] {
            Arena::Frozen(arena) => Rc::clone(arena),
            Arena::Block(block) => {
                let frozen: Rc<[u8]> = Rc::from(std::mem::take(block));
                self.arenas[index] = Arena::Frozen(Rc::clone(&frozen));
                if self.current == Some(index) {
                    self.current = None;
                }
                frozen
            }
        };
        SharedText {
            arena,
            start: span.offset,
            end: span.offset + span.len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_get() {
        let mut pool = TextPool::new();
        let a = pool.alloc(b"hello");
        let b = pool.alloc(b"world");
        assert_eq!(pool.get(a), b"hello");
        assert_eq!(pool.get(b), b"world");
        assert_eq!(a.arena, b.arena);
    }

    #[test]
    fn test_adopted_spans() {
        let mut pool = TextPool::new();
        let arena = pool.adopt(b"abc\ndef\n".to_vec());
        let span = pool.span(arena, 4, 3);
        assert_eq!(pool.get(span), b"def");
    }

    #[test]
    fn test_share_freezes_block_and_keeps_spans_valid() {
        let mut pool = TextPool::new();
        let a = pool.alloc(b"first");
        let shared = pool.share(a);
        assert_eq!(shared.as_bytes(), b"first");

        // Later allocations go to a fresh block; old spans still resolve
        let b = pool.alloc(b"second");
        assert_ne!(a.arena, b.arena);
        assert_eq!(pool.get(a), b"first");
        assert_eq!(pool.get(b), b"second");
    }

    #[test]
    fn test_large_alloc_gets_own_arena() {
        let mut pool = TextPool::new();
        let big = vec![b'x'; BLOCK_SIZE];
        let span = pool.alloc(&big);
        assert_eq!(span.len(), BLOCK_SIZE);
        assert_eq!(pool.get(span), &big[..]);
    }

    #[test]
    fn test_empty_alloc() {
        let mut pool = TextPool::new();
        let span = pool.alloc(b"");
        assert!(span.is_empty());
        assert_eq!(pool.get(span), b"");
        assert!(pool.share(span).is_empty());
    }
}
