// Common test utilities for building stores and checking chain invariants

use edcore::editor::Editor;
use edcore::file::{FileId, LineStore};
use edcore::line::LineId;

/// Utilities for creating stores and editors from literal content
pub mod fixture {
    use super::*;

    /// Store parsed from `data`, named `name`
    #[allow(dead_code)]
    pub fn store(name: &str, data: &[u8]) -> LineStore {
        LineStore::from_bytes(name, data.to_vec())
    }

    /// Store with `count` numbered lines: "line 0", "line 1", ...
    #[allow(dead_code)]
    pub fn numbered(count: usize) -> LineStore {
        let data: String = (0..count).map(|i| format!("line {}\n", i)).collect();
        store("numbered.txt", data.as_bytes())
    }

    /// Editor with one in-memory file open and current
    #[allow(dead_code)]
    pub fn editor(data: &[u8]) -> (Editor, FileId) {
        let mut editor = Editor::default();
        let file = editor.open_bytes("test.txt", data.to_vec());
        (editor, file)
    }
}

/// Read-side helpers
pub mod inspect {
    use super::*;

    /// Body line texts, lossily decoded
    #[allow(dead_code)]
    pub fn texts(store: &LineStore) -> Vec<String> {
        store
            .body()
            .map(|id| String::from_utf8_lossy(store.text(id).unwrap_or_default()).into_owned())
            .collect()
    }

    /// Body line handles in chain order
    #[allow(dead_code)]
    pub fn ids(store: &LineStore) -> Vec<LineId> {
        store.body().collect()
    }

    /// Texts of the editor's current file
    #[allow(dead_code)]
    pub fn editor_texts(editor: &Editor) -> Vec<String> {
        editor.store().map(texts).unwrap_or_default()
    }
}

/// Validation utilities for checking invariants
pub mod validation {
    use super::*;

    /// Assert the chain and history agree on who owns every line
    #[allow(dead_code)]
    pub fn assert_consistent(store: &LineStore) {
        if let Err(err) = store.verify() {
            panic!("store {} inconsistent: {}", store.name(), err);
        }
    }

    /// Assert the editor's cursor sits on a live line of the current file
    #[allow(dead_code)]
    pub fn assert_cursor_valid(editor: &Editor) {
        let (file, line, _) = editor.cursor().expect("editor has a cursor");
        let store = editor.file(file).expect("cursor file is open");
        assert!(store.is_live(line), "cursor line is not in the chain");
        assert_ne!(line, store.top(), "cursor rests on the top sentinel");
        assert_consistent(store);
    }
}
