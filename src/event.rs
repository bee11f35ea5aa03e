// src/event.rs - Chain change notifications

use crate::file::{FileId, LineStore};
use crate::line::LineId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Commit,
    Undo,
    Redo,
}

/// One applied redo record, normalized to the lines that left the chain and
/// the lines that entered it at the same place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainChange {
    pub file: FileId,
    pub kind: ChangeKind,
    /// Surviving line just before the spliced place
    pub after: LineId,
    pub removed: Vec<LineId>,
    pub inserted: Vec<LineId>,
}

impl ChainChange {
    pub fn removes(&self, line: LineId) -> bool {
        self.removed.contains(&line)
    }

    /// Where a reference to `line` should move, if `line` left the chain:
    /// the line at the same position among the incoming lines (clamped to
    /// the last one), else the surviving predecessor.
    pub fn relocate(&self, line: LineId) -> Option<LineId> {
        let index = self.removed.iter().position(|&id| id == line)?;
        let moved = match self.inserted.len() {
            0 => self.after,
            len => self.inserted[index.min(len - 1)],
        };
        Some(moved)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    Changed(ChainChange),
    FileClosed(FileId),
}

/// Subscribers that hold references into line chains
pub trait EditListener {
    fn on_change(&mut self, store: &mut LineStore, change: &ChainChange);
    fn on_file_closed(&mut self, file: FileId);

    fn on_event(&mut self, store: Option<&mut LineStore>, event: &EditEvent) {
        match (event, store) {
            (EditEvent::Changed(change), Some(store)) => self.on_change(store, change),
            (EditEvent::Changed(_), None) => {}
            (EditEvent::FileClosed(file), _) => self.on_file_closed(*file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(count: usize) -> Vec<LineId> {
        let mut map: SlotMap<LineId, ()> = SlotMap::with_key();
        (0..count).map(|_| map.insert(())).collect()
    }

    #[test]
    fn test_relocate_positional() {
        let lines = ids(6);
        let change = ChainChange {
            file: FileId::default(),
            kind: ChangeKind::Commit,
            after: lines[0],
            removed: vec![lines[1], lines[2], lines[3]],
            inserted: vec![lines[4], lines[5]],
        };
        assert_eq!(change.relocate(lines[1]), Some(lines[4]));
        assert_eq!(change.relocate(lines[2]), Some(lines[5]));
        // Clamped to the last incoming line
        assert_eq!(change.relocate(lines[3]), Some(lines[5]));
        assert_eq!(change.relocate(lines[0]), None);
    }

    #[test]
    fn test_relocate_to_predecessor() {
        let lines = ids(3);
        let change = ChainChange {
            file: FileId::default(),
            kind: ChangeKind::Undo,
            after: lines[0],
            removed: vec![lines[1]],
            inserted: vec![],
        };
        assert!(change.removes(lines[1]));
        assert_eq!(change.relocate(lines[1]), Some(lines[0]));
    }
}
