// lib.rs - Library root for the edcore editing core

pub mod active;
pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod event;
pub mod file;
pub mod line;
pub mod mark;
pub mod message;
pub mod pool;
pub mod redo;
pub mod view;
pub mod width;

pub use active::{ActiveBuffer, ActiveState};
pub use config::EditorConfig;
pub use editor::Editor;
pub use error::{ConfigError, EditError, MarkError, SaveError};
pub use event::{ChainChange, ChangeKind, EditEvent, EditListener};
pub use file::{FileId, LineEnding, LineStore, Mode};
pub use line::{Delimiter, Line, LineFlags, LineId};
pub use mark::{Clip, Mark};
pub use message::{Message, Severity};
pub use redo::{Edit, Range, RedoLog, RedoRecord};
pub use view::View;
pub use width::ColumnPolicy;
