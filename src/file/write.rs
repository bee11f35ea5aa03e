// src/file/write.rs - Serialize a chain and save it atomically

use super::LineStore;
use crate::error::SaveError;
use crate::message::Severity;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const AUTOSAVE_PREFIX: &str = "*AUTOSAVE*.";

/// Autosave artifacts in `dir` left behind by saves that never finished,
/// sorted by path.
pub fn leftover_autosaves(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with(AUTOSAVE_PREFIX) {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

impl LineStore {
    /// Write every body line followed by its original terminator.
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        for id in self.body() {
            let line = &self.lines[id];
            out.write_all(self.pool.get(line.text))?;
            line.delim.encode(out)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_to(&mut out);
        out
    }

    pub fn write(&self, path: &Path) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_to(&mut out)?;
        out.flush()?;
        out.get_ref().sync_all()
    }

    /// `<dir>/*AUTOSAVE*.<name>`, where `dir` defaults to the file's own
    /// directory.
    pub fn autosave_path(&self, dir: Option<&Path>) -> PathBuf {
        let dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => self
                .path()
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };
        dir.join(format!("{}{}", AUTOSAVE_PREFIX, self.name()))
    }

    /// Save through the autosave artifact. On success the file is unchanged
    /// and its history is reset; failures are queued as Error messages.
    pub fn atomic_save(&mut self, autosave_dir: Option<&Path>) -> bool {
        match self.try_save(autosave_dir) {
            Ok(()) => {
                self.reset();
                log::info!("Saved {} ({} lines)", self.path().display(), self.row_count());
                true
            }
            Err(err) => {
                self.put_message(err.to_string(), Severity::Error);
                false
            }
        }
    }

    fn try_save(&self, autosave_dir: Option<&Path>) -> Result<(), SaveError> {
        if self.is_protected() {
            return Err(SaveError::ReadOnly);
        }
        if self.is_damaged() {
            return Err(SaveError::Damaged);
        }

        let artifact = self.autosave_path(autosave_dir);
        let permissions = fs::metadata(self.path()).ok().map(|meta| meta.permissions());

        let written = self.write(&artifact).and_then(|()| match permissions {
            Some(permissions) => fs::set_permissions(&artifact, permissions),
            None => Ok(()),
        });
        if let Err(err) = written {
            let _ = fs::remove_file(&artifact);
            return Err(SaveError::Io(err));
        }

        fs::rename(&artifact, self.path()).map_err(|source| SaveError::Rename { artifact, source })
    }
}
