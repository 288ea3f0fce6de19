//! Path table mapping [`FileId`]s to the files a design was read from.

use crate::file_id::FileId;
use crate::loc::{Loc, ResolvedLoc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The set of source files referenced by a design database.
///
/// Only paths are stored; the lowering engine never needs the source text.
/// Registering the same path twice returns the same [`FileId`].
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<PathBuf>", into = "Vec<PathBuf>")]
pub struct SourceDb {
    files: Vec<PathBuf>,
    by_path: HashMap<PathBuf, FileId>,
}

impl SourceDb {
    /// Creates an empty source database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a file path and returns its [`FileId`].
    pub fn add_file(&mut self, path: impl Into<PathBuf>) -> FileId {
        let path = path.into();
        if let Some(&id) = self.by_path.get(&path) {
            return id;
        }
        let id = FileId::from_raw(self.files.len() as u32);
        self.by_path.insert(path.clone(), id);
        self.files.push(path);
        id
    }

    /// Returns the path of a file, or `None` for [`FileId::DUMMY`] and unknown IDs.
    pub fn path(&self, id: FileId) -> Option<&Path> {
        self.files.get(id.as_raw() as usize).map(PathBuf::as_path)
    }

    /// Resolves a [`Loc`] for display. Unknown files render as `<unknown>`.
    pub fn resolve(&self, loc: Loc) -> ResolvedLoc {
        let path = self
            .path(loc.file)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("<unknown>"));
        ResolvedLoc {
            path,
            line: loc.line,
        }
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if no files are registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl From<Vec<PathBuf>> for SourceDb {
    fn from(paths: Vec<PathBuf>) -> Self {
        let mut db = SourceDb::new();
        for p in paths {
            db.add_file(p);
        }
        db
    }
}

impl From<SourceDb> for Vec<PathBuf> {
    fn from(db: SourceDb) -> Self {
        db.files
    }
}
