//! File-and-line source locations.

use crate::file_id::FileId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A source location: a file and a 1-based line number.
///
/// Line `0` means the producer did not record a line.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Loc {
    /// The file this location belongs to.
    pub file: FileId,
    /// 1-based line number, or 0 when unknown.
    pub line: u32,
}

impl Loc {
    /// Location of synthesized nodes.
    pub const DUMMY: Loc = Loc {
        file: FileId::DUMMY,
        line: 0,
    };

    /// Creates a location.
    pub fn new(file: FileId, line: u32) -> Self {
        Self { file, line }
    }

    /// Returns `true` if this is [`Loc::DUMMY`] or points into no file.
    pub fn is_dummy(&self) -> bool {
        self.file == FileId::DUMMY
    }
}

impl Default for Loc {
    fn default() -> Self {
        Self::DUMMY
    }
}

/// A [`Loc`] with its file resolved to a path, ready for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedLoc {
    /// Path of the source file.
    pub path: PathBuf,
    /// 1-based line number, or 0 when unknown.
    pub line: u32,
}

impl fmt::Display for ResolvedLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.path.display())
        } else {
            write!(f, "{}:{}", self.path.display(), self.line)
        }
    }
}
