//! Errors raised while loading or validating a design database.

use crate::ids::ObjHandle;

/// Errors that can occur when reading a design database.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The design file could not be read.
    #[error("failed to read design database: {0}")]
    Io(#[from] std::io::Error),

    /// The JSON content did not match the database schema.
    #[error("malformed design database: {0}")]
    Json(#[from] serde_json::Error),

    /// A relation points at an object that does not exist.
    #[error("object {from} references missing object {to}")]
    DanglingHandle {
        /// Raw index of the referencing object.
        from: u32,
        /// Raw index of the missing target.
        to: u32,
    },

    /// The root handle is missing or does not name a design object.
    #[error("design database has no design root")]
    NoRoot,
}

impl DbError {
    pub(crate) fn dangling(from: ObjHandle, to: ObjHandle) -> Self {
        DbError::DanglingHandle {
            from: from.as_raw(),
            to: to.as_raw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_dangling() {
        let err = DbError::dangling(ObjHandle::from_raw(3), ObjHandle::from_raw(99));
        assert_eq!(err.to_string(), "object 3 references missing object 99");
    }

    #[test]
    fn display_no_root() {
        assert_eq!(DbError::NoRoot.to_string(), "design database has no design root");
    }
}
