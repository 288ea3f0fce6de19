//! Result type for fatal internal-consistency violations.

/// The result type of every lowering step.
///
/// `Ok` carries the produced value, which may be `None`-like when the input
/// deliberately lowers to nothing. `Err` means an invariant the engine relies
/// on was broken (a missing scope entry, a malformed struct member list,
/// dimension bookkeeping out of sync) and the whole run must stop. Unsupported
/// input is not an `Err`: it is reported through the diagnostic sink and the
/// step still returns `Ok`.
pub type StrataResult<T> = Result<T, InternalError>;

/// A fatal internal-consistency violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the violated invariant.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("no scope entry for `mem`");
        assert_eq!(format!("{err}"), "internal error: no scope entry for `mem`");
    }

    #[test]
    fn question_mark_propagates() {
        fn inner() -> StrataResult<u32> {
            Err(InternalError::new("boom"))
        }
        fn outer() -> StrataResult<u32> {
            let v = inner()?;
            Ok(v + 1)
        }
        assert_eq!(outer().unwrap_err().message, "boom");
    }

    #[test]
    fn from_string() {
        let err: InternalError = "from string".to_string().into();
        assert_eq!(err.message, "from string");
    }
}
