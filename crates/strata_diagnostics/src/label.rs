//! Secondary locations attached to a diagnostic.

use serde::{Deserialize, Serialize};
use strata_source::Loc;

/// The visual style of a diagnostic label.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum LabelStyle {
    /// The object that triggered the diagnostic.
    Primary,
    /// A related object, such as the generic module behind a specialization.
    Secondary,
}

/// A source location within a diagnostic with an explanatory message.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Label {
    /// The location this label points at.
    pub loc: Loc,
    /// The message rendered next to the location.
    pub message: String,
    /// Whether this is a primary or secondary label.
    pub style: LabelStyle,
}

impl Label {
    /// Creates a primary label.
    pub fn primary(loc: Loc, message: impl Into<String>) -> Self {
        Self {
            loc,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    /// Creates a secondary label.
    pub fn secondary(loc: Loc, message: impl Into<String>) -> Self {
        Self {
            loc,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_style() {
        assert_eq!(Label::primary(Loc::DUMMY, "here").style, LabelStyle::Primary);
        let l = Label::secondary(Loc::DUMMY, "declared here");
        assert_eq!(l.style, LabelStyle::Secondary);
        assert_eq!(l.message, "declared here");
    }
}
