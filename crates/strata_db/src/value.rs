//! Typed literal values carried by constants and parameters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A literal value as recorded by the front end.
///
/// The string variants hold digits only, without base prefix or width.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// A single logic value: 0, 1, 2 (`x`) or 3 (`z`).
    Scalar(u8),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// A real number.
    Real(f64),
    /// A string literal.
    Str(String),
    /// Binary digits.
    BinStr(String),
    /// Octal digits.
    OctStr(String),
    /// Decimal digits.
    DecStr(String),
    /// Hexadecimal digits.
    HexStr(String),
}

impl Value {
    /// Returns the value as an integer when it has an exact integral meaning.
    ///
    /// Based strings containing `x`/`z` digits and out-of-range values give `None`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Scalar(s) if *s <= 1 => Some(i64::from(*s)),
            Value::Scalar(_) => None,
            Value::Int(i) => Some(*i),
            Value::UInt(u) => i64::try_from(*u).ok(),
            Value::Real(_) | Value::Str(_) => None,
            Value::BinStr(s) => i64::from_str_radix(&strip(s), 2).ok(),
            Value::OctStr(s) => i64::from_str_radix(&strip(s), 8).ok(),
            Value::DecStr(s) => strip(s).parse().ok(),
            Value::HexStr(s) => i64::from_str_radix(&strip(s), 16).ok(),
        }
    }

    /// Returns the based-literal base character, if any.
    pub fn base_char(&self) -> Option<char> {
        match self {
            Value::BinStr(_) => Some('b'),
            Value::OctStr(_) => Some('o'),
            Value::DecStr(_) => Some('d'),
            Value::HexStr(_) => Some('h'),
            _ => None,
        }
    }
}

fn strip(digits: &str) -> String {
    digits.chars().filter(|c| *c != '_').collect()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(0) => f.write_str("1'b0"),
            Value::Scalar(1) => f.write_str("1'b1"),
            Value::Scalar(2) => f.write_str("1'bx"),
            Value::Scalar(_) => f.write_str("1'bz"),
            Value::Int(i) => write!(f, "{i}"),
            Value::UInt(u) => write!(f, "{u}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Str(s) => write!(f, "\"{s}\""),
            Value::BinStr(s) | Value::OctStr(s) | Value::DecStr(s) | Value::HexStr(s) => {
                let base = self.base_char().unwrap_or('d');
                write!(f, "'{base}{s}")
            }
        }
    }
}
