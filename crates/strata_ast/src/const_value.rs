//! Literal values of constant nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width given to unsized integer literals.
pub const UNSIZED_WIDTH: u32 = 32;

/// The value of a constant node.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstValue {
    /// A two-state integer of a known width.
    Int {
        /// The value.
        value: i64,
        /// Width in bits.
        width: u32,
        /// Signedness.
        signed: bool,
    },
    /// A four-state bit string, most significant bit first, over `01xz`.
    Bits(String),
    /// A string literal.
    Str(String),
    /// A real literal.
    Real(f64),
}

impl ConstValue {
    /// An unsigned integer of the given width.
    pub fn int(value: i64, width: u32) -> Self {
        ConstValue::Int {
            value,
            width,
            signed: false,
        }
    }

    /// A signed integer of the given width.
    pub fn signed(value: i64, width: u32) -> Self {
        ConstValue::Int {
            value,
            width,
            signed: true,
        }
    }

    /// Returns the integer value when the constant is two-state.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConstValue::Int { value, .. } => Some(*value),
            ConstValue::Bits(bits) => {
                let trimmed = bits.trim_start_matches('0');
                if trimmed.is_empty() {
                    return Some(0);
                }
                if trimmed.len() > 63 {
                    return None;
                }
                i64::from_str_radix(trimmed, 2).ok()
            }
            ConstValue::Str(_) | ConstValue::Real(_) => None,
        }
    }

    /// Width in bits.
    pub fn width(&self) -> u32 {
        match self {
            ConstValue::Int { width, .. } => *width,
            ConstValue::Bits(bits) => bits.len() as u32,
            ConstValue::Str(s) => (s.len() as u32) * 8,
            ConstValue::Real(_) => 64,
        }
    }

    /// Signedness.
    pub fn is_signed(&self) -> bool {
        match self {
            ConstValue::Int { signed, .. } => *signed,
            ConstValue::Real(_) => true,
            ConstValue::Bits(_) | ConstValue::Str(_) => false,
        }
    }

    /// Builds a constant from based digits (`b`, `o`, `d`, `h`) and an optional width.
    ///
    /// Digits may contain `_` separators and, except in decimal, `x`/`z`.
    pub fn from_digits(base: char, digits: &str, width: Option<u32>, signed: bool) -> Option<Self> {
        let digits: String = digits.chars().filter(|c| *c != '_').collect();
        if digits.is_empty() {
            return None;
        }
        let bits_per_digit = match base.to_ascii_lowercase() {
            'b' => 1,
            'o' => 3,
            'h' => 4,
            'd' => {
                let value: i64 = digits.parse().ok()?;
                let width = width.unwrap_or(UNSIZED_WIDTH);
                return Some(ConstValue::Int { value, width, signed });
            }
            _ => return None,
        };
        let mut bits = String::with_capacity(digits.len() * bits_per_digit);
        for c in digits.chars() {
            match c.to_ascii_lowercase() {
                'x' | 'z' | '?' => {
                    let fill = if c.eq_ignore_ascii_case(&'x') { 'x' } else { 'z' };
                    bits.extend(std::iter::repeat(fill).take(bits_per_digit));
                }
                d => {
                    let v = d.to_digit(1 << bits_per_digit)?;
                    for i in (0..bits_per_digit).rev() {
                        bits.push(if (v >> i) & 1 == 1 { '1' } else { '0' });
                    }
                }
            }
        }
        let width = width.unwrap_or(UNSIZED_WIDTH.max(bits.len() as u32)) as usize;
        let bits = resize_bits(&bits, width);
        let two_state = bits.chars().all(|c| c == '0' || c == '1');
        if two_state && width <= 63 {
            let value = i64::from_str_radix(&bits, 2).ok()?;
            Some(ConstValue::Int {
                value,
                width: width as u32,
                signed,
            })
        } else {
            Some(ConstValue::Bits(bits))
        }
    }

    /// Parses a Verilog number literal such as `42`, `4'b1010`, `8'shff`, or `'d7`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let Some(tick) = text.find('\'') else {
            let value: i64 = text.replace('_', "").parse().ok()?;
            return Some(ConstValue::signed(value, UNSIZED_WIDTH));
        };
        let (size, rest) = text.split_at(tick);
        let width = if size.is_empty() {
            None
        } else {
            Some(size.trim().parse().ok()?)
        };
        let mut rest = rest[1..].chars();
        let mut base = rest.next()?;
        let mut signed = false;
        if base == 's' || base == 'S' {
            signed = true;
            base = rest.next()?;
        }
        ConstValue::from_digits(base, rest.as_str(), width, signed)
    }
}

/// Zero-extends (or x/z-extends when the top bit is x/z) or truncates to `width`.
fn resize_bits(bits: &str, width: usize) -> String {
    if bits.len() >= width {
        return bits[bits.len() - width..].to_string();
    }
    let fill = match bits.chars().next() {
        Some(c @ ('x' | 'z')) => c,
        _ => '0',
    };
    let mut out: String = std::iter::repeat(fill).take(width - bits.len()).collect();
    out.push_str(bits);
    out
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int {
                value,
                width,
                signed,
            } => {
                let s = if *signed { "s" } else { "" };
                if *value < 0 {
                    write!(f, "-{width}'{s}d{}", value.unsigned_abs())
                } else {
                    write!(f, "{width}'{s}d{value}")
                }
            }
            ConstValue::Bits(bits) => write!(f, "{}'b{bits}", bits.len()),
            ConstValue::Str(s) => write!(f, "\"{s}\""),
            ConstValue::Real(r) => write!(f, "{r}"),
        }
    }
}
