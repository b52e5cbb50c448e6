//! Tagged cell value.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::CoercionError;

/// A single table cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Blank cell.
    #[default]
    Empty,
    /// Integer value (delivery order numbers).
    Integer(i64),
    /// Exact decimal value (quantities).
    Decimal(Decimal),
    /// Uncoerced text.
    Text(String),
}

impl Cell {
    /// Wrap extractor text; whitespace-only text is blank.
    pub fn from_text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Textual form of the cell; blank is the empty string.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Cell::Empty => Cow::Borrowed(""),
            Cell::Text(s) => Cow::Borrowed(s.as_str()),
            Cell::Integer(n) => Cow::Owned(n.to_string()),
            Cell::Decimal(d) => Cow::Owned(d.to_string()),
        }
    }

    /// Coerce to an integer.
    ///
    /// Decimals must have no fractional part; text must be an integer
    /// literal after trimming. Blank cells never coerce.
    pub fn to_integer(&self) -> Result<i64, CoercionError> {
        let fail = || CoercionError {
            value: self.as_text().into_owned(),
            target: "integer",
        };

        match self {
            Cell::Integer(n) => Ok(*n),
            Cell::Decimal(d) if d.fract().is_zero() => i64::try_from(*d).map_err(|_| fail()),
            Cell::Text(s) => s.trim().parse::<i64>().map_err(|_| fail()),
            _ => Err(fail()),
        }
    }

    /// Coerce to a decimal. Blank cells never coerce.
    pub fn to_decimal(&self) -> Result<Decimal, CoercionError> {
        let fail = || CoercionError {
            value: self.as_text().into_owned(),
            target: "decimal",
        };

        match self {
            Cell::Integer(n) => Ok(Decimal::from(*n)),
            Cell::Decimal(d) => Ok(*d),
            Cell::Text(s) => {
                let s = s.trim();
                Decimal::from_str(s)
                    .or_else(|_| Decimal::from_scientific(s))
                    .map_err(|_| fail())
            }
            Cell::Empty => Err(fail()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::from_text(s)
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::from_text(s)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Integer(n)
    }
}

impl From<Decimal> for Cell {
    fn from(d: Decimal) -> Self {
        Cell::Decimal(d)
    }
}
