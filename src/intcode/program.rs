//! Program images.
//!
//! A [`Program`] is the immutable initial memory of a machine: an ordered list of
//! signed integers, written as text as one line of comma-separated decimals.
//! Cloning a program is cheap and never copies the cells.

use crate::intcode::errors::IntcodeError;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Immutable, shareable program image.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Program(Arc<[i64]>);

impl Program {
    /// Wraps an existing list of cells.
    pub fn new(cells: impl Into<Arc<[i64]>>) -> Self {
        Self(cells.into())
    }

    /// Reads and parses a program file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IntcodeError> {
        std::fs::read_to_string(path)?.parse()
    }

    /// Returns a copy with each `(address, value)` pair applied.
    ///
    /// Addresses past the end extend the image with zeros.
    pub fn patched(&self, patches: &[(usize, i64)]) -> Self {
        let mut cells = self.0.to_vec();
        for &(address, value) in patches {
            if address >= cells.len() {
                cells.resize(address + 1, 0);
            }
            cells[address] = value;
        }
        Self::new(cells)
    }

    pub fn cells(&self) -> &[i64] {
        &self.0
    }
}

impl Deref for Program {
    type Target = [i64];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<i64>> for Program {
    fn from(cells: Vec<i64>) -> Self {
        Self::new(cells)
    }
}

impl From<&[i64]> for Program {
    fn from(cells: &[i64]) -> Self {
        Self::new(cells)
    }
}

impl<const N: usize> From<[i64; N]> for Program {
    fn from(cells: [i64; N]) -> Self {
        Self::new(cells.as_slice())
    }
}

impl FromStr for Program {
    type Err = IntcodeError;

    /// Parses comma-separated signed decimals. Whitespace around tokens is
    /// ignored, as is a single trailing comma.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Ok(Self::new(Vec::new()));
        }

        let text = text.strip_suffix(',').unwrap_or(text);
        text.split(',')
            .enumerate()
            .map(|(index, token)| {
                let token = token.trim();
                token.parse::<i64>().map_err(|_| IntcodeError::InvalidProgram {
                    index,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, cell) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", cell)?;
        }
        Ok(())
    }
}
