//! Instruction word decoding.
//!
//! Splits an instruction word into its [`Opcode`] and one addressing [`Mode`] per
//! parameter, rejecting modes the opcode cannot use before anything executes.

use crate::intcode::errors::IntcodeError;
use crate::intcode::isa::{Access, Opcode};
use std::fmt::Display;

/// Maximum number of parameters any instruction takes.
pub const MAX_PARAMS: usize = 3;

/// Addressing mode of a single parameter.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Mode {
    /// Parameter is an address.
    #[default]
    Position,
    /// Parameter is the operand itself. Never valid for writes.
    Immediate,
    /// Parameter plus the relative base is an address.
    Relative,
}

impl Mode {
    fn from_digit(digit: i64) -> Option<Mode> {
        match digit {
            0 => Some(Mode::Position),
            1 => Some(Mode::Immediate),
            2 => Some(Mode::Relative),
            _ => None,
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Position => write!(f, "pos"),
            Mode::Immediate => write!(f, "imm"),
            Mode::Relative => write!(f, "rel"),
        }
    }
}

/// A decoded instruction word.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    /// Modes for parameters 1 to 3; entries past the opcode's arity are `Position`.
    pub modes: [Mode; MAX_PARAMS],
}

impl Instruction {
    /// Mode of the 1-based parameter `param`.
    pub fn mode(&self, param: usize) -> Mode {
        self.modes[param - 1]
    }

    /// Modes of the parameters this instruction actually takes.
    pub fn used_modes(&self) -> &[Mode] {
        &self.modes[..self.opcode.arity()]
    }
}

/// Decodes the instruction word found at `ip`.
///
/// Mode digits beyond the opcode's arity are ignored. Fails with
/// [`IntcodeError::UnsupportedOpcode`] for an unknown opcode or a negative word,
/// [`IntcodeError::UnsupportedMode`] for a mode digit other than 0, 1 or 2, and
/// [`IntcodeError::InvalidWriteTarget`] when a write parameter is immediate.
pub fn decode(word: i64, ip: usize) -> Result<Instruction, IntcodeError> {
    if word < 0 {
        return Err(IntcodeError::UnsupportedOpcode { opcode: word, ip });
    }

    let opcode = Opcode::try_from(word % 100)
        .map_err(|_| IntcodeError::UnsupportedOpcode { opcode: word, ip })?;

    let mut modes = [Mode::Position; MAX_PARAMS];
    let mut digits = word / 100;
    for (i, access) in opcode.params().iter().enumerate() {
        let digit = digits % 10;
        digits /= 10;

        let mode = Mode::from_digit(digit).ok_or(IntcodeError::UnsupportedMode {
            mode: digit,
            param: i + 1,
            ip,
        })?;
        if *access == Access::Write && mode == Mode::Immediate {
            return Err(IntcodeError::InvalidWriteTarget { ip, param: i + 1 });
        }
        modes[i] = mode;
    }

    Ok(Instruction { opcode, modes })
}
