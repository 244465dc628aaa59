//! Instruction set definitions.
//!
//! The `for_each_opcode!` macro holds the canonical opcode table and hands it to a
//! callback macro for code generation, so the opcode enum, its decoding and its
//! parameter layout all come from one list.
//!
//! # Instruction format
//!
//! An instruction is one word followed by its parameters, one word each:
//! - `word % 100`: opcode
//! - `word / 100 % 10`: mode of parameter 1
//! - `word / 1000 % 10`: mode of parameter 2
//! - `word / 10000 % 10`: mode of parameter 3
//!
//! See [`decoder`](super::decoder) for mode handling.

use crate::intcode::errors::IntcodeError;

/// How an instruction uses one of its parameters.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Access {
    /// Parameter resolves to a value.
    Read,
    /// Parameter resolves to a target address.
    Write,
}

/// Invokes a callback macro with the complete opcode list.
macro_rules! for_each_opcode {
    ($callback:ident) => {
        $callback! {
            /// ADD a, b, dst ; dst = a + b
            Add = 1, "ADD" => [a: Read, b: Read, dst: Write],
            /// MUL a, b, dst ; dst = a * b
            Mul = 2, "MUL" => [a: Read, b: Read, dst: Write],
            /// IN dst ; dst = next input value
            Input = 3, "IN" => [dst: Write],
            /// OUT a ; emit a
            Output = 4, "OUT" => [a: Read],
            /// JNZ a, target ; if a != 0 then ip = target
            JumpIfTrue = 5, "JNZ" => [a: Read, target: Read],
            /// JZ a, target ; if a == 0 then ip = target
            JumpIfFalse = 6, "JZ" => [a: Read, target: Read],
            /// LT a, b, dst ; dst = (a < b) as 0/1
            LessThan = 7, "LT" => [a: Read, b: Read, dst: Write],
            /// EQ a, b, dst ; dst = (a == b) as 0/1
            Equals = 8, "EQ" => [a: Read, b: Read, dst: Write],
            /// ARB a ; relative_base += a
            AdjustRelativeBase = 9, "ARB" => [a: Read],
            /// HALT ; complete the output and stop
            Halt = 99, "HALT" => [],
        }
    };
}

macro_rules! define_opcodes {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $code:literal, $mnemonic:literal => [
                $( $param:ident : $access:ident ),* $(,)?
            ]
        ),* $(,)?
    ) => {
        #[repr(u8)]
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name = $code,
            )*
        }

        impl TryFrom<i64> for Opcode {
            type Error = IntcodeError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                match value {
                    $( $code => Ok(Opcode::$name), )*
                    _ => Err(IntcodeError::UnsupportedOpcode { opcode: value, ip: 0 }),
                }
            }
        }

        impl Opcode {
            /// All opcodes in table order.
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$name, )* ];

            /// Returns the mnemonic used in traces.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Returns how each parameter is used, in order.
            pub const fn params(&self) -> &'static [Access] {
                match self {
                    $( Opcode::$name => &[ $( Access::$access ),* ], )*
                }
            }

            /// Number of parameters following the instruction word.
            pub const fn arity(&self) -> usize {
                self.params().len()
            }

            /// Instruction length in words, including the instruction word.
            pub const fn width(&self) -> usize {
                1 + self.arity()
            }
        }
    };
}

for_each_opcode!(define_opcodes);
