//! IntCode library.
//!
//! Provides the IntCode virtual machine, its channels and pipeline helpers, and a
//! small logger.

pub mod intcode;
pub mod utils;

pub use intcode::errors::IntcodeError;
pub use intcode::program::Program;
pub use intcode::vm::VM;
