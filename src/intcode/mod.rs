//! IntCode virtual machine.
//!
//! Programs are lists of signed integers that double as the machine's initial
//! memory. A machine reads instructions from memory, talks to the outside world
//! through bounded channels, and halts with a snapshot of its final memory.
//!
//! # Execution model
//!
//! - **Memory**: unbounded, zero-initialised, addressed by non-negative integers
//! - **Registers**: instruction pointer and relative base only
//! - **I/O**: one input and one output channel per machine; a machine suspends only
//!   when its input is empty or its output is full
//! - **Faults**: every fault stops the machine and surfaces as an [`errors::IntcodeError`]
//!
//! # Modules
//!
//! - [`channel`]: Bounded FIFO channels with completion
//! - [`decoder`]: Instruction word decoding and parameter modes
//! - [`errors`]: Load and execution error types
//! - [`isa`]: Opcode table
//! - [`memory`]: Hybrid dense/sparse address space and memory snapshots
//! - [`pipeline`]: Serial chains and feedback loops of machines
//! - [`program`]: Program images, parsing and patching
//! - [`trace`]: Instruction tracing
//! - [`vm`]: Execution engine, batch and streaming entry points

pub mod channel;
pub mod decoder;
pub mod errors;
pub mod isa;
pub mod memory;
pub mod pipeline;
pub mod program;
pub mod trace;
pub mod vm;
