//! Execution tracing.
//!
//! A [`Tracer`] observes every executed instruction with its operands already
//! resolved. Tracers only observe: nothing they do can change what a machine
//! computes. The default [`NoopTracer`] reports itself disabled, so the engine
//! skips building events altogether.

use crate::intcode::decoder::{MAX_PARAMS, Mode};
use crate::intcode::isa::Opcode;
use crate::trace;
use std::fmt::{Display, Formatter};

/// One resolved parameter of an executed instruction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Operand {
    /// 1-based parameter index.
    pub param: usize,
    pub mode: Mode,
    /// Parameter word as stored after the instruction.
    pub raw: i64,
    /// Address the parameter resolved to; `None` for immediate operands.
    pub address: Option<usize>,
    /// Value read, or value written for write parameters.
    pub value: i64,
}

/// An executed instruction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TraceEvent {
    /// Address of the instruction word.
    pub ip: usize,
    /// Relative base before the instruction ran.
    pub relative_base: i64,
    pub opcode: Opcode,
    pub modes: [Mode; MAX_PARAMS],
    pub operands: Vec<Operand>,
}

impl Display for TraceEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:>5} {:<4}", self.ip, self.opcode.mnemonic())?;
        for operand in &self.operands {
            match operand.address {
                Some(address) => write!(
                    f,
                    " {}:{}[{}]={}",
                    operand.mode, operand.raw, address, operand.value
                )?,
                None => write!(f, " {}:{}", operand.mode, operand.value)?,
            }
        }
        if self.relative_base != 0 {
            write!(f, " (rb {})", self.relative_base)?;
        }
        Ok(())
    }
}

/// Which channel operation a machine is waiting on.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Suspension {
    /// Input channel is empty.
    Input,
    /// Output channel is full.
    Output,
}

/// Observer of machine execution.
pub trait Tracer: Send + Sync {
    /// Whether events should be built at all.
    fn enabled(&self) -> bool {
        true
    }

    /// Called after each instruction executes.
    fn instruction(&self, event: &TraceEvent);

    /// Called when the machine has to wait on a channel at `ip`.
    fn suspended(&self, _ip: usize, _on: Suspension) {}
}

/// Tracer that ignores everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {
    fn enabled(&self) -> bool {
        false
    }

    fn instruction(&self, _event: &TraceEvent) {}
}

/// Tracer that writes each event to the log at trace level.
///
/// The prefix tells machines apart when several run at once.
#[derive(Clone, Debug)]
pub struct LogTracer {
    prefix: String,
}

impl LogTracer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Tracer for LogTracer {
    fn enabled(&self) -> bool {
        crate::utils::log::enabled(crate::utils::log::Level::Trace)
    }

    fn instruction(&self, event: &TraceEvent) {
        trace!("{} {}", self.prefix, event);
    }

    fn suspended(&self, ip: usize, on: Suspension) {
        match on {
            Suspension::Input => trace!("{} {:>5} input pending", self.prefix, ip),
            Suspension::Output => trace!("{} {:>5} output pending", self.prefix, ip),
        }
    }
}
