//! IntCode execution engine.
//!
//! [`VM`] holds an immutable program and starts runs from it; every run gets a fresh
//! [`Machine`] with its own address space, so runs never see each other's writes.
//!
//! A machine executes strictly in program order and suspends at exactly two points:
//! an input instruction facing an empty input channel, and an output instruction
//! facing a full output channel. Every other instruction completes without yielding.

use crate::intcode::channel::{self, ChannelReader, ChannelWriter, TryRead};
use crate::intcode::decoder::{Instruction, Mode, decode};
use crate::intcode::errors::IntcodeError;
use crate::intcode::isa::Opcode;
use crate::intcode::memory::{AddressSpace, MemorySnapshot};
use crate::intcode::program::Program;
use crate::intcode::trace::{LogTracer, NoopTracer, Operand, Suspension, TraceEvent, Tracer};
use crate::{debug, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Execution state after a step.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum State {
    Running,
    /// Terminal: the halt instruction ran and the output was completed.
    Halted,
}

/// One run of a program: address space, instruction pointer and relative base.
pub struct Machine {
    memory: AddressSpace,
    /// Address of the next instruction word.
    ip: usize,
    relative_base: i64,
    halted: bool,
    /// Instructions executed so far.
    steps: u64,
    tracer: Arc<dyn Tracer>,
    /// Cached `tracer.enabled()`.
    tracing: bool,
}

impl Machine {
    /// Creates a machine over a fresh copy of `program`.
    pub fn new(program: &[i64], tracer: Arc<dyn Tracer>) -> Self {
        Self {
            memory: AddressSpace::new(program),
            ip: 0,
            relative_base: 0,
            halted: false,
            steps: 0,
            tracing: tracer.enabled(),
            tracer,
        }
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn relative_base(&self) -> i64 {
        self.relative_base
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn memory(&self) -> &AddressSpace {
        &self.memory
    }

    /// Runs until the program halts, then returns its final memory.
    pub async fn run(
        mut self,
        input: &mut ChannelReader,
        output: &mut ChannelWriter,
    ) -> Result<MemorySnapshot, IntcodeError> {
        loop {
            match self.step(input, output).await {
                Ok(State::Running) => {}
                Ok(State::Halted) => break,
                Err(err) => {
                    warn!("machine faulted after {} instructions: {}", self.steps, err);
                    return Err(err);
                }
            }
        }
        debug!(
            "machine halted after {} instructions ({} high-memory cells)",
            self.steps,
            self.memory.high_len()
        );
        Ok(self.memory.into_snapshot())
    }

    /// Executes one instruction.
    ///
    /// Completes synchronously except when an input has to wait for a value or an
    /// output has to wait for capacity. Stepping a halted machine does nothing.
    pub async fn step(
        &mut self,
        input: &mut ChannelReader,
        output: &mut ChannelWriter,
    ) -> Result<State, IntcodeError> {
        if self.halted {
            return Ok(State::Halted);
        }

        let ip = self.ip;
        let ins = decode(self.memory.get(ip), ip)?;
        let relative_base = self.relative_base;
        let mut operands = Vec::new();

        match ins.opcode {
            Opcode::Add => self.op_arith(&ins, &mut operands, i64::wrapping_add)?,
            Opcode::Mul => self.op_arith(&ins, &mut operands, i64::wrapping_mul)?,
            Opcode::Input => self.op_input(&ins, &mut operands, input).await?,
            Opcode::Output => self.op_output(&ins, &mut operands, output).await?,
            Opcode::JumpIfTrue => self.op_jump(&ins, &mut operands, |a| a != 0)?,
            Opcode::JumpIfFalse => self.op_jump(&ins, &mut operands, |a| a == 0)?,
            Opcode::LessThan => self.op_arith(&ins, &mut operands, |a, b| (a < b) as i64)?,
            Opcode::Equals => self.op_arith(&ins, &mut operands, |a, b| (a == b) as i64)?,
            Opcode::AdjustRelativeBase => {
                let a = self.load(&ins, 1, &mut operands)?;
                self.relative_base = self.relative_base.wrapping_add(a);
                self.ip += ins.opcode.width();
            }
            Opcode::Halt => {
                output.complete();
                self.halted = true;
            }
        }

        self.steps += 1;
        if self.tracing {
            self.tracer.instruction(&TraceEvent {
                ip,
                relative_base,
                opcode: ins.opcode,
                modes: ins.modes,
                operands,
            });
        }

        Ok(if self.halted {
            State::Halted
        } else {
            State::Running
        })
    }

    /// Two reads, one write, advance.
    fn op_arith(
        &mut self,
        ins: &Instruction,
        operands: &mut Vec<Operand>,
        f: impl FnOnce(i64, i64) -> i64,
    ) -> Result<(), IntcodeError> {
        let a = self.load(ins, 1, operands)?;
        let b = self.load(ins, 2, operands)?;
        self.store(ins, 3, f(a, b), operands)?;
        self.ip += ins.opcode.width();
        Ok(())
    }

    fn op_jump(
        &mut self,
        ins: &Instruction,
        operands: &mut Vec<Operand>,
        taken: impl FnOnce(i64) -> bool,
    ) -> Result<(), IntcodeError> {
        let a = self.load(ins, 1, operands)?;
        let target = self.load(ins, 2, operands)?;
        if taken(a) {
            self.ip = self.address(target)?;
        } else {
            self.ip += ins.opcode.width();
        }
        Ok(())
    }

    async fn op_input(
        &mut self,
        ins: &Instruction,
        operands: &mut Vec<Operand>,
        input: &mut ChannelReader,
    ) -> Result<(), IntcodeError> {
        let ip = self.ip;
        let (raw, target) = self.target(ins, 1)?;
        let value = match input.try_read() {
            TryRead::Value(value) => value,
            TryRead::Ended => return Err(IntcodeError::InputClosed { ip }),
            TryRead::Empty => {
                self.tracer.suspended(ip, Suspension::Input);
                input.read().await.ok_or(IntcodeError::InputClosed { ip })?
            }
        };
        self.memory.write(target, value).map_err(|e| e.at(ip))?;
        self.record(ins, 1, raw, Some(target), value, operands);
        self.ip += ins.opcode.width();
        Ok(())
    }

    async fn op_output(
        &mut self,
        ins: &Instruction,
        operands: &mut Vec<Operand>,
        output: &mut ChannelWriter,
    ) -> Result<(), IntcodeError> {
        let ip = self.ip;
        let value = self.load(ins, 1, operands)?;
        if !output.try_write(value).map_err(|e| e.at(ip))? {
            self.tracer.suspended(ip, Suspension::Output);
            output.write(value).await.map_err(|e| e.at(ip))?;
        }
        self.ip += ins.opcode.width();
        Ok(())
    }

    /// Raw word of the 1-based parameter `param`.
    fn param(&self, param: usize) -> i64 {
        self.memory.get(self.ip + param)
    }

    /// Resolves a read parameter to its value.
    fn load(
        &self,
        ins: &Instruction,
        param: usize,
        operands: &mut Vec<Operand>,
    ) -> Result<i64, IntcodeError> {
        let raw = self.param(param);
        let (address, value) = match ins.mode(param) {
            Mode::Immediate => (None, raw),
            Mode::Position => (Some(raw), self.read(raw)?),
            Mode::Relative => {
                let address = self.relative_base.wrapping_add(raw);
                (Some(address), self.read(address)?)
            }
        };
        self.record(ins, param, raw, address, value, operands);
        Ok(value)
    }

    /// Resolves a write parameter to its raw word and target address.
    fn target(&self, ins: &Instruction, param: usize) -> Result<(i64, i64), IntcodeError> {
        let raw = self.param(param);
        match ins.mode(param) {
            Mode::Position => Ok((raw, raw)),
            Mode::Relative => Ok((raw, self.relative_base.wrapping_add(raw))),
            Mode::Immediate => Err(IntcodeError::InvalidWriteTarget { ip: self.ip, param }),
        }
    }

    fn store(
        &mut self,
        ins: &Instruction,
        param: usize,
        value: i64,
        operands: &mut Vec<Operand>,
    ) -> Result<(), IntcodeError> {
        let (raw, target) = self.target(ins, param)?;
        let ip = self.ip;
        self.memory.write(target, value).map_err(|e| e.at(ip))?;
        self.record(ins, param, raw, Some(target), value, operands);
        Ok(())
    }

    fn read(&self, address: i64) -> Result<i64, IntcodeError> {
        self.memory.read(address).map_err(|e| e.at(self.ip))
    }

    /// Converts a jump target to an instruction pointer.
    fn address(&self, value: i64) -> Result<usize, IntcodeError> {
        usize::try_from(value).map_err(|_| IntcodeError::InvalidAddress {
            address: value,
            ip: self.ip,
        })
    }

    fn record(
        &self,
        ins: &Instruction,
        param: usize,
        raw: i64,
        address: Option<i64>,
        value: i64,
        operands: &mut Vec<Operand>,
    ) {
        if self.tracing {
            operands.push(Operand {
                param,
                mode: ins.mode(param),
                raw,
                // Only non-negative addresses get this far.
                address: address.map(|a| a as usize),
                value,
            });
        }
    }
}

/// Result of a batch run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchOutput {
    /// Every value the program emitted, in order.
    pub outputs: Vec<i64>,
    /// Memory at the moment of halt.
    pub memory: MemorySnapshot,
}

/// What a spawned run hands back once it halts.
#[derive(Debug)]
pub struct RunOutcome {
    pub memory: MemorySnapshot,
    /// The input reader, with anything still buffered in it.
    pub input: ChannelReader,
}

/// Handle to a run executing on the tokio runtime.
#[derive(Debug)]
pub struct RunHandle(JoinHandle<Result<RunOutcome, IntcodeError>>);

impl RunHandle {
    /// Waits for the run to halt or fault.
    pub async fn join(self) -> Result<RunOutcome, IntcodeError> {
        self.0
            .await
            .map_err(|e| IntcodeError::TaskFailed(e.to_string()))?
    }

    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }

    pub fn abort(&self) {
        self.0.abort();
    }
}

/// A run in progress with the caller holding the other end of both channels.
#[derive(Debug)]
pub struct Execution {
    /// Feeds the machine's input instructions.
    pub input: ChannelWriter,
    /// Receives the machine's outputs; ends when the machine halts.
    pub output: ChannelReader,
    pub handle: RunHandle,
}

/// An IntCode program ready to run any number of times.
#[derive(Clone)]
pub struct VM {
    program: Program,
    tracer: Arc<dyn Tracer>,
}

impl VM {
    /// Creates a VM for `program`. Each run starts from an unmodified copy.
    pub fn new(program: impl Into<Program>) -> Self {
        Self {
            program: program.into(),
            tracer: Arc::new(NoopTracer),
        }
    }

    /// Attaches a tracer to every subsequent run.
    pub fn with_tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    /// Returns a copy of this VM that logs every instruction under `prefix`.
    pub fn debugger(&self, prefix: impl Into<String>) -> Self {
        self.clone()
            .with_tracer(Arc::new(LogTracer::new(prefix)))
    }

    /// Returns a VM whose program has the given cells replaced.
    pub fn patched(&self, patches: &[(usize, i64)]) -> Self {
        Self {
            program: self.program.patched(patches),
            tracer: self.tracer.clone(),
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Creates a fresh machine for one run.
    pub fn machine(&self) -> Machine {
        Machine::new(&self.program, self.tracer.clone())
    }

    /// Runs the program over the given channel ends until it halts.
    ///
    /// On halt `output` is completed and the final memory returned.
    pub async fn run(
        &self,
        input: &mut ChannelReader,
        output: &mut ChannelWriter,
    ) -> Result<MemorySnapshot, IntcodeError> {
        self.machine().run(input, output).await
    }

    /// Runs the program to completion on a fixed list of inputs.
    ///
    /// Blocks the calling thread. Needing more input than provided fails with
    /// [`IntcodeError::InputClosed`] rather than waiting forever.
    pub fn run_batch(&self, inputs: &[i64]) -> Result<BatchOutput, IntcodeError> {
        let (writer, mut input) = channel::channel(inputs.len());
        for &value in inputs {
            writer.try_write(value)?;
        }
        drop(writer);

        let (mut output, mut outputs) = channel::unbounded();
        let memory = futures::executor::block_on(self.run(&mut input, &mut output))?;
        Ok(BatchOutput {
            outputs: outputs.drain(),
            memory,
        })
    }

    /// Spawns a run over caller-supplied channel ends.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, mut input: ChannelReader, mut output: ChannelWriter) -> RunHandle {
        let machine = self.machine();
        RunHandle(tokio::spawn(async move {
            let memory = machine.run(&mut input, &mut output).await?;
            Ok(RunOutcome { memory, input })
        }))
    }

    /// Spawns a run with new channels and returns the caller's ends.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self, input_capacity: usize, output_capacity: usize) -> Execution {
        let (input, reader) = channel::channel(input_capacity);
        let (writer, output) = channel::channel(output_capacity);
        Execution {
            input,
            output,
            handle: self.start(reader, writer),
        }
    }
}

#[cfg(test)]
mod tests;
