use intcode_derive::Error;

/// Faults raised while loading or executing an IntCode program.
///
/// Every execution fault is fatal for the machine that raised it: the run stops and
/// its memory is discarded.
#[derive(Debug, Error)]
pub enum IntcodeError {
    /// Read, write or jump to an address below zero.
    #[error("invalid address {address} (instruction at {ip})")]
    InvalidAddress { address: i64, ip: usize },
    /// Instruction word whose low two digits are not a known opcode.
    #[error("unsupported opcode {opcode} at {ip}")]
    UnsupportedOpcode { opcode: i64, ip: usize },
    /// Parameter mode digit other than position, immediate or relative.
    #[error("unsupported parameter mode {mode} for parameter {param} at {ip}")]
    UnsupportedMode { mode: i64, param: usize, ip: usize },
    /// Write parameter encoded in immediate mode.
    #[error("parameter {param} of the instruction at {ip} is an immediate write target")]
    InvalidWriteTarget { ip: usize, param: usize },
    /// Input stream ended while the machine was waiting for a value.
    #[error("input closed while waiting at {ip}")]
    InputClosed { ip: usize },
    /// Output reader was dropped before the machine could deliver a value.
    #[error("output closed while writing at {ip}")]
    OutputClosed { ip: usize },
    /// Write through a channel writer that was already completed.
    #[error("write to a completed channel")]
    ChannelCompleted,
    /// Program text contained a token that is not a signed integer.
    #[error("invalid program token {token:?} at index {index}")]
    InvalidProgram { index: usize, token: String },
    /// A spawned machine task panicked or was cancelled.
    #[error("machine task failed: {0}")]
    TaskFailed(String),
    /// Pipeline asked to run with no stages.
    #[error("pipeline needs at least one phase")]
    EmptyPipeline,
    /// A pipeline stage halted without emitting the signal the next stage needs.
    #[error("stage {stage} produced no signal")]
    NoSignal { stage: usize },
    /// The first stage of a feedback loop halted before it took the seed.
    #[error("first stage halted before reading the seed")]
    SeedUnread,
    /// File I/O error while loading a program.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntcodeError {
    /// Attaches the instruction pointer to faults raised below the engine.
    pub(crate) fn at(self, at_ip: usize) -> Self {
        match self {
            IntcodeError::InvalidAddress { address, .. } => {
                IntcodeError::InvalidAddress { address, ip: at_ip }
            }
            IntcodeError::UnsupportedOpcode { opcode, .. } => {
                IntcodeError::UnsupportedOpcode { opcode, ip: at_ip }
            }
            IntcodeError::InputClosed { .. } => IntcodeError::InputClosed { ip: at_ip },
            IntcodeError::OutputClosed { .. } => IntcodeError::OutputClosed { ip: at_ip },
            other => other,
        }
    }
}
