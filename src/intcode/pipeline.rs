//! Multi-machine wiring.
//!
//! Several instances of one program, each primed with a phase setting, pass a signal
//! from one to the next. A chain runs them one after another; a feedback loop runs
//! them concurrently with the last instance's output wired back into the first.

use crate::intcode::channel::{self, ChannelReader, ChannelWriter};
use crate::intcode::errors::IntcodeError;
use crate::intcode::vm::{RunHandle, RunOutcome, VM};
use crate::debug;

/// How the instances of a pipeline are connected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Wiring {
    /// Each instance runs to completion before the next starts.
    Chain,
    /// All instances run at once in a cycle.
    Feedback,
}

/// Runs one instance per phase serially, passing each instance's last output to
/// the next. Returns the last instance's last output.
pub fn run_chain(vm: &VM, phases: &[i64], seed: i64) -> Result<i64, IntcodeError> {
    if phases.is_empty() {
        return Err(IntcodeError::EmptyPipeline);
    }

    let mut signal = seed;
    for (stage, &phase) in phases.iter().enumerate() {
        let result = vm.run_batch(&[phase, signal])?;
        signal = *result
            .outputs
            .last()
            .ok_or(IntcodeError::NoSignal { stage })?;
    }
    Ok(signal)
}

/// Runs one instance per phase in a cycle of capacity-1 channels.
///
/// Instance `i` reads channel `i` and writes channel `i + 1`; the last instance
/// writes channel 0. Every channel starts with its instance's phase and channel 0
/// additionally receives `seed`. Once every instance has halted, the value left
/// in channel 0 is the result.
///
/// Every instance is joined before returning. If any faulted, the error is the
/// first fault by stage that is not a closed channel left behind by another
/// stage's fault.
///
/// Must be called from within a tokio runtime.
pub async fn run_feedback_loop(vm: &VM, phases: &[i64], seed: i64) -> Result<i64, IntcodeError> {
    if phases.is_empty() {
        return Err(IntcodeError::EmptyPipeline);
    }

    let (mut writers, readers): (Vec<ChannelWriter>, Vec<ChannelReader>) =
        phases.iter().map(|_| channel::channel(1)).unzip();

    for (writer, &phase) in writers.iter().zip(phases) {
        writer.try_write(phase)?;
    }

    let stages = phases.len();
    let mut handles: Vec<RunHandle> = readers
        .into_iter()
        .enumerate()
        .map(|(i, reader)| vm.start(reader, writers[(i + 1) % stages].clone()))
        .collect();

    // Stage 0 may halt or fault without ever making room for the seed.
    let head = handles.remove(0).join();
    tokio::pin!(head);
    let mut head_result = None;
    let seeded = tokio::select! {
        biased;
        sent = writers[0].write(seed) => sent.is_ok(),
        result = &mut head => {
            head_result = Some(result);
            false
        }
    };
    // The machines hold the only remaining writers.
    writers.clear();

    let mut results = Vec::with_capacity(stages);
    results.push(match head_result {
        Some(result) => result,
        None => head.await,
    });
    for handle in handles {
        results.push(handle.join().await);
    }

    let mut outcomes = settle(results)?;
    if !seeded {
        return Err(IntcodeError::SeedUnread);
    }

    let mut closing = outcomes.swap_remove(0).input;
    let signal = closing
        .drain()
        .pop()
        .ok_or(IntcodeError::NoSignal { stage: stages - 1 })?;
    debug!("feedback loop {:?} settled on {}", phases, signal);
    Ok(signal)
}

/// Unwraps every stage's outcome, or picks the fault that caused the others.
fn settle(results: Vec<Result<RunOutcome, IntcodeError>>) -> Result<Vec<RunOutcome>, IntcodeError> {
    let mut outcomes = Vec::with_capacity(results.len());
    let mut fault: Option<IntcodeError> = None;

    for (stage, result) in results.into_iter().enumerate() {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(err) => {
                debug!("stage {} failed: {}", stage, err);
                let replace = match &fault {
                    None => true,
                    Some(current) => is_knock_on(current) && !is_knock_on(&err),
                };
                if replace {
                    fault = Some(err);
                }
            }
        }
    }

    match fault {
        Some(err) => Err(err),
        None => Ok(outcomes),
    }
}

/// Whether `err` is what a stage sees when a neighbour stopped early.
fn is_knock_on(err: &IntcodeError) -> bool {
    matches!(
        err,
        IntcodeError::InputClosed { .. } | IntcodeError::OutputClosed { .. }
    )
}

/// Tries every ordering of `phases` and returns the largest signal.
pub async fn max_signal(vm: &VM, phases: &[i64], wiring: Wiring) -> Result<i64, IntcodeError> {
    let mut best = None;
    for order in permutations(phases) {
        let signal = match wiring {
            Wiring::Chain => run_chain(vm, &order, 0)?,
            Wiring::Feedback => run_feedback_loop(vm, &order, 0).await?,
        };
        best = Some(best.map_or(signal, |b: i64| b.max(signal)));
    }
    best.ok_or(IntcodeError::EmptyPipeline)
}

/// Every ordering of `items`, by Heap's algorithm.
fn permutations(items: &[i64]) -> Vec<Vec<i64>> {
    if items.is_empty() {
        return Vec::new();
    }

    let mut current = items.to_vec();
    let mut counters = vec![0; items.len()];
    let mut result = vec![current.clone()];

    let mut i = 1;
    while i < current.len() {
        if counters[i] < i {
            let j = if i % 2 == 0 { 0 } else { counters[i] };
            current.swap(j, i);
            result.push(current.clone());
            counters[i] += 1;
            i = 1;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }
    result
}
