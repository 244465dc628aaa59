use super::*;
use crate::intcode::trace::tests::RecordingTracer;

const QUINE: [i64; 16] = [
    109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99,
];

/// Compares its input with 8: outputs 999 below, 1000 equal, 1001 above.
const COMPARE_WITH_8: [i64; 47] = [
    3, 21, 1008, 21, 8, 20, 1005, 20, 22, 107, 8, 21, 20, 1006, 20, 31, 1106, 0, 36, 98, 0, 0,
    1002, 21, 125, 20, 4, 20, 1105, 1, 46, 104, 999, 1105, 1, 46, 1101, 1000, 1, 20, 4, 20, 1105,
    1, 46, 98, 99,
];

fn run(program: &[i64], inputs: &[i64]) -> BatchOutput {
    VM::new(program)
        .run_batch(inputs)
        .expect("vm run failed")
}

fn outputs(program: &[i64], inputs: &[i64]) -> Vec<i64> {
    run(program, inputs).outputs
}

fn memory(program: &[i64]) -> Vec<i64> {
    run(program, &[]).memory.to_vec()
}

fn run_expect_err(program: &[i64], inputs: &[i64]) -> IntcodeError {
    VM::new(program)
        .run_batch(inputs)
        .expect_err("expected error")
}

// ==================== Arithmetic ====================

#[test]
fn add_modifies_its_own_program() {
    assert_eq!(memory(&[1, 0, 0, 0, 99]), vec![2, 0, 0, 0, 99]);
}

#[test]
fn multiply_in_position_mode() {
    assert_eq!(memory(&[2, 3, 0, 3, 99]), vec![2, 3, 0, 6, 99]);
    assert_eq!(memory(&[2, 4, 4, 5, 99, 0]), vec![2, 4, 4, 5, 99, 9801]);
}

#[test]
fn program_overwrites_a_later_instruction() {
    assert_eq!(
        memory(&[1, 1, 1, 4, 99, 5, 6, 0, 99]),
        vec![30, 1, 1, 4, 2, 5, 6, 0, 99]
    );
    assert_eq!(
        run(&[1, 9, 10, 3, 2, 3, 11, 0, 99, 30, 40, 50], &[])
            .memory
            .get(0),
        3500
    );
}

#[test]
fn immediate_mode_operands() {
    assert_eq!(memory(&[1002, 4, 3, 4, 33]), vec![1002, 4, 3, 4, 99]);
    assert_eq!(memory(&[1101, 100, -1, 4, 0]), vec![1101, 100, -1, 4, 99]);
}

#[test]
fn multiply_is_wide_enough() {
    assert_eq!(
        outputs(&[1102, 34915192, 34915192, 7, 4, 7, 99, 0], &[]),
        vec![1219070632396864]
    );
    assert_eq!(
        outputs(&[1102, 34915192, 34915192, 7, 4, 7, 99], &[]),
        vec![34915192 * 34915192]
    );
}

#[test]
fn large_immediate_output() {
    assert_eq!(
        outputs(&[104, 1125899906842624, 99], &[]),
        vec![1125899906842624]
    );
}

#[test]
fn arithmetic_wraps_instead_of_panicking() {
    assert_eq!(
        outputs(&[1101, i64::MAX, 1, 7, 4, 7, 99, 0], &[]),
        vec![i64::MIN]
    );
    assert_eq!(
        outputs(&[1102, i64::MAX, 2, 7, 4, 7, 99, 0], &[]),
        vec![-2]
    );
}

// ==================== Input / output ====================

#[test]
fn input_round_trips_to_output() {
    assert_eq!(outputs(&[3, 0, 4, 0, 99], &[42]), vec![42]);
}

#[test]
fn no_input_no_output() {
    let result = run(&[99], &[]);
    assert!(result.outputs.is_empty());
    assert_eq!(result.memory.to_vec(), vec![99]);
}

#[test]
fn running_out_of_input_is_a_fault() {
    assert!(matches!(
        run_expect_err(&[3, 0, 3, 0, 99], &[1]),
        IntcodeError::InputClosed { ip: 2 }
    ));
}

// ==================== Comparisons and jumps ====================

#[test]
fn equals_and_less_than_in_position_mode() {
    let equal_8 = [3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8];
    assert_eq!(outputs(&equal_8, &[8]), vec![1]);
    assert_eq!(outputs(&equal_8, &[7]), vec![0]);

    let less_than_8 = [3, 9, 7, 9, 10, 9, 4, 9, 99, -1, 8];
    assert_eq!(outputs(&less_than_8, &[5]), vec![1]);
    assert_eq!(outputs(&less_than_8, &[8]), vec![0]);
}

#[test]
fn equals_and_less_than_in_immediate_mode() {
    let equal_8 = [3, 3, 1108, -1, 8, 3, 4, 3, 99];
    assert_eq!(outputs(&equal_8, &[8]), vec![1]);
    assert_eq!(outputs(&equal_8, &[9]), vec![0]);

    let less_than_8 = [3, 3, 1107, -1, 8, 3, 4, 3, 99];
    assert_eq!(outputs(&less_than_8, &[-3]), vec![1]);
    assert_eq!(outputs(&less_than_8, &[10]), vec![0]);
}

#[test]
fn jumps_test_for_zero() {
    let position = [3, 12, 6, 12, 15, 1, 13, 14, 13, 4, 13, 99, -1, 0, 1, 9];
    assert_eq!(outputs(&position, &[0]), vec![0]);
    assert_eq!(outputs(&position, &[5]), vec![1]);

    let immediate = [3, 3, 1105, -1, 9, 1101, 0, 0, 12, 4, 12, 99, 1];
    assert_eq!(outputs(&immediate, &[0]), vec![0]);
    assert_eq!(outputs(&immediate, &[-2]), vec![1]);
}

#[test]
fn jump_if_true_takes_any_nonzero_value() {
    assert_eq!(outputs(&[1105, 2, 4, 99, 104, 7, 99], &[]), vec![7]);
    assert_eq!(outputs(&[1105, 0, 4, 99, 104, 7, 99], &[]), Vec::<i64>::new());
}

#[test]
fn compare_with_8_branches_three_ways() {
    assert_eq!(outputs(&COMPARE_WITH_8, &[7]), vec![999]);
    assert_eq!(outputs(&COMPARE_WITH_8, &[8]), vec![1000]);
    assert_eq!(outputs(&COMPARE_WITH_8, &[9]), vec![1001]);
}

// ==================== Relative base and high memory ====================

#[test]
fn quine_outputs_itself() {
    assert_eq!(outputs(&QUINE, &[]), QUINE.to_vec());
}

#[test]
fn relative_mode_write_target() {
    // rb = 2000; [rb + 0] = 3 + 4; out [rb + 0]
    assert_eq!(
        outputs(&[109, 2000, 21101, 3, 4, 0, 204, 0, 99], &[]),
        vec![7]
    );
}

#[test]
fn relative_mode_input_target() {
    assert_eq!(outputs(&[109, 10, 203, -3, 4, 7, 99], &[55]), vec![55]);
}

#[test]
fn high_memory_reads_back_and_defaults_to_zero() {
    let result = run(&[1101, 5, 6, 10000, 4, 10000, 4, 9999, 99], &[]);
    assert_eq!(result.outputs, vec![11, 0]);
    assert_eq!(result.memory.get(10000), 11);
    assert_eq!(result.memory.get(9999), 0);
    assert_eq!(result.memory.len(), 10001);
}

// ==================== Faults ====================

#[test]
fn negative_relative_address_is_a_fault() {
    assert!(matches!(
        run_expect_err(&[109, -5, 204, 0, 99], &[]),
        IntcodeError::InvalidAddress { address: -5, ip: 2 }
    ));
}

#[test]
fn negative_position_address_is_a_fault() {
    assert!(matches!(
        run_expect_err(&[4, -1, 99], &[]),
        IntcodeError::InvalidAddress { address: -1, ip: 0 }
    ));
    assert!(matches!(
        run_expect_err(&[3, -3, 99], &[1]),
        IntcodeError::InvalidAddress { address: -3, ip: 0 }
    ));
}

#[test]
fn negative_jump_target_is_a_fault() {
    assert!(matches!(
        run_expect_err(&[1105, 1, -1], &[]),
        IntcodeError::InvalidAddress { address: -1, ip: 0 }
    ));
}

#[test]
fn fault_stops_the_run_before_later_output() {
    let tracer = Arc::new(RecordingTracer::default());
    let err = VM::new([104, 1, 204, -7, 104, 2, 99])
        .with_tracer(tracer.clone())
        .run_batch(&[])
        .unwrap_err();

    assert!(matches!(err, IntcodeError::InvalidAddress { address: -7, ip: 2 }));
    assert_eq!(tracer.events.lock().unwrap().len(), 1);
}

#[test]
fn unsupported_opcode_is_a_fault() {
    assert!(matches!(
        run_expect_err(&[42], &[]),
        IntcodeError::UnsupportedOpcode { opcode: 42, ip: 0 }
    ));
    // Running off the end of the program reads a zero word.
    assert!(matches!(
        run_expect_err(&[1101, 1, 1, 5], &[]),
        IntcodeError::UnsupportedOpcode { opcode: 0, ip: 4 }
    ));
}

#[test]
fn immediate_write_target_is_a_fault() {
    assert!(matches!(
        run_expect_err(&[11101, 1, 1, 0, 99], &[]),
        IntcodeError::InvalidWriteTarget { ip: 0, param: 3 }
    ));
}

#[test]
fn unsupported_mode_is_a_fault() {
    assert!(matches!(
        run_expect_err(&[3001, 0, 0, 0, 99], &[]),
        IntcodeError::UnsupportedMode { mode: 3, param: 2, ip: 0 }
    ));
}

// ==================== Runs and determinism ====================

#[test]
fn batch_runs_are_deterministic() {
    let vm = VM::new(COMPARE_WITH_8);
    let first = vm.run_batch(&[8]).unwrap();
    let second = vm.run_batch(&[8]).unwrap();
    assert_eq!(first, second);
}

#[test]
fn runs_never_share_memory() {
    let vm = VM::new([1, 0, 0, 0, 99]);
    assert_eq!(vm.run_batch(&[]).unwrap().memory.get(0), 2);
    assert_eq!(vm.run_batch(&[]).unwrap().memory.get(0), 2);
    assert_eq!(vm.program().cells(), &[1, 0, 0, 0, 99]);
}

#[test]
fn patched_vm_runs_the_modified_image() {
    let vm = VM::new([1, 0, 0, 0, 99, 7, 8]);
    let patched = vm.patched(&[(1, 5), (2, 6)]);

    assert_eq!(patched.run_batch(&[]).unwrap().memory.get(0), 15);
    assert_eq!(vm.run_batch(&[]).unwrap().memory.get(0), 2);
}

#[test]
fn manual_stepping() {
    let mut machine = Machine::new(&[1101, 1, 2, 0, 99], Arc::new(NoopTracer));
    let (_, mut input) = channel::channel(1);
    let (mut output, mut results) = channel::channel(1);

    let state = futures::executor::block_on(machine.step(&mut input, &mut output)).unwrap();
    assert_eq!(state, State::Running);
    assert_eq!(machine.ip(), 4);
    assert_eq!(machine.memory().read(0).unwrap(), 3);

    let state = futures::executor::block_on(machine.step(&mut input, &mut output)).unwrap();
    assert_eq!(state, State::Halted);
    assert!(machine.is_halted());
    assert!(output.is_completed());
    assert_eq!(results.try_read(), TryRead::Ended);

    let state = futures::executor::block_on(machine.step(&mut input, &mut output)).unwrap();
    assert_eq!(state, State::Halted);
    assert_eq!(machine.steps(), 2);
}

#[test]
fn relative_base_only_changes_on_adjust() {
    let mut machine = Machine::new(&[109, 19, 109, -4, 99], Arc::new(NoopTracer));
    let (_, mut input) = channel::channel(1);
    let (mut output, _results) = channel::unbounded();

    futures::executor::block_on(machine.step(&mut input, &mut output)).unwrap();
    assert_eq!(machine.relative_base(), 19);
    futures::executor::block_on(machine.step(&mut input, &mut output)).unwrap();
    assert_eq!(machine.relative_base(), 15);
    futures::executor::block_on(machine.step(&mut input, &mut output)).unwrap();
    assert_eq!(machine.relative_base(), 15);
}

// ==================== Tracing ====================

#[test]
fn tracer_sees_resolved_operands() {
    let tracer = Arc::new(RecordingTracer::default());
    let result = VM::new([1001, 5, 10, 6, 99, 32])
        .with_tracer(tracer.clone())
        .run_batch(&[])
        .unwrap();

    assert_eq!(result.memory.get(6), 42);
    let events = tracer.events.lock().unwrap();
    assert_eq!(events.len(), 2);

    let add = &events[0];
    assert_eq!(add.ip, 0);
    assert_eq!(add.opcode, Opcode::Add);
    assert_eq!(
        add.operands,
        vec![
            Operand {
                param: 1,
                mode: Mode::Position,
                raw: 5,
                address: Some(5),
                value: 32,
            },
            Operand {
                param: 2,
                mode: Mode::Immediate,
                raw: 10,
                address: None,
                value: 10,
            },
            Operand {
                param: 3,
                mode: Mode::Position,
                raw: 6,
                address: Some(6),
                value: 42,
            },
        ]
    );
    assert_eq!(events[1].opcode, Opcode::Halt);
    assert!(events[1].operands.is_empty());
}

#[test]
fn tracing_does_not_change_results() {
    let plain = VM::new(QUINE).run_batch(&[]).unwrap();
    let traced = VM::new(QUINE)
        .with_tracer(Arc::new(RecordingTracer::default()))
        .run_batch(&[])
        .unwrap();
    let logged = VM::new(QUINE).debugger("Q").run_batch(&[]).unwrap();

    assert_eq!(plain, traced);
    assert_eq!(plain, logged);
}

// ==================== Streaming ====================

#[tokio::test]
async fn streaming_interleaves_input_and_output() {
    let vm = VM::new([3, 0, 4, 0, 3, 0, 4, 0, 99]);
    let Execution {
        input,
        mut output,
        handle,
    } = vm.spawn(1, 1);

    input.write(10).await.unwrap();
    assert_eq!(output.read().await, Some(10));
    input.write(20).await.unwrap();
    assert_eq!(output.read().await, Some(20));
    assert_eq!(output.read().await, None);

    let outcome = handle.join().await.unwrap();
    assert_eq!(outcome.memory.get(0), 20);
}

#[tokio::test]
async fn full_output_suspends_the_machine() {
    let tracer = Arc::new(RecordingTracer::default());
    let vm = VM::new([104, 1, 104, 2, 104, 3, 99]).with_tracer(tracer.clone());
    let execution = vm.spawn(1, 1);

    tokio::task::yield_now().await;
    assert!(!execution.handle.is_finished());

    assert_eq!(execution.output.collect().await, vec![1, 2, 3]);
    execution.handle.join().await.unwrap();
    assert!(
        tracer
            .suspensions
            .lock()
            .unwrap()
            .contains(&(2, Suspension::Output))
    );
}

#[tokio::test]
async fn empty_input_suspends_the_machine() {
    let tracer = Arc::new(RecordingTracer::default());
    let vm = VM::new([3, 0, 4, 0, 99]).with_tracer(tracer.clone());
    let Execution {
        input,
        output,
        handle,
    } = vm.spawn(1, 1);

    tokio::task::yield_now().await;
    assert!(!handle.is_finished());
    assert_eq!(
        *tracer.suspensions.lock().unwrap(),
        vec![(0, Suspension::Input)]
    );

    input.write(5).await.unwrap();
    assert_eq!(output.collect().await, vec![5]);
    handle.join().await.unwrap();
}

#[tokio::test]
async fn dropping_the_input_writer_ends_a_waiting_run() {
    let vm = VM::new([3, 0, 99]);
    let execution = vm.spawn(1, 1);
    drop(execution.input);

    assert!(matches!(
        execution.handle.join().await,
        Err(IntcodeError::InputClosed { ip: 0 })
    ));
}

#[tokio::test]
async fn dropping_the_output_reader_faults_the_writer() {
    let vm = VM::new([104, 1, 104, 2, 99]);
    let execution = vm.spawn(1, 1);
    drop(execution.output);

    assert!(matches!(
        execution.handle.join().await,
        Err(IntcodeError::OutputClosed { ip: 0 })
    ));
}

#[tokio::test]
async fn started_run_returns_unread_input() {
    let (writer, reader) = channel::channel(4);
    for v in [1, 2, 3] {
        writer.write(v).await.unwrap();
    }
    drop(writer);
    let (output, mut results) = channel::unbounded();

    let mut outcome = VM::new([3, 0, 4, 0, 99])
        .start(reader, output)
        .join()
        .await
        .unwrap();

    assert_eq!(results.drain(), vec![1]);
    assert_eq!(outcome.input.drain(), vec![2, 3]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn batch_form_works_inside_a_runtime() {
    let vm = VM::new(QUINE);
    let outputs = tokio::task::spawn_blocking(move || vm.run_batch(&[]))
        .await
        .unwrap()
        .unwrap()
        .outputs;
    assert_eq!(outputs, QUINE.to_vec());
}
