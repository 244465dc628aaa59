//! IntCode program runner.
//!
//! Loads a program file, runs it to completion on the given inputs and prints the
//! outputs as one comma-separated line.
//!
//! # Usage
//! ```text
//! intcode <program-file> [OPTIONS]
//! ```
//!
//! # Options
//! - `--input <n>`: Value for the next input instruction (repeatable)
//! - `--trace <prefix>`: Log every executed instruction under `prefix`
//! - `--quiet`: Only log warnings and errors
//!
//! The log level can also be set with `INTCODE_LOG` (`trace`, `debug`, `info`,
//! `warn` or `error`).

use intcode::utils::log::{self, Level};
use intcode::{Program, VM, error, info};
use std::env;
use std::process;
use std::sync::atomic::Ordering;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    if let Ok(level) = env::var("INTCODE_LOG") {
        match level.parse::<Level>() {
            Ok(level) => log::set_max_level(level),
            Err(e) => {
                eprintln!("Invalid INTCODE_LOG: {}", e);
                process::exit(1);
            }
        }
    }

    let path = &args[1];
    let mut inputs = Vec::new();
    let mut trace_prefix: Option<&str> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("--input requires an argument");
                    process::exit(1);
                }
                match args[i].parse::<i64>() {
                    Ok(value) => inputs.push(value),
                    Err(_) => {
                        eprintln!("Invalid input value: {}", args[i]);
                        process::exit(1);
                    }
                }
                i += 1;
            }
            "--trace" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("--trace requires an argument");
                    process::exit(1);
                }
                trace_prefix = Some(&args[i]);
                i += 1;
            }
            "--quiet" => {
                log::set_max_level(Level::Warn);
                log::SHOW_TIMESTAMP.store(false, Ordering::Relaxed);
                i += 1;
            }
            other => {
                eprintln!("Unexpected argument: {}\n", other);
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    let program = match Program::load(path) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Failed to load {}: {}", path, e);
            process::exit(1);
        }
    };

    let mut vm = VM::new(program);
    if let Some(prefix) = trace_prefix {
        log::set_max_level(Level::Trace);
        vm = vm.debugger(prefix);
    }

    info!(
        "Running {} ({} cells, {} inputs)",
        path,
        vm.program().len(),
        inputs.len()
    );

    match vm.run_batch(&inputs) {
        Ok(result) => {
            let line: Vec<String> = result.outputs.iter().map(|v| v.to_string()).collect();
            println!("{}", line.join(","));
            info!("Halted with {} outputs", result.outputs.len());
        }
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {} <program-file> [OPTIONS]\n\n\
         Options:\n  \
         --input <n>        Value for the next input instruction (repeatable)\n  \
         --trace <prefix>   Log every executed instruction under <prefix>\n  \
         --quiet            Only log warnings and errors\n\n\
         Environment:\n  \
         INTCODE_LOG        Log level: trace, debug, info, warn or error",
        program
    );
}
